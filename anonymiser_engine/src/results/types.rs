//! # Anonymisation Result Types
//!
//! One [`AnonymisationResult`] is produced per record handed to `apply`.
//! Results serialize to JSON so batch runs can be reported and audited.

use crate::types::{FieldValue, RecordError, RecordRef};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Overwritten,
    Destroyed,
    Skipped,
    Failed,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Overwritten => "overwritten",
            ResultStatus::Destroyed => "destroyed",
            ResultStatus::Skipped => "skipped",
            ResultStatus::Failed => "failed",
        }
    }
}

/// Outcome of applying a policy to one record
///
/// `fields` is only populated for overwritten records and `error` is present
/// exactly when the status is failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnonymisationResult {
    status: ResultStatus,
    fields: BTreeMap<String, FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RecordError>,
    record: RecordRef,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    audit_fields: Vec<String>,
}

impl AnonymisationResult {
    fn new(status: ResultStatus, record: RecordRef) -> Self {
        Self {
            status,
            fields: BTreeMap::new(),
            error: None,
            record,
            audit_fields: Vec::new(),
        }
    }

    pub fn overwritten(fields: BTreeMap<String, FieldValue>, record: RecordRef) -> Self {
        Self {
            fields,
            ..Self::new(ResultStatus::Overwritten, record)
        }
    }

    pub fn destroyed(record: RecordRef) -> Self {
        Self::new(ResultStatus::Destroyed, record)
    }

    pub fn skipped(record: RecordRef) -> Self {
        Self::new(ResultStatus::Skipped, record)
    }

    pub fn failed(error: RecordError, record: RecordRef) -> Self {
        Self {
            error: Some(error),
            ..Self::new(ResultStatus::Failed, record)
        }
    }

    pub(crate) fn with_audit_fields(mut self, audit_fields: Vec<String>) -> Self {
        self.audit_fields = audit_fields;
        self
    }

    pub fn status(&self) -> ResultStatus {
        self.status
    }

    pub fn is_overwritten(&self) -> bool {
        self.status == ResultStatus::Overwritten
    }

    pub fn is_destroyed(&self) -> bool {
        self.status == ResultStatus::Destroyed
    }

    pub fn is_skipped(&self) -> bool {
        self.status == ResultStatus::Skipped
    }

    pub fn is_failed(&self) -> bool {
        self.status == ResultStatus::Failed
    }

    /// Field name to the value written
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn error(&self) -> Option<&RecordError> {
        self.error.as_ref()
    }

    pub fn record(&self) -> &RecordRef {
        &self.record
    }

    /// Audit log fields scrubbed alongside the record
    pub fn audit_fields(&self) -> &[String] {
        &self.audit_fields
    }
}

/// Counts per status over a batch of results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    pub overwritten: usize,
    pub destroyed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ResultSummary {
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a AnonymisationResult>,
    {
        results
            .into_iter()
            .fold(Self::default(), |mut summary, result| {
                match result.status() {
                    ResultStatus::Overwritten => summary.overwritten += 1,
                    ResultStatus::Destroyed => summary.destroyed += 1,
                    ResultStatus::Skipped => summary.skipped += 1,
                    ResultStatus::Failed => summary.failed += 1,
                }
                summary
            })
    }

    pub fn total(&self) -> usize {
        self.overwritten + self.destroyed + self.skipped + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user() -> RecordRef {
        RecordRef::new("User", "1")
    }

    #[test]
    fn test_predicates_are_one_hot() {
        let results = [
            AnonymisationResult::overwritten(BTreeMap::new(), user()),
            AnonymisationResult::destroyed(user()),
            AnonymisationResult::skipped(user()),
            AnonymisationResult::failed(
                RecordError::SaveFailed {
                    reason: "x".to_string(),
                },
                user(),
            ),
        ];

        for result in &results {
            let flags = [
                result.is_overwritten(),
                result.is_destroyed(),
                result.is_skipped(),
                result.is_failed(),
            ];
            assert_eq!(flags.iter().filter(|f| **f).count(), 1);
            assert_eq!(result.error().is_some(), result.is_failed());
            assert_eq!(result.record(), &user());
        }
    }

    #[test]
    fn test_serialized_shape() {
        let mut fields = BTreeMap::new();
        fields.insert("last_name".to_string(), json!(null));
        let result = AnonymisationResult::overwritten(fields, user())
            .with_audit_fields(vec!["audited_changes".to_string()]);

        let value = serde_json::to_value(&result).expect("serialize");
        assert_eq!(
            value,
            json!({
                "status": "overwritten",
                "fields": { "last_name": null },
                "record": { "record_type": "User", "id": "1" },
                "audit_fields": ["audited_changes"]
            })
        );
    }

    #[test]
    fn test_failed_serializes_error() {
        let result = AnonymisationResult::failed(
            RecordError::DeleteFailed {
                reason: "locked".to_string(),
            },
            user(),
        );
        let value = serde_json::to_value(&result).expect("serialize");

        assert_eq!(value["status"], "failed");
        assert_eq!(value["error"]["kind"], "delete_failed");
        assert!(value.get("audit_fields").is_none());
    }

    #[test]
    fn test_summary() {
        let results = vec![
            AnonymisationResult::destroyed(user()),
            AnonymisationResult::destroyed(user()),
            AnonymisationResult::skipped(user()),
        ];
        let summary = ResultSummary::from_results(&results);

        assert_eq!(summary.destroyed, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.total(), 3);
        assert!(!summary.has_failures());
    }
}
