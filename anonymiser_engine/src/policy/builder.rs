//! Field strategy builder
//!
//! Collects the field to strategy assignments of one record type and applies
//! them to records of that type.

use crate::api::config::AnonymiserConfig;
use crate::policy::audit::AuditLogHook;
use crate::results::AnonymisationResult;
use crate::strategies::builtins::{CurrentDatetime, NoOp, OverwriteHex};
use crate::strategies::errors::{ConfigurationError, ValidationError};
use crate::strategies::registry::StrategyRegistry;
use crate::strategies::traits::Strategy;
use crate::types::{FieldValue, Record, RecordError, RecordRef, RecordSchema};
use anonymiser_core::config::compile_time::strategies::DEFAULT_HEX_LENGTH;
use anonymiser_core::logging::codes;
use anonymiser_core::{log_debug, log_error, log_success};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

#[derive(Debug)]
pub struct FieldStrategyBuilder {
    schema: Arc<RecordSchema>,
    config: Arc<AnonymiserConfig>,
    registry: Arc<StrategyRegistry>,
    strategies: BTreeMap<String, Strategy>,
}

impl FieldStrategyBuilder {
    pub fn new(
        schema: Arc<RecordSchema>,
        config: Arc<AnonymiserConfig>,
        registry: Arc<StrategyRegistry>,
    ) -> Self {
        Self {
            schema,
            config,
            registry,
            strategies: BTreeMap::new(),
        }
    }

    pub fn record_type(&self) -> &str {
        self.schema.name()
    }

    /// Assign `strategy` to every field in `fields`
    ///
    /// Nothing is assigned if any field already has a strategy or appears
    /// twice in `fields`.
    pub fn with_strategy<I, S>(
        &mut self,
        strategy: Strategy,
        fields: I,
    ) -> Result<&mut Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();

        if fields.is_empty() {
            return Err(ConfigurationError::MissingFields {
                record_type: self.record_type().to_string(),
            });
        }

        let mut seen = BTreeSet::new();
        let duplicates: BTreeSet<&String> = fields
            .iter()
            .filter(|field| self.strategies.contains_key(*field) || !seen.insert(*field))
            .collect();

        if !duplicates.is_empty() {
            return Err(ConfigurationError::DuplicateStrategy {
                record_type: self.record_type().to_string(),
                fields: duplicates.into_iter().cloned().collect(),
            });
        }

        log_debug!(
            "Assigned field strategy",
            "record_type" => self.record_type(),
            "strategy" => strategy.name(),
            "fields" => fields.join(",")
        );

        for field in fields {
            self.strategies.insert(field, strategy.clone());
        }

        Ok(self)
    }

    pub fn with_fn<I, S, F>(&mut self, fields: I, f: F) -> Result<&mut Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&FieldValue) -> FieldValue + Send + Sync + 'static,
    {
        self.with_strategy(Strategy::from_fn(f), fields)
    }

    /// Closure strategy that can read the rest of the record
    pub fn with_record_fn<I, S, F>(
        &mut self,
        fields: I,
        f: F,
    ) -> Result<&mut Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&dyn Record, &FieldValue) -> FieldValue + Send + Sync + 'static,
    {
        self.with_strategy(Strategy::from_record_fn(f), fields)
    }

    /// Assign the strategy registered under `name`
    pub fn strategy<I, S>(&mut self, name: &str, fields: I) -> Result<&mut Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let strategy = self.registry.get(name)?;
        self.with_strategy(strategy, fields)
    }

    pub fn email<I, S>(&mut self, fields: I) -> Result<&mut Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strategy("email", fields)
    }

    pub fn phone_number<I, S>(&mut self, fields: I) -> Result<&mut Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strategy("phone_number", fields)
    }

    pub fn nilable<I, S>(&mut self, fields: I) -> Result<&mut Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strategy("nilable", fields)
    }

    pub fn current_datetime<I, S>(&mut self, fields: I) -> Result<&mut Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strategy("current_datetime", fields)
    }

    pub fn no_op<I, S>(&mut self, fields: I) -> Result<&mut Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strategy("no_op", fields)
    }

    pub fn hex<I, S>(&mut self, fields: I) -> Result<&mut Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hex_with_length(fields, DEFAULT_HEX_LENGTH)
    }

    pub fn hex_with_length<I, S>(
        &mut self,
        fields: I,
        length: usize,
    ) -> Result<&mut Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let hex = OverwriteHex::new(length)?;
        self.with_strategy(Strategy::custom(hex), fields)
    }

    /// Mark fields as deliberately left untouched
    pub fn ignore<I, S>(&mut self, fields: I) -> Result<&mut Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();

        let already_ignored: Vec<String> = fields
            .iter()
            .filter(|field| self.config.is_ignored(field))
            .cloned()
            .collect();

        if !already_ignored.is_empty() {
            return Err(ConfigurationError::AlreadyGloballyIgnored {
                record_type: self.record_type().to_string(),
                fields: already_ignored,
            });
        }

        self.with_strategy(Strategy::custom(NoOp), fields)
    }

    /// Configured field names in sorted order
    pub fn configured_fields(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }

    pub fn strategy_for(&self, field: &str) -> Option<&Strategy> {
        self.strategies.get(field)
    }

    /// Schema fields with no disposition, sorted
    pub fn unhandled_fields(&self) -> Vec<String> {
        let marker = self.config.marker_field();
        self.schema
            .fields()
            .filter(|field| *field != marker)
            .filter(|field| !self.config.is_ignored(field))
            .filter(|field| !self.strategies.contains_key(*field))
            .map(str::to_string)
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.unhandled_fields().is_empty()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = self.unhandled_fields();
        if fields.is_empty() {
            return Ok(());
        }

        log_error!(
            codes::validation::UNHANDLED_FIELDS,
            "Persisted fields have no anonymisation strategy",
            "record_type" => self.record_type(),
            "fields" => fields.join(",")
        );

        Err(ValidationError::UnhandledFields {
            record_type: self.record_type().to_string(),
            fields,
        })
    }

    /// Overwrite every configured field of `record` and save it
    pub fn apply(&self, record: &mut dyn Record) -> Result<AnonymisationResult, ValidationError> {
        self.apply_with_hook(record, None)
    }

    pub(crate) fn apply_with_hook(
        &self,
        record: &mut dyn Record,
        hook: Option<&dyn AuditLogHook>,
    ) -> Result<AnonymisationResult, ValidationError> {
        if self.config.validate_before_apply() {
            self.validate()?;
        }

        let record_ref = RecordRef::of(record);
        let present: HashSet<String> = record.persisted_field_names().into_iter().collect();

        // The marker is stamped on every apply but never joins the configured set
        let marker = self.config.marker_field();
        let stamp_marker = self.schema.has_field(marker) && !self.strategies.contains_key(marker);
        let marker_strategy = Strategy::custom(CurrentDatetime);
        let plan = stamp_marker
            .then_some((marker, &marker_strategy))
            .into_iter()
            .chain(
                self.strategies
                    .iter()
                    .map(|(field, strategy)| (field.as_str(), strategy)),
            );

        if let Some(hook) = hook {
            hook.before_overwrite(record);
        }

        let mut written = BTreeMap::new();
        for (field, strategy) in plan {
            if !present.contains(field) {
                continue;
            }

            let outcome = record.get_field(field).and_then(|previous| {
                let value = strategy.evaluate(&*record, &previous);
                record.set_field(field, value.clone()).map(|_| value)
            });

            match outcome {
                Ok(value) => {
                    written.insert(field.to_string(), value);
                }
                Err(error) => return Ok(self.fail(error, record_ref)),
            }
        }

        if let Err(error) = record.save() {
            return Ok(self.fail(error, record_ref));
        }

        let audit_fields = hook
            .map(|hook| hook.after_overwrite(&*record, &written))
            .unwrap_or_default();

        log_success!(
            codes::success::RECORD_OVERWRITTEN,
            "Record overwritten",
            "fields" => written.len()
        );

        Ok(AnonymisationResult::overwritten(written, record_ref).with_audit_fields(audit_fields))
    }

    fn fail(&self, error: RecordError, record_ref: RecordRef) -> AnonymisationResult {
        log_error!(
            error.code(),
            "Overwrite failed",
            "record" => record_ref,
            "reason" => error
        );
        AnonymisationResult::failed(error, record_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryRecord;
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::sync::Mutex;

    fn builder_with(config: AnonymiserConfig, fields: &[&str]) -> FieldStrategyBuilder {
        let config = Arc::new(config);
        let registry = Arc::new(StrategyRegistry::with_defaults(&config));
        FieldStrategyBuilder::new(
            Arc::new(RecordSchema::new("Employee", fields.iter().copied())),
            config,
            registry,
        )
    }

    fn employee_builder() -> FieldStrategyBuilder {
        builder_with(
            AnonymiserConfig::new().ignore_field("id"),
            &["id", "first_name", "last_name", "company_name", "anonymised_at"],
        )
    }

    fn employee() -> InMemoryRecord {
        InMemoryRecord::new("Employee", "1")
            .with_field("id", json!(1))
            .with_field("first_name", json!("Will"))
            .with_field("last_name", json!("Smith"))
            .with_field("company_name", json!("Acme"))
            .with_field("anonymised_at", json!(null))
    }

    #[test]
    fn test_scenario_a_full_overwrite() {
        let mut builder = employee_builder();
        builder
            .hex(["first_name"])
            .and_then(|b| b.nilable(["last_name"]))
            .and_then(|b| b.ignore(["company_name"]))
            .expect("valid configuration");
        assert!(builder.is_valid());

        let mut record = employee();
        let result = builder.apply(&mut record).expect("valid");

        assert!(result.is_overwritten());
        let first_name = result.fields()["first_name"].as_str().expect("string");
        assert!(!first_name.is_empty());
        assert!(first_name.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        assert_eq!(result.fields()["last_name"], json!(null));
        assert_eq!(record.value("company_name"), Some(&json!("Acme")));
        assert_eq!(record.value("id"), Some(&json!(1)));
        assert!(record.value("anonymised_at").is_some_and(|v| v.is_string()));
        assert_eq!(record.save_count(), 1);
    }

    #[test]
    fn test_scenario_b_unhandled_fields_sorted() {
        let mut builder = employee_builder();
        builder.hex(["first_name"]).expect("valid configuration");

        assert!(!builder.is_valid());
        assert_eq!(
            builder.validate(),
            Err(ValidationError::UnhandledFields {
                record_type: "Employee".to_string(),
                fields: vec!["company_name".to_string(), "last_name".to_string()],
            })
        );
    }

    #[test]
    fn test_apply_refuses_invalid_configuration() {
        let mut builder = employee_builder();
        builder.hex(["first_name"]).expect("valid configuration");

        let mut record = employee();
        assert_matches!(
            builder.apply(&mut record),
            Err(ValidationError::UnhandledFields { .. })
        );
        assert_eq!(record.value("first_name"), Some(&json!("Will")));
        assert_eq!(record.save_count(), 0);
    }

    #[test]
    fn test_validate_toggle_allows_partial_configuration() {
        let mut builder = builder_with(
            AnonymiserConfig::new().with_validate_before_apply(false),
            &["first_name", "last_name"],
        );
        builder.nilable(["first_name"]).expect("valid configuration");

        let mut record = employee();
        let result = builder.apply(&mut record).expect("no validation");

        assert!(result.is_overwritten());
        assert_eq!(record.value("last_name"), Some(&json!("Smith")));
    }

    #[test]
    fn test_scenario_e_duplicate_hex() {
        let mut builder = employee_builder();
        builder.hex(["first_name"]).expect("first assignment");

        assert_eq!(
            builder.hex(["first_name"]).map(|_| ()),
            Err(ConfigurationError::DuplicateStrategy {
                record_type: "Employee".to_string(),
                fields: vec!["first_name".to_string()],
            })
        );
    }

    #[test]
    fn test_duplicates_rejected_across_every_form() {
        type Assign = fn(&mut FieldStrategyBuilder) -> Result<(), ConfigurationError>;
        let forms: [Assign; 6] = [
            |b| b.hex(["last_name"]).map(|_| ()),
            |b| b.nilable(["last_name"]).map(|_| ()),
            |b| b.ignore(["last_name"]).map(|_| ()),
            |b| b.strategy("email", ["last_name"]).map(|_| ()),
            |b| b.with_strategy(Strategy::constant("x"), ["last_name"]).map(|_| ()),
            |b| b.with_fn(["last_name"], |v| v.clone()).map(|_| ()),
        ];

        for first in forms {
            for second in forms {
                let mut builder = employee_builder();
                first(&mut builder).expect("first assignment");
                assert_matches!(
                    second(&mut builder),
                    Err(ConfigurationError::DuplicateStrategy { fields, .. })
                        if fields == vec!["last_name".to_string()]
                );
            }
        }
    }

    #[test]
    fn test_duplicate_lists_every_offender_and_assigns_nothing() {
        let mut builder = employee_builder();
        builder.nilable(["first_name", "last_name"]).expect("first");

        assert_matches!(
            builder.hex(["last_name", "company_name", "first_name"]),
            Err(ConfigurationError::DuplicateStrategy { fields, .. })
                if fields == vec!["first_name".to_string(), "last_name".to_string()]
        );
        assert!(builder.strategy_for("company_name").is_none());
    }

    #[test]
    fn test_repeated_field_in_one_call_is_duplicate() {
        let mut builder = employee_builder();
        assert_matches!(
            builder.nilable(["last_name", "last_name"]),
            Err(ConfigurationError::DuplicateStrategy { .. })
        );
        assert!(builder.configured_fields().is_empty());
    }

    #[test]
    fn test_missing_fields() {
        let mut builder = employee_builder();
        assert_matches!(
            builder.nilable(Vec::<String>::new()),
            Err(ConfigurationError::MissingFields { record_type }) if record_type == "Employee"
        );
    }

    #[test]
    fn test_unknown_named_strategy() {
        let mut builder = employee_builder();
        assert_matches!(
            builder.strategy("shred", ["last_name"]),
            Err(ConfigurationError::UnknownStrategy { name }) if name == "shred"
        );
    }

    #[test]
    fn test_ignore_rejects_globally_ignored_fields() {
        let mut builder = employee_builder();
        assert_matches!(
            builder.ignore(["company_name", "id"]),
            Err(ConfigurationError::AlreadyGloballyIgnored { fields, .. })
                if fields == vec!["id".to_string()]
        );
        assert!(builder.strategy_for("company_name").is_none());
    }

    #[test]
    fn test_completeness_over_field_subsets() {
        let assignable = ["first_name", "last_name", "company_name"];

        for mask in 0u8..8 {
            let mut builder = employee_builder();
            let chosen: Vec<&str> = assignable
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, f)| *f)
                .collect();
            if !chosen.is_empty() {
                builder.nilable(chosen.clone()).expect("assign");
            }

            assert_eq!(builder.is_valid(), chosen.len() == assignable.len());
            let expected: Vec<String> = {
                let mut missing: Vec<String> = assignable
                    .iter()
                    .filter(|f| !chosen.contains(f))
                    .map(|f| f.to_string())
                    .collect();
                missing.sort();
                missing
            };
            assert_eq!(builder.unhandled_fields(), expected);
        }
    }

    #[test]
    fn test_repeated_apply_keeps_same_shape() {
        let mut builder = employee_builder();
        builder
            .nilable(["first_name", "last_name"])
            .and_then(|b| b.ignore(["company_name"]))
            .expect("valid configuration");

        let mut record = employee();
        let first = builder.apply(&mut record).expect("first apply");
        let second = builder.apply(&mut record).expect("second apply");

        let keys = |r: &AnonymisationResult| r.fields().keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys(&first), keys(&second));
        assert_eq!(first.status(), second.status());
        assert!(builder.strategy_for("anonymised_at").is_none());
        assert_eq!(
            builder.configured_fields(),
            vec!["company_name", "first_name", "last_name"]
        );
    }

    #[test]
    fn test_marker_field_is_stamped_and_reported() {
        let mut builder = employee_builder();
        builder
            .nilable(["first_name", "last_name", "company_name"])
            .expect("valid configuration");

        let mut record = employee();
        let result = builder.apply(&mut record).expect("valid");

        let stamped = result.fields()["anonymised_at"].as_str().expect("timestamp");
        assert!(chrono::DateTime::parse_from_rfc3339(stamped).is_ok());
    }

    #[test]
    fn test_explicit_marker_strategy_wins() {
        let mut builder = employee_builder();
        builder
            .nilable(["first_name", "last_name", "company_name"])
            .and_then(|b| b.with_strategy(Strategy::constant("1970-01-01T00:00:00Z"), ["anonymised_at"]))
            .expect("valid configuration");

        let mut record = employee();
        let result = builder.apply(&mut record).expect("valid");

        assert_eq!(result.fields()["anonymised_at"], json!("1970-01-01T00:00:00Z"));
    }

    #[test]
    fn test_fields_missing_from_record_are_skipped() {
        let mut builder = employee_builder();
        builder
            .nilable(["first_name", "last_name", "company_name"])
            .expect("valid configuration");

        let mut record = InMemoryRecord::new("Employee", "2").with_field("first_name", json!("Ann"));
        let result = builder.apply(&mut record).expect("valid");

        assert!(result.is_overwritten());
        assert_eq!(result.fields().keys().collect::<Vec<_>>(), vec!["first_name"]);
        assert!(record.value("anonymised_at").is_none());
    }

    #[test]
    fn test_record_fn_sees_record() {
        let mut builder = builder_with(AnonymiserConfig::new(), &["login"]);
        builder
            .with_record_fn(["login"], |record, _| json!(format!("user-{}", record.record_id())))
            .expect("valid configuration");

        let mut record = InMemoryRecord::new("Employee", "42").with_field("login", json!("will"));
        builder.apply(&mut record).expect("valid");

        assert_eq!(record.value("login"), Some(&json!("user-42")));
    }

    #[test]
    fn test_write_rejection_becomes_failed_without_save() {
        let mut builder = builder_with(AnonymiserConfig::new(), &["first_name", "last_name"]);
        builder
            .nilable(["first_name", "last_name"])
            .expect("valid configuration");

        let mut record = employee().reject_write("last_name");
        let result = builder.apply(&mut record).expect("valid");

        assert!(result.is_failed());
        assert_matches!(result.error(), Some(RecordError::WriteRejected { field, .. }) if field == "last_name");
        assert!(result.fields().is_empty());
        assert_eq!(record.save_count(), 0);
    }

    #[test]
    fn test_save_failure_becomes_failed() {
        let mut builder = builder_with(AnonymiserConfig::new(), &["first_name"]);
        builder.nilable(["first_name"]).expect("valid configuration");

        let mut record = employee().fail_on_save("disk full");
        let result = builder.apply(&mut record).expect("valid");

        assert!(result.is_failed());
        assert_eq!(
            result.error(),
            Some(&RecordError::SaveFailed {
                reason: "disk full".to_string()
            })
        );
        assert_eq!(result.record(), &RecordRef::new("Employee", "1"));
    }

    struct RecordingHook {
        calls: Mutex<Vec<String>>,
    }

    impl AuditLogHook for RecordingHook {
        fn before_overwrite(&self, record: &dyn Record) {
            self.calls
                .lock()
                .expect("calls")
                .push(format!("before:{}", record.record_id()));
        }

        fn after_overwrite(
            &self,
            _record: &dyn Record,
            written: &BTreeMap<String, FieldValue>,
        ) -> Vec<String> {
            self.calls
                .lock()
                .expect("calls")
                .push(format!("after:{}", written.len()));
            vec!["audited_changes".to_string()]
        }
    }

    #[test]
    fn test_audit_hook_reports_fields() {
        let mut builder = builder_with(AnonymiserConfig::new(), &["first_name"]);
        builder.nilable(["first_name"]).expect("valid configuration");
        let hook = RecordingHook {
            calls: Mutex::new(Vec::new()),
        };

        let mut record = employee();
        let result = builder
            .apply_with_hook(&mut record, Some(&hook))
            .expect("valid");

        assert_eq!(result.audit_fields(), ["audited_changes"]);
        assert_eq!(
            *hook.calls.lock().expect("calls"),
            vec!["before:1".to_string(), "after:1".to_string()]
        );
    }

    #[test]
    fn test_overridden_named_strategy_is_used() {
        let config = Arc::new(AnonymiserConfig::new());
        let mut registry = StrategyRegistry::with_defaults(&config);
        registry
            .register("email", Strategy::constant("redacted@example.com"))
            .expect("override");

        let mut builder = FieldStrategyBuilder::new(
            Arc::new(RecordSchema::new("Contact", ["email"])),
            config,
            Arc::new(registry),
        );
        builder.email(["email"]).expect("valid configuration");

        let mut record = InMemoryRecord::new("Contact", "1").with_field("email", json!("a@b.c"));
        builder.apply(&mut record).expect("valid");

        assert_eq!(record.value("email"), Some(&json!("redacted@example.com")));
    }
}
