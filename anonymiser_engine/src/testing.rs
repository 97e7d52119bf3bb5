//! In-memory [`Record`] for tests and examples
//!
//! Save and delete only flip counters; failures can be injected per
//! operation. An optional shared journal records `save:<id>` and
//! `delete:<id>` entries so tests can observe records that were moved into
//! the engine.

use crate::types::{FieldValue, Record, RecordError};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, PoisonError};

pub type Journal = Arc<Mutex<Vec<String>>>;

#[derive(Debug, Clone, Default)]
pub struct InMemoryRecord {
    record_type: String,
    id: String,
    values: BTreeMap<String, FieldValue>,
    save_count: usize,
    deleted: bool,
    save_failure: Option<String>,
    delete_failure: Option<String>,
    rejected_writes: BTreeSet<String>,
    journal: Option<Journal>,
}

impl InMemoryRecord {
    pub fn new(record_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn fail_on_save(mut self, reason: impl Into<String>) -> Self {
        self.save_failure = Some(reason.into());
        self
    }

    pub fn fail_on_delete(mut self, reason: impl Into<String>) -> Self {
        self.delete_failure = Some(reason.into());
        self
    }

    pub fn reject_write(mut self, field: impl Into<String>) -> Self {
        self.rejected_writes.insert(field.into());
        self
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn save_count(&self) -> usize {
        self.save_count
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn note(&self, entry: String) {
        if let Some(journal) = &self.journal {
            journal
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(entry);
        }
    }
}

impl Record for InMemoryRecord {
    fn record_type(&self) -> &str {
        &self.record_type
    }

    fn record_id(&self) -> String {
        self.id.clone()
    }

    fn get_field(&self, name: &str) -> Result<FieldValue, RecordError> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| RecordError::FieldNotFound {
                field: name.to_string(),
            })
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), RecordError> {
        if self.rejected_writes.contains(name) {
            return Err(RecordError::WriteRejected {
                field: name.to_string(),
                reason: "read-only column".to_string(),
            });
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    fn persisted_field_names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    fn save(&mut self) -> Result<(), RecordError> {
        if let Some(reason) = &self.save_failure {
            return Err(RecordError::SaveFailed {
                reason: reason.clone(),
            });
        }
        self.save_count += 1;
        self.note(format!("save:{}", self.id));
        Ok(())
    }

    fn delete(&mut self) -> Result<(), RecordError> {
        if let Some(reason) = &self.delete_failure {
            return Err(RecordError::DeleteFailed {
                reason: reason.clone(),
            });
        }
        self.deleted = true;
        self.note(format!("delete:{}", self.id));
        Ok(())
    }
}
