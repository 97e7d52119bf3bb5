//! # JSON Record Store
//!
//! Backs the engine's [`Record`] trait with a JSON file. The file is an object
//! mapping record type names to arrays of field objects:
//!
//! ```json
//! { "User": [{ "id": 1, "email": "will@example.org" }], "Session": [] }
//! ```
//!
//! Records are identified by their `id` field, or by position when they have
//! none. Writes stay on the loaded record until `save`; `delete` removes the
//! row from the store.

use crate::error::CliError;
use anonymiser_engine::types::{FieldValue, Record, RecordError};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type Row = Map<String, Value>;

#[derive(Debug, Default)]
struct StoreState {
    // Deleted rows become `None` so positions stay stable
    tables: BTreeMap<String, Vec<Option<Row>>>,
}

#[derive(Debug, Clone, Default)]
pub struct JsonRecordStore {
    state: Arc<Mutex<StoreState>>,
}

impl JsonRecordStore {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let source = std::fs::read_to_string(path).map_err(|e| CliError::io(path, e))?;
        let value: Value = serde_json::from_str(&source).map_err(|e| CliError::json(path, e))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, CliError> {
        let Value::Object(types) = value else {
            return Err(CliError::InvalidRecords {
                reason: "top level must be an object keyed by record type".to_string(),
            });
        };

        let mut tables = BTreeMap::new();
        for (record_type, rows) in types {
            let Value::Array(rows) = rows else {
                return Err(CliError::InvalidRecords {
                    reason: format!("'{}' must be an array of records", record_type),
                });
            };

            let rows = rows
                .into_iter()
                .enumerate()
                .map(|(index, row)| match row {
                    Value::Object(fields) => Ok(Some(fields)),
                    _ => Err(CliError::InvalidRecords {
                        reason: format!("'{}'[{}] is not an object", record_type, index),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?;

            tables.insert(record_type, rows);
        }

        Ok(Self {
            state: Arc::new(Mutex::new(StoreState { tables })),
        })
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record types present in the file, sorted
    pub fn record_types(&self) -> Vec<String> {
        self.lock().tables.keys().cloned().collect()
    }

    /// Live records of `record_type` in file order
    pub fn records(&self, record_type: &str) -> Vec<StoredRecord> {
        self.records_where(record_type, |_| true)
    }

    /// Live records whose `field` equals `subject_id`
    pub fn find_by_field(&self, record_type: &str, field: &str, subject_id: &str) -> Vec<StoredRecord> {
        self.records_where(record_type, |row| {
            row.get(field)
                .is_some_and(|value| value_matches(value, subject_id))
        })
    }

    fn records_where<F>(&self, record_type: &str, keep: F) -> Vec<StoredRecord>
    where
        F: Fn(&Row) -> bool,
    {
        let state = self.lock();
        let Some(rows) = state.tables.get(record_type) else {
            return Vec::new();
        };

        rows.iter()
            .enumerate()
            .filter_map(|(index, row)| row.as_ref().map(|row| (index, row)))
            .filter(|(_, row)| keep(row))
            .map(|(index, row)| StoredRecord {
                store: self.clone(),
                record_type: record_type.to_string(),
                index,
                id: render_id(row, index),
                fields: row.clone(),
            })
            .collect()
    }

    pub fn live_count(&self, record_type: &str) -> usize {
        self.lock()
            .tables
            .get(record_type)
            .map(|rows| rows.iter().flatten().count())
            .unwrap_or(0)
    }

    /// Current contents with deleted rows dropped
    pub fn to_value(&self) -> Value {
        let state = self.lock();
        let types: Map<String, Value> = state
            .tables
            .iter()
            .map(|(record_type, rows)| {
                let rows = rows.iter().flatten().cloned().map(Value::Object).collect();
                (record_type.clone(), Value::Array(rows))
            })
            .collect();
        Value::Object(types)
    }

    pub fn write(&self, path: &Path) -> Result<(), CliError> {
        let json = serde_json::to_string_pretty(&self.to_value()).map_err(|e| CliError::json(path, e))?;
        std::fs::write(path, json).map_err(|e| CliError::io(path, e))
    }
}

fn render_id(row: &Row, index: usize) -> String {
    match row.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Null) | None => index.to_string(),
        Some(other) => other.to_string(),
    }
}

fn value_matches(value: &Value, subject_id: &str) -> bool {
    match value {
        Value::String(s) => s == subject_id,
        Value::Number(_) | Value::Bool(_) => value.to_string() == subject_id,
        _ => false,
    }
}

/// One row loaded from a [`JsonRecordStore`]
#[derive(Debug, Clone)]
pub struct StoredRecord {
    store: JsonRecordStore,
    record_type: String,
    index: usize,
    id: String,
    fields: Row,
}

impl StoredRecord {
    pub fn fields(&self) -> &Row {
        &self.fields
    }
}

impl Record for StoredRecord {
    fn record_type(&self) -> &str {
        &self.record_type
    }

    fn record_id(&self) -> String {
        self.id.clone()
    }

    fn get_field(&self, name: &str) -> Result<FieldValue, RecordError> {
        self.fields
            .get(name)
            .cloned()
            .ok_or_else(|| RecordError::FieldNotFound {
                field: name.to_string(),
            })
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), RecordError> {
        self.fields.insert(name.to_string(), value);
        Ok(())
    }

    fn persisted_field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    fn save(&mut self) -> Result<(), RecordError> {
        let mut state = self.store.lock();
        match state
            .tables
            .get_mut(&self.record_type)
            .and_then(|rows| rows.get_mut(self.index))
        {
            Some(Some(row)) => {
                *row = self.fields.clone();
                Ok(())
            }
            _ => Err(RecordError::SaveFailed {
                reason: format!("{}#{} no longer exists", self.record_type, self.id),
            }),
        }
    }

    fn delete(&mut self) -> Result<(), RecordError> {
        let mut state = self.store.lock();
        match state
            .tables
            .get_mut(&self.record_type)
            .and_then(|rows| rows.get_mut(self.index))
        {
            Some(slot) if slot.is_some() => {
                *slot = None;
                Ok(())
            }
            _ => Err(RecordError::DeleteFailed {
                reason: format!("{}#{} no longer exists", self.record_type, self.id),
            }),
        }
    }
}
