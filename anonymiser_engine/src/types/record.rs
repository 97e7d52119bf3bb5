//! # Record Abstractions
//!
//! The engine never talks to a store directly. Everything it needs from a
//! persisted record goes through the [`Record`] trait: read a field, write a
//! field, list the fields the concrete record persists, save, delete.
//!
//! Completeness checking does not need an instance at all; it runs against a
//! [`RecordSchema`], the declared set of persisted fields for a record type.

use crate::types::error::RecordError;
use crate::types::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Persistence collaborator for a single record instance
pub trait Record: fmt::Debug {
    /// Name of the record type, used to find the owning policy
    fn record_type(&self) -> &str;

    /// Stable identifier, rendered as a string for results and logs
    fn record_id(&self) -> String;

    /// Read the current value of a persisted field
    fn get_field(&self, name: &str) -> Result<FieldValue, RecordError>;

    /// Write a new value; nothing is persisted until [`Record::save`]
    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), RecordError>;

    /// Fields actually present on this instance
    ///
    /// May be narrower than the record type's schema, e.g. when a store
    /// projected only some columns. Strategies for absent fields are skipped.
    fn persisted_field_names(&self) -> Vec<String>;

    fn save(&mut self) -> Result<(), RecordError>;

    fn delete(&mut self) -> Result<(), RecordError>;
}

/// Declared persisted fields of a record type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    name: String,
    fields: BTreeSet<String>,
}

impl RecordSchema {
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field names in sorted order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// Type and id of the record a result refers to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordRef {
    pub record_type: String,
    pub id: String,
}

impl RecordRef {
    pub fn new(record_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            id: id.into(),
        }
    }

    pub fn of(record: &dyn Record) -> Self {
        Self::new(record.record_type(), record.record_id())
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.record_type, self.id)
    }
}

impl From<&RecordRef> for anonymiser_core::logging::RecordContext {
    fn from(record: &RecordRef) -> Self {
        Self::new(record.record_type.clone(), record.id.clone())
    }
}
