//! Audit log integration point
//!
//! Stores that keep an audit trail of changes would otherwise leak the very
//! values an overwrite removed. A hook attached to a policy is told about
//! every overwrite and reports which audit fields it scrubbed.

use crate::types::{FieldValue, Record};
use std::collections::BTreeMap;

pub trait AuditLogHook: Send + Sync {
    /// Called before any field is written
    fn before_overwrite(&self, _record: &dyn Record) {}

    /// Called after a successful save with the values that were written;
    /// returns the audit fields that were scrubbed
    fn after_overwrite(
        &self,
        record: &dyn Record,
        written: &BTreeMap<String, FieldValue>,
    ) -> Vec<String>;
}
