pub mod error;
pub mod record;

pub use error::RecordError;
pub use record::{Record, RecordRef, RecordSchema};

/// Value of a single persisted field
///
/// Timestamps are RFC 3339 strings in UTC.
pub type FieldValue = serde_json::Value;
