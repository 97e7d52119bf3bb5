use anonymiser_core::logging::codes;
use anonymiser_core::Code;
use serde::{Deserialize, Serialize};

/// Failures reported by the persistence collaborator
///
/// Clonable and serializable so it can travel inside an
/// [`AnonymisationResult`](crate::results::AnonymisationResult).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordError {
    #[error("Field '{field}' does not exist on the record")]
    FieldNotFound { field: String },

    #[error("Record rejected value for field '{field}': {reason}")]
    WriteRejected { field: String, reason: String },

    #[error("Failed to save record: {reason}")]
    SaveFailed { reason: String },

    #[error("Failed to delete record: {reason}")]
    DeleteFailed { reason: String },

    #[error("Selector query for subject '{subject}' failed: {reason}")]
    QueryFailed { subject: String, reason: String },
}

impl RecordError {
    pub fn code(&self) -> Code {
        match self {
            RecordError::FieldNotFound { .. } | RecordError::WriteRejected { .. } => {
                codes::persistence::WRITE_REJECTED
            }
            RecordError::SaveFailed { .. } => codes::persistence::SAVE_FAILED,
            RecordError::DeleteFailed { .. } => codes::persistence::DELETE_FAILED,
            RecordError::QueryFailed { .. } => codes::persistence::QUERY_FAILED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_kind_tag() {
        let error = RecordError::DeleteFailed {
            reason: "row locked".to_string(),
        };
        let json = serde_json::to_value(&error).expect("serialize");

        assert_eq!(json["kind"], "delete_failed");
        assert_eq!(json["reason"], "row locked");
    }

    #[test]
    fn test_codes() {
        let error = RecordError::SaveFailed {
            reason: "disk full".to_string(),
        };
        assert_eq!(error.code().as_str(), "E041");
        assert_eq!(error.to_string(), "Failed to save record: disk full");
    }
}
