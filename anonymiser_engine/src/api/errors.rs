use crate::strategies::errors::{ConfigurationError, ValidationError};
use crate::types::error::RecordError;
use anonymiser_core::logging::codes;
use anonymiser_core::Code;

/// Any failure surfaced by the engine's public entry points
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnonymiserError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("Record type '{record_type}' is not anonymisable")]
    NotAnonymisable { record_type: String },

    #[error("Cannot tell whether '{record_type}' records are anonymised: no marker field")]
    AnonymisationNotKnown { record_type: String },
}

impl AnonymiserError {
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            AnonymiserError::Configuration(_) | AnonymiserError::NotAnonymisable { .. }
        )
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, AnonymiserError::Validation(_))
    }

    pub fn is_record_error(&self) -> bool {
        matches!(self, AnonymiserError::Record(_))
    }

    /// Whether retrying the same call could succeed without changing the policy
    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.code().as_str())
    }

    pub fn code(&self) -> Code {
        match self {
            AnonymiserError::Configuration(e) => e.code(),
            AnonymiserError::Validation(e) => e.code(),
            AnonymiserError::Record(e) => e.code(),
            AnonymiserError::NotAnonymisable { .. } => codes::apply::NOT_ANONYMISABLE,
            AnonymiserError::AnonymisationNotKnown { .. } => codes::apply::ANONYMISATION_NOT_KNOWN,
        }
    }

    /// Message suitable for CLI output
    pub fn user_message(&self) -> String {
        match self {
            AnonymiserError::Configuration(e) => format!("Policy declaration is invalid: {}", e),
            AnonymiserError::Validation(ValidationError::UnhandledFields {
                record_type,
                fields,
            }) => format!(
                "'{}' has fields without an anonymisation strategy: {}",
                record_type,
                fields.join(", ")
            ),
            AnonymiserError::Record(e) => format!("Store rejected the operation: {}", e),
            AnonymiserError::NotAnonymisable { record_type } => {
                format!("No anonymisation policy declared for '{}'", record_type)
            }
            AnonymiserError::AnonymisationNotKnown { record_type } => format!(
                "'{}' has no marker field; anonymisation state unknown",
                record_type
            ),
        }
    }
}
