// src/strategies/errors.rs
//! Errors raised while declaring strategies and policies, and by
//! completeness validation

use crate::policy::StrategyKind;
use anonymiser_core::logging::codes;
use anonymiser_core::Code;

/// Mistakes in a policy declaration; reported as soon as they are made
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Multiple strategies defined for {fields:?} on '{record_type}'")]
    DuplicateStrategy {
        record_type: String,
        fields: Vec<String>,
    },

    #[error("Cannot use {attempted} strategy on '{record_type}': {existing} strategy already defined")]
    StrategyAlreadyDefined {
        record_type: String,
        attempted: StrategyKind,
        existing: StrategyKind,
    },

    #[error("One or more fields required for strategy on '{record_type}'")]
    MissingFields { record_type: String },

    #[error("Unknown strategy '{name}'")]
    UnknownStrategy { name: String },

    #[error("Strategy name '{name}' is reserved")]
    ProtectedStrategyName { name: String },

    #[error("Strategy name must not be empty")]
    EmptyStrategyName,

    #[error("Cannot ignore {fields:?} on '{record_type}': fields already ignored globally")]
    AlreadyGloballyIgnored {
        record_type: String,
        fields: Vec<String>,
    },

    #[error("Selector for {subject} not found. Make sure you have one defined in {record_type}")]
    SelectorNotFound {
        subject: String,
        record_type: String,
    },

    #[error("Skip filter already defined for '{record_type}'")]
    SkipFilterAlreadyDefined { record_type: String },

    #[error("Must specify either destroy or fields strategy for '{record_type}'")]
    UndefinedStrategy { record_type: String },

    #[error("Record type '{record_type}' already has an anonymisation policy")]
    DuplicatePolicy { record_type: String },

    #[error("Invalid ignore pattern '{pattern}': {reason}")]
    InvalidIgnorePattern { pattern: String, reason: String },

    #[error("Hex length {length} out of range 1..={max}")]
    InvalidHexLength { length: usize, max: usize },
}

impl ConfigurationError {
    pub fn code(&self) -> Code {
        use codes::configuration::*;
        match self {
            Self::DuplicateStrategy { .. } => DUPLICATE_STRATEGY,
            Self::StrategyAlreadyDefined { .. } => STRATEGY_ALREADY_DEFINED,
            Self::MissingFields { .. } => MISSING_FIELDS,
            Self::InvalidHexLength { .. } => INVALID_HEX_LENGTH,
            Self::UnknownStrategy { .. } => UNKNOWN_STRATEGY,
            Self::ProtectedStrategyName { .. } | Self::EmptyStrategyName => {
                PROTECTED_STRATEGY_NAME
            }
            Self::AlreadyGloballyIgnored { .. } => ALREADY_GLOBALLY_IGNORED,
            Self::SelectorNotFound { .. } => SELECTOR_NOT_FOUND,
            Self::SkipFilterAlreadyDefined { .. } => SKIP_FILTER_ALREADY_DEFINED,
            Self::UndefinedStrategy { .. } => UNDEFINED_STRATEGY,
            Self::DuplicatePolicy { .. } => DUPLICATE_POLICY,
            Self::InvalidIgnorePattern { .. } => INVALID_IGNORE_PATTERN,
        }
    }
}

/// Persisted fields left without a disposition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid anonymisation strategy for '{record_type}' fields {fields:?}")]
    UnhandledFields {
        record_type: String,
        fields: Vec<String>,
    },
}

impl ValidationError {
    pub fn code(&self) -> Code {
        codes::validation::UNHANDLED_FIELDS
    }

    pub fn fields(&self) -> &[String] {
        match self {
            ValidationError::UnhandledFields { fields, .. } => fields,
        }
    }
}
