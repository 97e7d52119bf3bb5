//! CLI error type

use anonymiser_core::ConfigError;
use anonymiser_engine::api::AnonymiserError;
use anonymiser_engine::strategies::ConfigurationError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("Invalid policy file: {0}")]
    PolicyParse(#[from] toml::de::Error),

    #[error("Invalid record file: {reason}")]
    InvalidRecords { reason: String },

    #[error("Invalid policy for '{record_type}': {reason}")]
    InvalidPolicy { record_type: String, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{}", .0.user_message())]
    Anonymiser(#[from] AnonymiserError),

    #[error("{count} {}", incomplete_noun(.count))]
    IncompletePolicies { count: usize },

    #[error("'{record_type}' records carry fields the policy does not declare: {}", .fields.join(", "))]
    UndeclaredFields {
        record_type: String,
        fields: Vec<String>,
    },

    #[error("Logging initialisation failed: {0}")]
    Logging(String),
}

fn incomplete_noun(count: &usize) -> &'static str {
    if *count == 1 {
        "policy is incomplete"
    } else {
        "policies are incomplete"
    }
}

impl From<ConfigurationError> for CliError {
    fn from(error: ConfigurationError) -> Self {
        CliError::Anonymiser(error.into())
    }
}

impl CliError {
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        CliError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn json(path: &std::path::Path, source: serde_json::Error) -> Self {
        CliError::Json {
            path: path.display().to_string(),
            source,
        }
    }

    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::IncompletePolicies { .. } | CliError::UndeclaredFields { .. } => 2,
            CliError::Anonymiser(e) if e.is_validation_error() => 2,
            _ => 1,
        }
    }
}
