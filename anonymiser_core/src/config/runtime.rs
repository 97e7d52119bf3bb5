// RUNTIME PREFERENCES (User Experience)

use crate::config::compile_time::{schema, strategies};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;

/// Errors raised while loading or validating runtime configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_list(name: &str) -> Vec<String> {
    env::var(name)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    /// Field stamped with the current time whenever a record is overwritten
    pub marker_field: String,

    /// Fields exempt from completeness checks on every record type
    pub ignored_fields: Vec<String>,

    /// Regular expressions; any field matching one is globally ignored
    pub ignored_patterns: Vec<String>,

    /// Template for generated email addresses (`{}` receives a UUID)
    pub email_template: String,

    /// Value written by the phone number strategy
    pub phone_number: String,

    /// Whether `apply` re-runs completeness validation before writing
    pub validate_before_apply: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            marker_field: env::var("ANONYMISER_MARKER_FIELD")
                .unwrap_or_else(|_| schema::DEFAULT_MARKER_FIELD.to_string()),
            ignored_fields: env_list("ANONYMISER_IGNORED_FIELDS"),
            ignored_patterns: env_list("ANONYMISER_IGNORED_PATTERNS"),
            email_template: env::var("ANONYMISER_EMAIL_TEMPLATE")
                .unwrap_or_else(|_| strategies::DEFAULT_EMAIL_TEMPLATE.to_string()),
            phone_number: env::var("ANONYMISER_PHONE_NUMBER")
                .unwrap_or_else(|_| strategies::DEFAULT_PHONE_NUMBER.to_string()),
            validate_before_apply: env_or("ANONYMISER_VALIDATE_BEFORE_APPLY", true),
        }
    }
}

impl EngineSettings {
    /// Check values that would otherwise only fail once records are touched
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.marker_field.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "engine.marker_field".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if !self.email_template.contains("{}") {
            return Err(ConfigError::InvalidValue {
                key: "engine.email_template".to_string(),
                reason: "must contain a '{}' placeholder".to_string(),
            });
        }

        if let Some(field) = self
            .ignored_fields
            .iter()
            .find(|f| f.len() > schema::MAX_FIELD_NAME_LENGTH)
        {
            return Err(ConfigError::InvalidValue {
                key: "engine.ignored_fields".to_string(),
                reason: format!(
                    "field name of {} characters exceeds limit of {}",
                    field.len(),
                    schema::MAX_FIELD_NAME_LENGTH
                ),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging (user preference)
    pub use_structured_logging: bool,

    /// Whether to enable console output (user preference)
    pub enable_console_logging: bool,

    /// User preferred minimum log level
    pub min_log_level: LogLevel,

    /// Whether to attach record type and id to events raised during apply
    pub include_record_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env_or("ANONYMISER_LOGGING_USE_STRUCTURED", false),
            enable_console_logging: env_or("ANONYMISER_LOGGING_ENABLE_CONSOLE", true),
            min_log_level: env::var("ANONYMISER_LOGGING_MIN_LEVEL")
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Info),
            include_record_context: env_or("ANONYMISER_LOGGING_INCLUDE_RECORD_CONTEXT", true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Convert to events::LogLevel for compatibility
    pub fn to_events_log_level(&self) -> crate::logging::events::LogLevel {
        match self {
            LogLevel::Error => crate::logging::events::LogLevel::Error,
            LogLevel::Warning => crate::logging::events::LogLevel::Warning,
            LogLevel::Info => crate::logging::events::LogLevel::Info,
            LogLevel::Debug => crate::logging::events::LogLevel::Debug,
        }
    }
}

/// Parse log level from string (used for environment variables)
pub fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub engine: EngineSettings,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Parse a TOML document; missing sections fall back to environment defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = toml::from_str(source)?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // Engine
    pub const MARKER_FIELD: &str = "ANONYMISER_MARKER_FIELD";
    pub const IGNORED_FIELDS: &str = "ANONYMISER_IGNORED_FIELDS";
    pub const IGNORED_PATTERNS: &str = "ANONYMISER_IGNORED_PATTERNS";
    pub const EMAIL_TEMPLATE: &str = "ANONYMISER_EMAIL_TEMPLATE";
    pub const PHONE_NUMBER: &str = "ANONYMISER_PHONE_NUMBER";
    pub const VALIDATE_BEFORE_APPLY: &str = "ANONYMISER_VALIDATE_BEFORE_APPLY";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "ANONYMISER_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "ANONYMISER_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "ANONYMISER_LOGGING_MIN_LEVEL";
    pub const LOGGING_INCLUDE_RECORD_CONTEXT: &str = "ANONYMISER_LOGGING_INCLUDE_RECORD_CONTEXT";
}
