//! # Anonymiser Core
//!
//! Configuration and logging shared by the anonymisation engine and its CLI.

pub mod config;
#[macro_use]
pub mod logging;

// Re-export key types for library consumers
pub use config::runtime::{ConfigError, EngineSettings, LoggingPreferences, RuntimeConfig};
pub use logging::{Code, LogEvent, LogLevel};
