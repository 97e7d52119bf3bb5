//! Subcommand implementations

pub mod apply;
pub mod validate;

use crate::error::CliError;
use anonymiser_core::RuntimeConfig;
use std::path::Path;

pub use apply::{ApplyOptions, ApplyReport};

/// Load runtime configuration from `path`, or from the environment
pub fn load_runtime_config(path: Option<&Path>) -> Result<RuntimeConfig, CliError> {
    match path {
        Some(path) => Ok(RuntimeConfig::from_file(path)?),
        None => {
            let config = RuntimeConfig::default();
            config.engine.validate()?;
            Ok(config)
        }
    }
}
