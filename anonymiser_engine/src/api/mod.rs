//! # Public API
//!
//! Shared configuration and the error type returned by the engine's entry
//! points.

pub mod config;
pub mod errors;

pub use config::{AnonymiserConfig, IgnoreRule};
pub use errors::AnonymiserError;
