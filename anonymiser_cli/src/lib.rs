//! # Anonymiser CLI
//!
//! Applies TOML-declared anonymisation policies to records kept in a JSON
//! file. The binary is a thin shell over [`commands`]; the store and policy
//! file loaders are usable on their own.

pub mod commands;
pub mod error;
pub mod policy_file;
pub mod store;

pub use error::CliError;
pub use policy_file::PolicyFile;
pub use store::{JsonRecordStore, StoredRecord};
