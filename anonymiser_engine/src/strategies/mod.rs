// src/strategies/mod.rs
//! Field strategies: the trait, the built-ins and the named registry

pub mod builtins;
pub mod errors;
pub mod registry;
pub mod traits;

pub use builtins::{CurrentDatetime, Email, Nilable, NoOp, OverwriteHex, PhoneNumber};
pub use errors::{ConfigurationError, ValidationError};
pub use registry::{RegistryBuilder, StrategyRegistry, BUILTIN_STRATEGY_NAMES};
pub use traits::{FieldStrategy, Strategy};
