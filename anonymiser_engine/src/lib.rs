//! # Anonymiser Engine - declarative record anonymisation
//!
//! Each record type declares a policy: overwrite every persisted field with an
//! explicit strategy, or destroy the whole record. Policies are checked for
//! completeness before they touch a record, and every application yields an
//! [`AnonymisationResult`](results::AnonymisationResult).

pub mod api;
pub mod policy;
pub mod results;
pub mod strategies;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;

// Convenience re-exports
pub use api::*;
pub use policy::{PolicyConfig, PolicyRegistry};
pub use results::{AnonymisationResult, ResultStatus, ResultSummary};

pub mod prelude {
    pub use crate::api::{AnonymiserConfig, AnonymiserError, IgnoreRule};

    pub use crate::strategies::{
        ConfigurationError, FieldStrategy, RegistryBuilder, Strategy, StrategyRegistry,
        ValidationError,
    };

    pub use crate::policy::{
        AuditLogHook, DestroyStrategy, FieldStrategyBuilder, PolicyConfig, PolicyRegistry,
        SelectorRegistry, StrategyKind,
    };

    pub use crate::results::{AnonymisationResult, ResultStatus, ResultSummary};

    pub use crate::types::{FieldValue, Record, RecordError, RecordRef, RecordSchema};
}
