//! # Anonymisation Policies
//!
//! A policy decides what happens to every record of one record type: either
//! each persisted field is overwritten by a strategy, or the whole record is
//! destroyed. Policies are declared once at startup through
//! [`PolicyRegistry::anonymise`] and are read-only afterwards.
//!
//! ```ignore
//! let mut policies = PolicyRegistry::new(AnonymiserConfig::new().ignore_field("id"));
//! policies.anonymise(schema, |policy| {
//!     policy.fields(|f| {
//!         f.hex(["first_name"])?.nilable(["last_name"])?.ignore(["company_name"])?;
//!         Ok(())
//!     })?;
//!     Ok(())
//! })?;
//! let result = policies.apply(&mut record)?;
//! ```

pub mod audit;
pub mod builder;
pub mod config;
pub mod destroy;
pub mod registry;
pub mod selectors;

pub use audit::AuditLogHook;
pub use builder::FieldStrategyBuilder;
pub use config::{PolicyConfig, SkipFilter};
pub use destroy::DestroyStrategy;
pub use registry::{PolicyRegistry, PolicyValidationFailure};
pub use selectors::{SelectorQuery, SelectorRegistry};

use serde::Serialize;
use std::fmt;

/// Which branch a policy's strategy slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Fields,
    Destroy,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Fields => write!(f, "fields"),
            StrategyKind::Destroy => write!(f, "destroy"),
        }
    }
}
