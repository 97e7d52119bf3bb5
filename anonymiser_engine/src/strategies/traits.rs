// src/strategies/traits.rs
//! Field strategy abstraction
//!
//! A strategy turns a field's previous value into the value written back.
//! Strategies receive the record explicitly so a rule can depend on other
//! fields of the same record.

use crate::types::{FieldValue, Record};
use std::fmt;
use std::sync::Arc;

/// Value transformation applied to a single field
pub trait FieldStrategy: Send + Sync {
    fn evaluate(&self, record: &dyn Record, previous: &FieldValue) -> FieldValue;

    /// Short label used in logs and introspection
    fn name(&self) -> &str {
        "custom"
    }
}

struct FnStrategy<F>(F);

impl<F> FieldStrategy for FnStrategy<F>
where
    F: Fn(&FieldValue) -> FieldValue + Send + Sync,
{
    fn evaluate(&self, _record: &dyn Record, previous: &FieldValue) -> FieldValue {
        (self.0)(previous)
    }

    fn name(&self) -> &str {
        "fn"
    }
}

struct RecordFnStrategy<F>(F);

impl<F> FieldStrategy for RecordFnStrategy<F>
where
    F: Fn(&dyn Record, &FieldValue) -> FieldValue + Send + Sync,
{
    fn evaluate(&self, record: &dyn Record, previous: &FieldValue) -> FieldValue {
        (self.0)(record, previous)
    }

    fn name(&self) -> &str {
        "record_fn"
    }
}

/// Shared handle to a strategy; cloning is cheap
#[derive(Clone)]
pub enum Strategy {
    /// Written verbatim regardless of the previous value
    Constant(FieldValue),
    Custom(Arc<dyn FieldStrategy>),
}

impl Strategy {
    pub fn constant(value: impl Into<FieldValue>) -> Self {
        Strategy::Constant(value.into())
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&FieldValue) -> FieldValue + Send + Sync + 'static,
    {
        Strategy::Custom(Arc::new(FnStrategy(f)))
    }

    pub fn from_record_fn<F>(f: F) -> Self
    where
        F: Fn(&dyn Record, &FieldValue) -> FieldValue + Send + Sync + 'static,
    {
        Strategy::Custom(Arc::new(RecordFnStrategy(f)))
    }

    pub fn custom<S: FieldStrategy + 'static>(strategy: S) -> Self {
        Strategy::Custom(Arc::new(strategy))
    }

    pub fn evaluate(&self, record: &dyn Record, previous: &FieldValue) -> FieldValue {
        match self {
            Strategy::Constant(value) => value.clone(),
            Strategy::Custom(strategy) => strategy.evaluate(record, previous),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Strategy::Constant(_) => "constant",
            Strategy::Custom(strategy) => strategy.name(),
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Strategy::Custom(strategy) => f.debug_tuple("Custom").field(&strategy.name()).finish(),
        }
    }
}
