// src/strategies/registry.rs
//! Named strategy registry
//!
//! Field builders resolve strategy names such as `email` through this
//! registry. It is filled during startup and then shared read-only.

use crate::api::config::AnonymiserConfig;
use crate::strategies::builtins::{CurrentDatetime, Email, Nilable, NoOp, PhoneNumber};
use crate::strategies::errors::ConfigurationError;
use crate::strategies::traits::Strategy;
use anonymiser_core::config::compile_time::strategies::PROTECTED_STRATEGY_NAMES;
use anonymiser_core::log_success;
use anonymiser_core::logging::codes;
use std::collections::HashMap;

pub const BUILTIN_STRATEGY_NAMES: &[&str] =
    &["current_datetime", "email", "nilable", "no_op", "phone_number"];

#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Strategy>,
}

impl StrategyRegistry {
    /// Empty registry; `FieldStrategyBuilder` shortcuts will not resolve
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Registry holding the built-in strategies parameterised from `config`
    pub fn with_defaults(config: &AnonymiserConfig) -> Self {
        let mut strategies: HashMap<String, Strategy> = HashMap::new();
        strategies.insert(
            "email".to_string(),
            Strategy::custom(Email::new(config.email_template())),
        );
        strategies.insert(
            "phone_number".to_string(),
            Strategy::custom(PhoneNumber::new(config.phone_number())),
        );
        strategies.insert(
            "current_datetime".to_string(),
            Strategy::custom(CurrentDatetime),
        );
        strategies.insert("nilable".to_string(), Strategy::custom(Nilable));
        strategies.insert("no_op".to_string(), Strategy::custom(NoOp));

        let mut registry = Self::new();
        registry.strategies = strategies;
        registry
    }

    /// Register a named strategy; an existing name is replaced
    pub fn register(
        &mut self,
        name: impl Into<String>,
        strategy: Strategy,
    ) -> Result<(), ConfigurationError> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(ConfigurationError::EmptyStrategyName);
        }

        if PROTECTED_STRATEGY_NAMES.contains(&name.as_str()) {
            return Err(ConfigurationError::ProtectedStrategyName { name });
        }

        log_success!(
            codes::success::STRATEGY_REGISTERED,
            "Registered named strategy",
            "name" => name,
            "kind" => strategy.name(),
            "overrides_builtin" => BUILTIN_STRATEGY_NAMES.contains(&name.as_str())
        );

        self.strategies.insert(name, strategy);

        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Strategy, ConfigurationError> {
        self.strategies
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownStrategy {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_defaults(&AnonymiserConfig::default())
    }
}

/// Chained registration for host applications
pub struct RegistryBuilder {
    registry: StrategyRegistry,
}

impl RegistryBuilder {
    pub fn new(config: &AnonymiserConfig) -> Self {
        Self {
            registry: StrategyRegistry::with_defaults(config),
        }
    }

    pub fn empty() -> Self {
        Self {
            registry: StrategyRegistry::new(),
        }
    }

    pub fn add_strategy(
        mut self,
        name: impl Into<String>,
        strategy: Strategy,
    ) -> Result<Self, ConfigurationError> {
        self.registry.register(name, strategy)?;
        Ok(self)
    }

    pub fn build(self) -> StrategyRegistry {
        self.registry
    }
}
