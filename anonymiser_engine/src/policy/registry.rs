//! Top-level policy registry
//!
//! Owns one [`PolicyConfig`] per record type together with the shared engine
//! configuration and named strategies. Record types never share builder
//! state: each policy gets its own builder when it is declared.

use crate::api::config::AnonymiserConfig;
use crate::api::errors::AnonymiserError;
use crate::policy::config::PolicyConfig;
use crate::results::AnonymisationResult;
use crate::strategies::{ConfigurationError, StrategyRegistry};
use crate::types::{Record, RecordSchema};
use anonymiser_core::log_success;
use anonymiser_core::logging::codes;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug)]
pub struct PolicyRegistry {
    config: Arc<AnonymiserConfig>,
    strategies: Arc<StrategyRegistry>,
    policies: BTreeMap<String, PolicyConfig>,
}

/// A record type whose policy would refuse to apply
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyValidationFailure {
    pub record_type: String,
    pub code: String,
    pub message: String,
}

impl PolicyRegistry {
    /// Registry using the built-in named strategies
    pub fn new(config: AnonymiserConfig) -> Self {
        let strategies = StrategyRegistry::with_defaults(&config);
        Self::with_strategies(config, strategies)
    }

    pub fn with_strategies(config: AnonymiserConfig, strategies: StrategyRegistry) -> Self {
        Self {
            config: Arc::new(config),
            strategies: Arc::new(strategies),
            policies: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &AnonymiserConfig {
        &self.config
    }

    pub fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    /// Declare the policy for `schema`'s record type
    ///
    /// Nothing is stored if `declare` fails.
    pub fn anonymise<F>(&mut self, schema: RecordSchema, declare: F) -> Result<(), ConfigurationError>
    where
        F: FnOnce(&mut PolicyConfig) -> Result<(), ConfigurationError>,
    {
        let record_type = schema.name().to_string();
        if self.policies.contains_key(&record_type) {
            return Err(ConfigurationError::DuplicatePolicy { record_type });
        }

        let mut policy = PolicyConfig::new(
            schema,
            Arc::clone(&self.config),
            Arc::clone(&self.strategies),
        );
        declare(&mut policy)?;

        log_success!(
            codes::success::POLICY_REGISTERED,
            "Anonymisation policy registered",
            "record_type" => record_type,
            "strategy" => policy
                .strategy_kind()
                .map(|kind| kind.to_string())
                .unwrap_or_else(|| "undefined".to_string())
        );

        self.policies.insert(record_type, policy);
        Ok(())
    }

    pub fn policy(&self, record_type: &str) -> Result<&PolicyConfig, AnonymiserError> {
        self.policies
            .get(record_type)
            .ok_or_else(|| AnonymiserError::NotAnonymisable {
                record_type: record_type.to_string(),
            })
    }

    pub fn is_anonymisable(&self, record_type: &str) -> bool {
        self.policies.contains_key(record_type)
    }

    pub fn apply(&self, record: &mut dyn Record) -> Result<AnonymisationResult, AnonymiserError> {
        let policy = self.policy(record.record_type())?;
        policy.apply(record)
    }

    pub fn apply_for_subject(
        &self,
        record_type: &str,
        subject: &str,
        subject_id: &str,
    ) -> Result<Vec<AnonymisationResult>, AnonymiserError> {
        self.policy(record_type)?
            .apply_for_subject(subject, subject_id)
    }

    pub fn is_anonymised(&self, record: &dyn Record) -> Result<bool, AnonymiserError> {
        self.policy(record.record_type())?.is_anonymised(record)
    }

    /// Configured record types in sorted order
    pub fn record_types(&self) -> Vec<&str> {
        self.policies.keys().map(String::as_str).collect()
    }

    /// Every policy that is undefined or incomplete
    pub fn validate_all(&self) -> Vec<PolicyValidationFailure> {
        let failures: Vec<PolicyValidationFailure> = self
            .policies
            .iter()
            .filter_map(|(record_type, policy)| {
                policy.validate().err().map(|error| PolicyValidationFailure {
                    record_type: record_type.clone(),
                    code: error.code().as_str().to_string(),
                    message: error.user_message(),
                })
            })
            .collect();

        if failures.is_empty() {
            log_success!(
                codes::success::VALIDATION_PASSED,
                "All anonymisation policies are complete",
                "record_types" => self.policies.len()
            );
        }

        failures
    }
}
