//! # Anonymiser Configuration
//!
//! Immutable settings shared by every policy: which fields are ignored
//! globally, the marker field name, and the parameters of the built-in
//! strategies. Build it once at startup, wrap it in an `Arc` and hand it to
//! the [`PolicyRegistry`](crate::policy::PolicyRegistry).

use crate::strategies::errors::ConfigurationError;
use anonymiser_core::config::compile_time::{schema, strategies};
use anonymiser_core::EngineSettings;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Decides whether a field is exempt from completeness checks everywhere
#[derive(Clone)]
pub enum IgnoreRule {
    Exact(String),
    Pattern(Regex),
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl IgnoreRule {
    pub fn matches(&self, field: &str) -> bool {
        match self {
            IgnoreRule::Exact(name) => name == field,
            IgnoreRule::Pattern(regex) => regex.is_match(field),
            IgnoreRule::Predicate(predicate) => predicate(field),
        }
    }
}

impl fmt::Debug for IgnoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreRule::Exact(name) => f.debug_tuple("Exact").field(name).finish(),
            IgnoreRule::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            IgnoreRule::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnonymiserConfig {
    ignore_rules: Vec<IgnoreRule>,
    marker_field: String,
    email_template: String,
    phone_number: String,
    validate_before_apply: bool,
}

impl Default for AnonymiserConfig {
    fn default() -> Self {
        Self {
            ignore_rules: Vec::new(),
            marker_field: schema::DEFAULT_MARKER_FIELD.to_string(),
            email_template: strategies::DEFAULT_EMAIL_TEMPLATE.to_string(),
            phone_number: strategies::DEFAULT_PHONE_NUMBER.to_string(),
            validate_before_apply: true,
        }
    }
}

impl AnonymiserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from runtime settings, compiling ignore patterns
    pub fn from_settings(settings: &EngineSettings) -> Result<Self, ConfigurationError> {
        let mut config = Self::default()
            .with_marker_field(settings.marker_field.clone())
            .with_email_template(settings.email_template.clone())
            .with_phone_number(settings.phone_number.clone())
            .with_validate_before_apply(settings.validate_before_apply)
            .ignore_fields(settings.ignored_fields.iter().cloned());

        for pattern in &settings.ignored_patterns {
            config = config.ignore_pattern(pattern)?;
        }

        Ok(config)
    }

    pub fn ignore_field(mut self, field: impl Into<String>) -> Self {
        self.ignore_rules.push(IgnoreRule::Exact(field.into()));
        self
    }

    pub fn ignore_fields<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        fields
            .into_iter()
            .fold(self, |config, field| config.ignore_field(field))
    }

    pub fn ignore_pattern(mut self, pattern: &str) -> Result<Self, ConfigurationError> {
        let regex = Regex::new(pattern).map_err(|e| ConfigurationError::InvalidIgnorePattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        self.ignore_rules.push(IgnoreRule::Pattern(regex));
        Ok(self)
    }

    pub fn ignore_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.ignore_rules
            .push(IgnoreRule::Predicate(Arc::new(predicate)));
        self
    }

    pub fn with_marker_field(mut self, field: impl Into<String>) -> Self {
        self.marker_field = field.into();
        self
    }

    pub fn with_email_template(mut self, template: impl Into<String>) -> Self {
        self.email_template = template.into();
        self
    }

    pub fn with_phone_number(mut self, number: impl Into<String>) -> Self {
        self.phone_number = number.into();
        self
    }

    pub fn with_validate_before_apply(mut self, enabled: bool) -> Self {
        self.validate_before_apply = enabled;
        self
    }

    pub fn is_ignored(&self, field: &str) -> bool {
        self.ignore_rules.iter().any(|rule| rule.matches(field))
    }

    pub fn ignore_rules(&self) -> &[IgnoreRule] {
        &self.ignore_rules
    }

    pub fn marker_field(&self) -> &str {
        &self.marker_field
    }

    pub fn email_template(&self) -> &str {
        &self.email_template
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn validate_before_apply(&self) -> bool {
        self.validate_before_apply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_defaults() {
        let config = AnonymiserConfig::default();

        assert_eq!(config.marker_field(), "anonymised_at");
        assert_eq!(config.email_template(), "anonymous+{}@example.com");
        assert_eq!(config.phone_number(), "+1 617 555 1294");
        assert!(config.validate_before_apply());
        assert!(!config.is_ignored("id"));
    }

    #[test]
    fn test_ignore_rules_of_every_kind() {
        let config = AnonymiserConfig::new()
            .ignore_field("id")
            .ignore_pattern("_at$")
            .expect("valid pattern")
            .ignore_if(|field| field.starts_with("legacy_"));

        assert!(config.is_ignored("id"));
        assert!(config.is_ignored("created_at"));
        assert!(config.is_ignored("legacy_code"));
        assert!(!config.is_ignored("email"));
        assert!(!config.is_ignored("identity"));
        assert_eq!(config.ignore_rules().len(), 3);
    }

    #[test]
    fn test_invalid_pattern() {
        assert_matches!(
            AnonymiserConfig::new().ignore_pattern("(unclosed"),
            Err(ConfigurationError::InvalidIgnorePattern { pattern, .. }) if pattern == "(unclosed"
        );
    }

    #[test]
    fn test_from_settings() {
        let settings = EngineSettings {
            marker_field: "scrubbed_at".to_string(),
            ignored_fields: vec!["id".to_string()],
            ignored_patterns: vec!["^audit_".to_string()],
            email_template: "gone+{}@example.org".to_string(),
            phone_number: "000".to_string(),
            validate_before_apply: false,
        };

        let config = AnonymiserConfig::from_settings(&settings).expect("valid settings");

        assert_eq!(config.marker_field(), "scrubbed_at");
        assert!(config.is_ignored("id"));
        assert!(config.is_ignored("audit_trail"));
        assert_eq!(config.email_template(), "gone+{}@example.org");
        assert_eq!(config.phone_number(), "000");
        assert!(!config.validate_before_apply());
    }

    #[test]
    fn test_from_settings_rejects_bad_pattern() {
        let settings = EngineSettings {
            ignored_patterns: vec!["[".to_string()],
            ..EngineSettings::default()
        };

        assert_matches!(
            AnonymiserConfig::from_settings(&settings),
            Err(ConfigurationError::InvalidIgnorePattern { .. })
        );
    }

    #[test]
    fn test_debug_hides_predicate() {
        let config = AnonymiserConfig::new().ignore_if(|_| true);
        assert!(format!("{:?}", config).contains("Predicate(..)"));
    }
}
