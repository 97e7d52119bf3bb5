//! # Policy Files
//!
//! TOML declaration of anonymisation policies for the CLI:
//!
//! ```toml
//! [[record_type]]
//! name = "User"
//! fields = ["id", "email", "first_name", "company", "exempt", "anonymised_at"]
//! ignore = ["company"]
//! skip_if_field = "exempt"
//! selectors = ["id"]
//!
//! [record_type.strategies]
//! email = "email"
//! first_name = "hex:12"
//! exempt = "no_op"
//!
//! [[record_type]]
//! name = "Session"
//! fields = ["id", "user_id", "token"]
//! destroy = true
//! selectors = ["user_id"]
//! ```
//!
//! Strategy names resolve through the engine's named strategies, plus `hex`
//! and `hex:<length>`. A selector key names the field compared against the
//! subject id.

use crate::error::CliError;
use crate::store::JsonRecordStore;
use anonymiser_engine::policy::{FieldStrategyBuilder, PolicyConfig, PolicyRegistry};
use anonymiser_engine::strategies::ConfigurationError;
use anonymiser_engine::types::{FieldValue, Record, RecordSchema};
use anonymiser_engine::AnonymiserConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyFile {
    #[serde(default, rename = "record_type")]
    pub record_types: Vec<RecordTypePolicy>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordTypePolicy {
    pub name: String,

    /// Persisted fields of the record type
    pub fields: Vec<String>,

    #[serde(default)]
    pub destroy: bool,

    /// Field name to strategy name
    #[serde(default)]
    pub strategies: BTreeMap<String, String>,

    #[serde(default)]
    pub ignore: Vec<String>,

    /// Records whose field is truthy are skipped
    pub skip_if_field: Option<String>,

    #[serde(default)]
    pub selectors: Vec<String>,
}

impl PolicyFile {
    pub fn from_toml_str(source: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, CliError> {
        let source = std::fs::read_to_string(path).map_err(|e| CliError::io(path, e))?;
        Self::from_toml_str(&source)
    }

    /// Declare every policy in a fresh registry; selectors query `store`
    pub fn build(
        &self,
        config: AnonymiserConfig,
        store: &JsonRecordStore,
    ) -> Result<PolicyRegistry, CliError> {
        let mut registry = PolicyRegistry::new(config);

        for policy in &self.record_types {
            policy.check()?;
            registry.anonymise(
                RecordSchema::new(policy.name.clone(), policy.fields.iter().cloned()),
                |declared| policy.declare(declared, store),
            )?;
        }

        Ok(registry)
    }
}

impl RecordTypePolicy {
    fn check(&self) -> Result<(), CliError> {
        if self.destroy && !(self.strategies.is_empty() && self.ignore.is_empty()) {
            return Err(CliError::InvalidPolicy {
                record_type: self.name.clone(),
                reason: "destroy cannot be combined with strategies or ignore".to_string(),
            });
        }
        Ok(())
    }

    fn declare(
        &self,
        policy: &mut PolicyConfig,
        store: &JsonRecordStore,
    ) -> Result<(), ConfigurationError> {
        if self.destroy {
            policy.destroy()?;
        } else {
            policy.fields(|builder| self.declare_fields(builder))?;
        }

        if let Some(field) = &self.skip_if_field {
            let field = field.clone();
            policy.skip_if(move |record| {
                record
                    .get_field(&field)
                    .map(|value| is_truthy(&value))
                    .unwrap_or(false)
            })?;
        }

        if !self.selectors.is_empty() {
            policy.selectors(|selectors| {
                for key in &self.selectors {
                    let store = store.clone();
                    let record_type = self.name.clone();
                    let field = key.clone();
                    selectors.for_subject(key.clone(), move |subject_id| {
                        Ok(store
                            .find_by_field(&record_type, &field, subject_id)
                            .into_iter()
                            .map(|record| Box::new(record) as Box<dyn Record>)
                            .collect())
                    });
                }
            });
        }

        Ok(())
    }

    fn declare_fields(&self, builder: &mut FieldStrategyBuilder) -> Result<(), ConfigurationError> {
        // One builder call per strategy name
        let mut by_strategy: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (field, strategy) in &self.strategies {
            by_strategy
                .entry(strategy.as_str())
                .or_default()
                .push(field.as_str());
        }

        for (strategy, fields) in by_strategy {
            assign_named(builder, strategy, fields)?;
        }

        if !self.ignore.is_empty() {
            builder.ignore(self.ignore.iter().cloned())?;
        }

        Ok(())
    }
}

fn assign_named(
    builder: &mut FieldStrategyBuilder,
    strategy: &str,
    fields: Vec<&str>,
) -> Result<(), ConfigurationError> {
    match strategy.split_once(':') {
        None if strategy == "hex" => builder.hex(fields)?,
        Some(("hex", length)) => {
            let length = length
                .parse()
                .map_err(|_| ConfigurationError::UnknownStrategy {
                    name: strategy.to_string(),
                })?;
            builder.hex_with_length(fields, length)?
        }
        _ => builder.strategy(strategy, fields)?,
    };
    Ok(())
}

fn is_truthy(value: &FieldValue) -> bool {
    match value {
        FieldValue::Null => false,
        FieldValue::Bool(b) => *b,
        FieldValue::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        FieldValue::String(s) => !s.is_empty(),
        FieldValue::Array(a) => !a.is_empty(),
        FieldValue::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anonymiser_engine::api::AnonymiserError;
    use anonymiser_engine::policy::StrategyKind;
    use assert_matches::assert_matches;
    use serde_json::json;

    const POLICY: &str = r#"
        [[record_type]]
        name = "User"
        fields = ["id", "email", "first_name", "company", "exempt", "anonymised_at"]
        ignore = ["company"]
        skip_if_field = "exempt"
        selectors = ["id"]

        [record_type.strategies]
        email = "email"
        first_name = "hex:12"
        exempt = "no_op"

        [[record_type]]
        name = "Session"
        fields = ["id", "user_id", "token"]
        destroy = true
        selectors = ["user_id"]
    "#;

    fn store() -> JsonRecordStore {
        JsonRecordStore::from_value(json!({
            "User": [
                { "id": 1, "email": "will@example.org", "first_name": "Will",
                  "company": "Acme", "exempt": false, "anonymised_at": null },
                { "id": 2, "email": "ann@example.org", "first_name": "Ann",
                  "company": "Acme", "exempt": true, "anonymised_at": null }
            ],
            "Session": [
                { "id": "s1", "user_id": 1, "token": "t1" },
                { "id": "s2", "user_id": 2, "token": "t2" }
            ]
        }))
        .expect("valid store")
    }

    fn registry(store: &JsonRecordStore) -> PolicyRegistry {
        PolicyFile::from_toml_str(POLICY)
            .expect("parsed")
            .build(AnonymiserConfig::new().ignore_field("id"), store)
            .expect("built")
    }

    #[test]
    fn test_parse() {
        let file = PolicyFile::from_toml_str(POLICY).expect("parsed");

        assert_eq!(file.record_types.len(), 2);
        assert_eq!(file.record_types[0].strategies["first_name"], "hex:12");
        assert!(file.record_types[1].destroy);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let source = r#"
            [[record_type]]
            name = "User"
            fields = []
            destory = true
        "#;
        assert_matches!(PolicyFile::from_toml_str(source), Err(CliError::PolicyParse(_)));
    }

    #[test]
    fn test_build_declares_policies() {
        let store = store();
        let policies = registry(&store);

        assert_eq!(policies.record_types(), vec!["Session", "User"]);
        assert!(policies.validate_all().is_empty());

        let user = policies.policy("User").expect("declared");
        assert_eq!(user.strategy_kind(), Some(StrategyKind::Fields));
        assert!(user.has_skip_filter());
        assert_eq!(
            user.field_strategies().map(|f| f.configured_fields()),
            Some(vec!["company", "email", "exempt", "first_name"])
        );
    }

    #[test]
    fn test_apply_through_store() {
        let store = store();
        let policies = registry(&store);

        let results: Vec<_> = store
            .records("User")
            .into_iter()
            .map(|mut record| policies.apply(&mut record).expect("applied"))
            .collect();

        assert!(results[0].is_overwritten());
        assert!(results[1].is_skipped());

        let users = store.to_value();
        let first_name = users["User"][0]["first_name"].as_str().expect("hex");
        assert_eq!(first_name.len(), 12);
        assert_eq!(users["User"][0]["company"], json!("Acme"));
        assert!(users["User"][0]["anonymised_at"].is_string());
        assert_eq!(users["User"][1]["first_name"], json!("Ann"));
    }

    #[test]
    fn test_selectors_query_store() {
        let store = store();
        let policies = registry(&store);

        let results = policies
            .apply_for_subject("Session", "user_id", "2")
            .expect("applied");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record().id, "s2");
        assert_eq!(store.live_count("Session"), 1);
    }

    #[test]
    fn test_incomplete_policy_reported() {
        let source = r#"
            [[record_type]]
            name = "User"
            fields = ["id", "email", "phone"]

            [record_type.strategies]
            email = "email"
        "#;
        let policies = PolicyFile::from_toml_str(source)
            .expect("parsed")
            .build(AnonymiserConfig::new().ignore_field("id"), &JsonRecordStore::default())
            .expect("built");

        let failures = policies.validate_all();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message.contains("phone"));
    }

    #[test]
    fn test_destroy_with_strategies_rejected() {
        let source = r#"
            [[record_type]]
            name = "Session"
            fields = ["token"]
            destroy = true

            [record_type.strategies]
            token = "nilable"
        "#;
        let built = PolicyFile::from_toml_str(source)
            .expect("parsed")
            .build(AnonymiserConfig::new(), &JsonRecordStore::default());

        assert_matches!(built, Err(CliError::InvalidPolicy { record_type, .. }) if record_type == "Session");
    }

    #[test]
    fn test_bad_strategy_names() {
        for name in ["shred", "hex:twelve"] {
            let source = format!(
                "[[record_type]]\nname = \"User\"\nfields = [\"email\"]\n[record_type.strategies]\nemail = \"{}\"\n",
                name
            );
            let built = PolicyFile::from_toml_str(&source)
                .expect("parsed")
                .build(AnonymiserConfig::new(), &JsonRecordStore::default());

            assert_matches!(
                built,
                Err(CliError::Anonymiser(AnonymiserError::Configuration(
                    ConfigurationError::UnknownStrategy { .. }
                )))
            );
        }
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("yes")));
        assert!(is_truthy(&json!([0])));
    }
}
