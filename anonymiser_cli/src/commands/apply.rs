//! `apply` subcommand
//!
//! Loads the record file, declares the policies and anonymises either every
//! record of every configured type or only the records a subject selector
//! finds. The record file is rewritten afterwards (or `output` is written).

use crate::error::CliError;
use crate::policy_file::PolicyFile;
use crate::store::JsonRecordStore;
use anonymiser_core::logging::codes;
use anonymiser_core::{log_error, log_info, log_warning};
use anonymiser_engine::policy::{PolicyRegistry, StrategyKind};
use anonymiser_engine::results::{AnonymisationResult, ResultSummary};
use anonymiser_engine::strategies::ConfigurationError;
use anonymiser_engine::types::Record;
use anonymiser_engine::AnonymiserConfig;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ApplyOptions {
    pub policy: PathBuf,
    pub records: PathBuf,
    /// Subject key and id; restricts the run to selector matches
    pub subject: Option<(String, String)>,
    pub output: Option<PathBuf>,
    pub validate_only: bool,
}

#[derive(Debug, Serialize)]
pub struct ApplyReport {
    pub summary: ResultSummary,
    pub results: Vec<AnonymisationResult>,
    /// Record types in the file without a policy
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unconfigured: Vec<String>,
}

pub fn run(options: &ApplyOptions, config: AnonymiserConfig) -> Result<ApplyReport, CliError> {
    let store = JsonRecordStore::load(&options.records)?;
    let policies = PolicyFile::from_file(&options.policy)?.build(config, &store)?;

    let failures = policies.validate_all();
    if !failures.is_empty() {
        for failure in &failures {
            log_error!(
                codes::validation::UNHANDLED_FIELDS,
                "Refusing to apply incomplete policy",
                "record_type" => failure.record_type,
                "reason" => failure.message
            );
        }
        return Err(CliError::IncompletePolicies {
            count: failures.len(),
        });
    }

    check_declared_fields(&policies, &store)?;

    if options.validate_only {
        return Ok(ApplyReport {
            summary: ResultSummary::default(),
            results: Vec::new(),
            unconfigured: unconfigured(&policies, &store),
        });
    }

    let results = match &options.subject {
        Some((subject, subject_id)) => apply_for_subject(&policies, subject, subject_id)?,
        None => apply_all(&policies, &store)?,
    };

    let target = options.output.as_ref().unwrap_or(&options.records);
    store.write(target)?;

    let summary = ResultSummary::from_results(&results);
    log_info!(
        "Anonymisation run finished",
        "records" => summary.total(),
        "failed" => summary.failed,
        "output" => target.display()
    );

    Ok(ApplyReport {
        summary,
        results,
        unconfigured: unconfigured(&policies, &store),
    })
}

/// Overwrite policies only cover the fields they declare, so a stored column
/// outside the declaration would be written back untouched
fn check_declared_fields(policies: &PolicyRegistry, store: &JsonRecordStore) -> Result<(), CliError> {
    for record_type in policies.record_types() {
        let policy = policies.policy(record_type)?;
        if policy.strategy_kind() != Some(StrategyKind::Fields) {
            continue;
        }

        let undeclared: BTreeSet<String> = store
            .records(record_type)
            .iter()
            .flat_map(|record| record.persisted_field_names())
            .filter(|field| !policy.schema().has_field(field))
            .collect();

        if !undeclared.is_empty() {
            let fields: Vec<String> = undeclared.into_iter().collect();
            log_error!(
                codes::validation::UNHANDLED_FIELDS,
                "Stored records carry fields missing from the policy",
                "record_type" => record_type,
                "fields" => fields.join(",")
            );
            return Err(CliError::UndeclaredFields {
                record_type: record_type.to_string(),
                fields,
            });
        }
    }

    Ok(())
}

fn unconfigured(policies: &PolicyRegistry, store: &JsonRecordStore) -> Vec<String> {
    store
        .record_types()
        .into_iter()
        .filter(|record_type| !policies.is_anonymisable(record_type))
        .collect()
}

fn apply_all(
    policies: &PolicyRegistry,
    store: &JsonRecordStore,
) -> Result<Vec<AnonymisationResult>, CliError> {
    let mut results = Vec::new();

    for record_type in store.record_types() {
        if !policies.is_anonymisable(&record_type) {
            log_warning!("No policy for record type, left untouched", "record_type" => record_type);
            continue;
        }

        for mut record in store.records(&record_type) {
            results.push(policies.apply(&mut record)?);
        }
    }

    Ok(results)
}

/// Run the subject selector of every record type that declares one
fn apply_for_subject(
    policies: &PolicyRegistry,
    subject: &str,
    subject_id: &str,
) -> Result<Vec<AnonymisationResult>, CliError> {
    let record_types: Vec<&str> = policies
        .record_types()
        .into_iter()
        .filter(|record_type| {
            policies
                .policy(record_type)
                .ok()
                .and_then(|policy| policy.selector_registry())
                .is_some_and(|selectors| selectors.has_subject(subject))
        })
        .collect();

    if record_types.is_empty() {
        return Err(ConfigurationError::SelectorNotFound {
            subject: subject.to_string(),
            record_type: "any record type".to_string(),
        }
        .into());
    }

    let mut results = Vec::new();
    for record_type in record_types {
        results.extend(policies.apply_for_subject(record_type, subject, subject_id)?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::{json, Value};
    use std::path::Path;

    const POLICY: &str = r#"
        [[record_type]]
        name = "User"
        fields = ["id", "email", "name", "anonymised_at"]
        selectors = ["id"]

        [record_type.strategies]
        email = "email"
        name = "nilable"

        [[record_type]]
        name = "Order"
        fields = ["id", "user_id", "total"]
        destroy = true
        selectors = ["user_id"]
    "#;

    struct Workspace {
        _dir: tempfile::TempDir,
        policy: PathBuf,
        records: PathBuf,
    }

    fn workspace(policy: &str) -> Workspace {
        let dir = tempfile::tempdir().expect("tempdir");
        let policy_path = dir.path().join("policy.toml");
        let records_path = dir.path().join("records.json");

        std::fs::write(&policy_path, policy).expect("policy written");
        std::fs::write(
            &records_path,
            json!({
                "User": [
                    { "id": 1, "email": "will@example.org", "name": "Will", "anonymised_at": null },
                    { "id": 2, "email": "ann@example.org", "name": "Ann", "anonymised_at": null }
                ],
                "Order": [
                    { "id": 10, "user_id": 1, "total": 5 },
                    { "id": 11, "user_id": 2, "total": 7 }
                ],
                "AuditEntry": [{ "id": 1 }]
            })
            .to_string(),
        )
        .expect("records written");

        Workspace {
            _dir: dir,
            policy: policy_path,
            records: records_path,
        }
    }

    fn options(workspace: &Workspace) -> ApplyOptions {
        ApplyOptions {
            policy: workspace.policy.clone(),
            records: workspace.records.clone(),
            subject: None,
            output: None,
            validate_only: false,
        }
    }

    fn config() -> AnonymiserConfig {
        AnonymiserConfig::new().ignore_field("id")
    }

    fn read(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).expect("readable")).expect("json")
    }

    #[test]
    fn test_apply_all_rewrites_file() {
        let workspace = workspace(POLICY);
        let report = run(&options(&workspace), config()).expect("applied");

        assert_eq!(report.summary.overwritten, 2);
        assert_eq!(report.summary.destroyed, 2);
        assert_eq!(report.unconfigured, vec!["AuditEntry"]);

        let records = read(&workspace.records);
        assert_eq!(records["Order"], json!([]));
        assert_eq!(records["User"][0]["name"], json!(null));
        assert!(records["User"][1]["anonymised_at"].is_string());
        assert_eq!(records["AuditEntry"], json!([{ "id": 1 }]));
    }

    #[test]
    fn test_apply_for_subject_touches_only_matches() {
        let workspace = workspace(POLICY);
        let output = workspace.records.with_file_name("out.json");
        let options = ApplyOptions {
            subject: Some(("user_id".to_string(), "2".to_string())),
            output: Some(output.clone()),
            ..options(&workspace)
        };

        let report = run(&options, config()).expect("applied");

        assert_eq!(report.summary.destroyed, 1);
        assert_eq!(report.summary.total(), 1);
        assert_eq!(read(&output)["Order"], json!([{ "id": 10, "user_id": 1, "total": 5 }]));
        assert_eq!(read(&workspace.records)["Order"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_unknown_subject() {
        let workspace = workspace(POLICY);
        let options = ApplyOptions {
            subject: Some(("device_id".to_string(), "1".to_string())),
            ..options(&workspace)
        };

        assert_matches!(run(&options, config()), Err(CliError::Anonymiser(_)));
    }

    #[test]
    fn test_incomplete_policy_blocks_apply() {
        let workspace = workspace(
            r#"
            [[record_type]]
            name = "User"
            fields = ["id", "email", "name"]

            [record_type.strategies]
            email = "email"
            "#,
        );

        assert_matches!(
            run(&options(&workspace), config()),
            Err(CliError::IncompletePolicies { count: 1 })
        );
        assert_eq!(read(&workspace.records)["User"][0]["name"], json!("Will"));
    }

    #[test]
    fn test_undeclared_column_blocks_apply() {
        let workspace = workspace(POLICY);
        std::fs::write(
            &workspace.records,
            json!({
                "User": [
                    { "id": 1, "email": "will@example.org", "name": "Will",
                      "anonymised_at": null, "ssn": "123-45-6789" }
                ],
                "Order": [{ "id": 10, "user_id": 1, "total": 5, "note": "gift" }]
            })
            .to_string(),
        )
        .expect("records written");

        let error = run(&options(&workspace), config()).expect_err("undeclared column");

        assert_matches!(
            &error,
            CliError::UndeclaredFields { record_type, fields }
                if record_type == "User" && fields == &vec!["ssn".to_string()]
        );
        assert_eq!(error.exit_code(), 2);
        assert_eq!(read(&workspace.records)["User"][0]["ssn"], json!("123-45-6789"));
        assert_eq!(read(&workspace.records)["Order"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_undeclared_column_reported_by_validate_only() {
        let workspace = workspace(POLICY);
        std::fs::write(
            &workspace.records,
            json!({ "User": [{ "id": 1, "email": "a@example.org", "name": "A", "ssn": "1" }] })
                .to_string(),
        )
        .expect("records written");
        let options = ApplyOptions {
            validate_only: true,
            ..options(&workspace)
        };

        assert_matches!(run(&options, config()), Err(CliError::UndeclaredFields { .. }));
    }

    #[test]
    fn test_validate_only_leaves_records() {
        let workspace = workspace(POLICY);
        let options = ApplyOptions {
            validate_only: true,
            ..options(&workspace)
        };

        let report = run(&options, config()).expect("validated");

        assert_eq!(report.summary.total(), 0);
        assert_eq!(read(&workspace.records)["User"][0]["name"], json!("Will"));
    }

    #[test]
    fn test_report_serializes() {
        let workspace = workspace(POLICY);
        let report = run(&options(&workspace), config()).expect("applied");
        let value = serde_json::to_value(&report).expect("serialize");

        assert_eq!(value["summary"]["destroyed"], 2);
        assert_eq!(value["results"].as_array().map(Vec::len), Some(4));
        assert_eq!(value["unconfigured"], json!(["AuditEntry"]));
    }
}
