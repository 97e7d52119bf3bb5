use crate::error::CliError;
use crate::policy_file::PolicyFile;
use crate::store::JsonRecordStore;
use anonymiser_core::log_error;
use anonymiser_core::logging::codes;
use anonymiser_engine::policy::PolicyValidationFailure;
use anonymiser_engine::AnonymiserConfig;
use std::path::Path;

/// Check every policy in `policy` for completeness
///
/// Declaration errors are returned as `Err`; incomplete policies are listed.
pub fn run(policy: &Path, config: AnonymiserConfig) -> Result<Vec<PolicyValidationFailure>, CliError> {
    let policies = PolicyFile::from_file(policy)?.build(config, &JsonRecordStore::default())?;
    let failures = policies.validate_all();

    for failure in &failures {
        log_error!(
            codes::validation::UNHANDLED_FIELDS,
            "Incomplete anonymisation policy",
            "record_type" => failure.record_type,
            "code" => failure.code
        );
    }

    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_incomplete_policies() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("policy.toml");
        std::fs::write(
            &path,
            r#"
            [[record_type]]
            name = "Session"
            fields = ["token"]
            destroy = true

            [[record_type]]
            name = "User"
            fields = ["email", "phone"]

            [record_type.strategies]
            email = "email"
            "#,
        )
        .expect("written");

        let failures = run(&path, AnonymiserConfig::new()).expect("declared");

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].record_type, "User");
    }

    #[test]
    fn test_missing_policy_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = run(&dir.path().join("missing.toml"), AnonymiserConfig::new());

        assert!(matches!(result, Err(CliError::Io { .. })));
    }
}
