//! Event codes and their classification metadata
//!
//! Every coded log event raised by the engine has an entry here. Codes are
//! grouped by the phase that raises them: configuration of a policy,
//! completeness validation, applying a policy to a record, and the
//! persistence collaborator underneath.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for an event code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

const fn meta(
    code: &'static str,
    category: &'static str,
    severity: Severity,
    recoverable: bool,
    description: &'static str,
    recommended_action: &'static str,
) -> ErrorMetadata {
    ErrorMetadata {
        code,
        category,
        severity,
        recoverable,
        description,
        recommended_action,
    }
}

pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

/// Raised while a policy is being declared
pub mod configuration {
    use super::Code;

    pub const DUPLICATE_STRATEGY: Code = Code::new("E010");
    pub const STRATEGY_ALREADY_DEFINED: Code = Code::new("E011");
    pub const MISSING_FIELDS: Code = Code::new("E012");
    pub const UNKNOWN_STRATEGY: Code = Code::new("E013");
    pub const PROTECTED_STRATEGY_NAME: Code = Code::new("E014");
    pub const ALREADY_GLOBALLY_IGNORED: Code = Code::new("E015");
    pub const SELECTOR_NOT_FOUND: Code = Code::new("E016");
    pub const SKIP_FILTER_ALREADY_DEFINED: Code = Code::new("E017");
    pub const UNDEFINED_STRATEGY: Code = Code::new("E018");
    pub const DUPLICATE_POLICY: Code = Code::new("E019");
    pub const INVALID_IGNORE_PATTERN: Code = Code::new("E020");
    pub const INVALID_HEX_LENGTH: Code = Code::new("E021");
}

pub mod validation {
    use super::Code;

    pub const UNHANDLED_FIELDS: Code = Code::new("E030");
}

/// Failures reported by the record collaborator
pub mod persistence {
    use super::Code;

    pub const WRITE_REJECTED: Code = Code::new("E040");
    pub const SAVE_FAILED: Code = Code::new("E041");
    pub const DELETE_FAILED: Code = Code::new("E042");
    pub const QUERY_FAILED: Code = Code::new("E043");
}

pub mod apply {
    use super::Code;

    pub const NOT_ANONYMISABLE: Code = Code::new("E050");
    pub const ANONYMISATION_NOT_KNOWN: Code = Code::new("E051");
}

pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");
    pub const POLICY_REGISTERED: Code = Code::new("I010");
    pub const VALIDATION_PASSED: Code = Code::new("I011");
    pub const RECORD_OVERWRITTEN: Code = Code::new("I020");
    pub const RECORD_DESTROYED: Code = Code::new("I021");
    pub const RECORD_SKIPPED: Code = Code::new("I022");
    pub const SUBJECT_APPLY_COMPLETED: Code = Code::new("I023");
    pub const STRATEGY_REGISTERED: Code = Code::new("I030");
}

const METADATA: &[ErrorMetadata] = &[
    meta(
        "ERR001",
        "System",
        Severity::Critical,
        false,
        "Critical internal error",
        "File a bug report with the logged context",
    ),
    meta(
        "ERR002",
        "System",
        Severity::Critical,
        false,
        "Initialization failure",
        "Check runtime configuration and environment variables",
    ),
    meta(
        "E010",
        "Configuration",
        Severity::High,
        false,
        "Field assigned more than one strategy",
        "Remove the duplicate field from one of the strategy declarations",
    ),
    meta(
        "E011",
        "Configuration",
        Severity::High,
        false,
        "Policy strategy already defined",
        "Declare either destroy or fields once per record type",
    ),
    meta(
        "E012",
        "Configuration",
        Severity::High,
        false,
        "Strategy declared without any fields",
        "Name at least one field for the strategy",
    ),
    meta(
        "E013",
        "Configuration",
        Severity::High,
        false,
        "Strategy name is not registered",
        "Register the strategy before referring to it by name",
    ),
    meta(
        "E014",
        "Configuration",
        Severity::High,
        false,
        "Strategy name collides with a builder method",
        "Pick a different strategy name",
    ),
    meta(
        "E015",
        "Configuration",
        Severity::Medium,
        false,
        "Field is already ignored globally",
        "Drop the field from the local ignore declaration",
    ),
    meta(
        "E016",
        "Configuration",
        Severity::Medium,
        true,
        "No selector registered for subject",
        "Declare a selector for the subject on the record type",
    ),
    meta(
        "E017",
        "Configuration",
        Severity::High,
        false,
        "Skip filter already defined",
        "Combine the conditions into a single skip filter",
    ),
    meta(
        "E018",
        "Configuration",
        Severity::High,
        false,
        "Policy has neither destroy nor fields strategy",
        "Declare destroy or fields for the record type",
    ),
    meta(
        "E019",
        "Configuration",
        Severity::High,
        false,
        "Record type already has a policy",
        "Declare one policy per record type",
    ),
    meta(
        "E020",
        "Configuration",
        Severity::High,
        false,
        "Ignore pattern is not a valid regular expression",
        "Fix the pattern syntax",
    ),
    meta(
        "E021",
        "Configuration",
        Severity::High,
        false,
        "Hex strategy length out of range",
        "Request a length between 1 and the configured maximum",
    ),
    meta(
        "E030",
        "Validation",
        Severity::High,
        false,
        "Persisted fields have no strategy",
        "Assign a strategy to each listed field or ignore it",
    ),
    meta(
        "E040",
        "Persistence",
        Severity::Medium,
        true,
        "Record rejected a field write",
        "Check the strategy output type for the field",
    ),
    meta(
        "E041",
        "Persistence",
        Severity::Medium,
        true,
        "Record save failed",
        "Retry once the store is reachable",
    ),
    meta(
        "E042",
        "Persistence",
        Severity::Medium,
        true,
        "Record delete failed",
        "Retry once the store is reachable",
    ),
    meta(
        "E043",
        "Persistence",
        Severity::Medium,
        true,
        "Selector query failed",
        "Check the selector query and store connectivity",
    ),
    meta(
        "E050",
        "Apply",
        Severity::High,
        false,
        "Record type has no anonymisation policy",
        "Declare a policy for the record type",
    ),
    meta(
        "E051",
        "Apply",
        Severity::Low,
        true,
        "Record type has no marker field",
        "Add the marker field to the record type schema",
    ),
    meta(
        "I004",
        "System",
        Severity::Low,
        true,
        "Logging initialized",
        "None",
    ),
    meta(
        "I010",
        "Configuration",
        Severity::Low,
        true,
        "Policy registered for record type",
        "None",
    ),
    meta(
        "I011",
        "Validation",
        Severity::Low,
        true,
        "Policy covers every persisted field",
        "None",
    ),
    meta("I020", "Apply", Severity::Low, true, "Record overwritten", "None"),
    meta("I021", "Apply", Severity::Low, true, "Record destroyed", "None"),
    meta(
        "I022",
        "Apply",
        Severity::Low,
        true,
        "Record skipped by filter",
        "None",
    ),
    meta(
        "I023",
        "Apply",
        Severity::Low,
        true,
        "Subject records processed",
        "None",
    ),
    meta(
        "I030",
        "Configuration",
        Severity::Low,
        true,
        "Named strategy registered",
        "None",
    ),
];

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, &'static ErrorMetadata>> = OnceLock::new();

fn get_error_registry() -> &'static HashMap<&'static str, &'static ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| METADATA.iter().map(|m| (m.code, m)).collect())
}

pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code).copied()
}

/// Get severity from code; unknown codes are treated as Medium
pub fn get_severity(code: &str) -> Severity {
    get_error_metadata(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

pub fn is_recoverable(code: &str) -> bool {
    get_error_metadata(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

pub fn get_description(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

pub fn get_action(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

pub fn get_category(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}
