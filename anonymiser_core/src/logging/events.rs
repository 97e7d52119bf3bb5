//! Log events raised by the anonymiser

use super::codes::{self, Code};
use std::collections::BTreeMap;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Matching level of the `log` facade
    pub fn to_log_level(&self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
        }
    }
}

/// Identifies the record an event concerns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordContext {
    pub record_type: String,
    pub record_id: String,
}

impl RecordContext {
    pub fn new(record_type: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            record_id: record_id.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEvent {
    pub timestamp: SystemTime,
    pub level: LogLevel,
    pub code: Code,
    pub message: String,
    pub record: Option<RecordContext>,
    pub context: BTreeMap<String, String>,
}

impl LogEvent {
    fn new(level: LogLevel, code: Code, message: &str) -> Self {
        Self {
            timestamp: SystemTime::now(),
            level,
            code,
            message: message.to_string(),
            record: None,
            context: BTreeMap::new(),
        }
    }

    pub fn error(error_code: Code, message: &str) -> Self {
        Self::new(LogLevel::Error, error_code, message)
    }

    /// Uncoded warning
    pub fn warning(message: &str) -> Self {
        Self::new(LogLevel::Warning, Code::new("W000"), message)
    }

    /// Uncoded informational event
    pub fn info(message: &str) -> Self {
        Self::new(LogLevel::Info, Code::new("I000"), message)
    }

    /// Info event carrying a success code
    pub fn success(success_code: Code, message: &str) -> Self {
        Self::new(LogLevel::Info, success_code, message)
    }

    pub fn debug(message: &str) -> Self {
        Self::new(LogLevel::Debug, Code::new("D000"), message)
    }

    pub fn with_record(mut self, record: RecordContext) -> Self {
        self.record = Some(record);
        self
    }

    pub fn with_context(mut self, key: &str, value: &str) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == LogLevel::Error
    }

    pub fn is_warning(&self) -> bool {
        self.level == LogLevel::Warning
    }

    pub fn is_info(&self) -> bool {
        self.level == LogLevel::Info
    }

    pub fn is_debug(&self) -> bool {
        self.level == LogLevel::Debug
    }

    pub fn severity(&self) -> &'static str {
        codes::get_severity(self.code.as_str()).as_str()
    }

    pub fn category(&self) -> &'static str {
        codes::get_category(self.code.as_str())
    }

    pub fn description(&self) -> &'static str {
        codes::get_description(self.code.as_str())
    }

    pub fn recommended_action(&self) -> &'static str {
        codes::get_action(self.code.as_str())
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.code.as_str())
    }

    /// Single line suitable for console output
    pub fn format(&self) -> String {
        let record_str = self
            .record
            .as_ref()
            .map(|r| format!(" ({}#{})", r.record_type, r.record_id))
            .unwrap_or_default();

        let context_str = if self.context.is_empty() {
            String::new()
        } else {
            let pairs: Vec<String> = self
                .context
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            format!(" [{}]", pairs.join(", "))
        };

        format!(
            "[{}] {} - {}{}{}",
            self.level.as_str(),
            self.code.as_str(),
            self.message,
            record_str,
            context_str
        )
    }

    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        let timestamp = self
            .timestamp
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let mut json = serde_json::json!({
            "timestamp": timestamp,
            "level": self.level.as_str(),
            "code": self.code.as_str(),
            "message": self.message,
            "category": self.category(),
            "severity": self.severity(),
        });

        if self.is_error() {
            json["error_metadata"] = serde_json::json!({
                "recoverable": self.is_recoverable(),
                "description": self.description(),
                "recommended_action": self.recommended_action(),
            });
        }

        if let Some(record) = &self.record {
            json["record"] = serde_json::json!({
                "type": record.record_type,
                "id": record.record_id,
            });
        }

        if !self.context.is_empty() {
            json["context"] = serde_json::to_value(&self.context)?;
        }

        serde_json::to_string(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::codes;

    #[test]
    fn test_error_event_creation() {
        let event = LogEvent::error(codes::validation::UNHANDLED_FIELDS, "Unhandled fields");

        assert!(event.is_error());
        assert_eq!(event.code.as_str(), "E030");
        assert_eq!(event.category(), "Validation");
        assert!(!event.is_recoverable());
    }

    #[test]
    fn test_success_event_is_info() {
        let event = LogEvent::success(codes::success::RECORD_OVERWRITTEN, "Overwritten");
        assert!(event.is_info());
        assert_eq!(event.code.as_str(), "I020");
    }

    #[test]
    fn test_format_includes_record_and_context() {
        let event = LogEvent::error(codes::persistence::SAVE_FAILED, "Save failed")
            .with_record(RecordContext::new("User", "42"))
            .with_context("fields", "email");

        let formatted = event.format();
        assert_eq!(
            formatted,
            "[ERROR] E041 - Save failed (User#42) [fields=email]"
        );
    }

    #[test]
    fn test_uncoded_events() {
        assert_eq!(LogEvent::warning("w").code.as_str(), "W000");
        assert_eq!(LogEvent::info("i").code.as_str(), "I000");
        assert!(LogEvent::debug("d").is_debug());
    }

    #[test]
    fn test_json_formatting() {
        let event = LogEvent::error(codes::persistence::DELETE_FAILED, "Delete failed")
            .with_record(RecordContext::new("Order", "7"))
            .with_context("reason", "locked");

        let json: serde_json::Value =
            serde_json::from_str(&event.format_json().expect("json")).expect("parse");

        assert_eq!(json["level"], "ERROR");
        assert_eq!(json["code"], "E042");
        assert_eq!(json["record"]["type"], "Order");
        assert_eq!(json["record"]["id"], "7");
        assert_eq!(json["context"]["reason"], "locked");
        assert_eq!(json["error_metadata"]["recoverable"], true);
    }

    #[test]
    fn test_level_maps_to_log_facade() {
        assert_eq!(LogLevel::Warning.to_log_level(), log::Level::Warn);
        assert!(LogLevel::Error < LogLevel::Debug);
    }
}
