// src/strategies/builtins.rs
//! Strategies shipped with the engine

use crate::strategies::errors::ConfigurationError;
use crate::strategies::traits::FieldStrategy;
use crate::types::{FieldValue, Record};
use anonymiser_core::config::compile_time::strategies::MAX_HEX_LENGTH;
use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

/// Random lowercase hex string of a fixed length
#[derive(Debug, Clone, Copy)]
pub struct OverwriteHex {
    length: usize,
}

impl OverwriteHex {
    pub fn new(length: usize) -> Result<Self, ConfigurationError> {
        if length == 0 || length > MAX_HEX_LENGTH {
            return Err(ConfigurationError::InvalidHexLength {
                length,
                max: MAX_HEX_LENGTH,
            });
        }
        Ok(Self { length })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    fn generate(&self) -> String {
        let mut hex = String::with_capacity(self.length + 32);
        while hex.len() < self.length {
            hex.push_str(&Uuid::new_v4().simple().to_string());
        }
        hex.truncate(self.length);
        hex
    }
}

impl FieldStrategy for OverwriteHex {
    fn evaluate(&self, _record: &dyn Record, _previous: &FieldValue) -> FieldValue {
        FieldValue::String(self.generate())
    }

    fn name(&self) -> &str {
        "hex"
    }
}

/// Unique address built from a template; `{}` receives a random UUID
#[derive(Debug, Clone)]
pub struct Email {
    template: String,
}

impl Email {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl FieldStrategy for Email {
    fn evaluate(&self, _record: &dyn Record, _previous: &FieldValue) -> FieldValue {
        FieldValue::String(self.template.replace("{}", &Uuid::new_v4().to_string()))
    }

    fn name(&self) -> &str {
        "email"
    }
}

#[derive(Debug, Clone)]
pub struct PhoneNumber {
    number: String,
}

impl PhoneNumber {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
        }
    }
}

impl FieldStrategy for PhoneNumber {
    fn evaluate(&self, _record: &dyn Record, _previous: &FieldValue) -> FieldValue {
        FieldValue::String(self.number.clone())
    }

    fn name(&self) -> &str {
        "phone_number"
    }
}

/// Current time as an RFC 3339 UTC string
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentDatetime;

impl CurrentDatetime {
    pub fn now() -> FieldValue {
        FieldValue::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl FieldStrategy for CurrentDatetime {
    fn evaluate(&self, _record: &dyn Record, _previous: &FieldValue) -> FieldValue {
        Self::now()
    }

    fn name(&self) -> &str {
        "current_datetime"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Nilable;

impl FieldStrategy for Nilable {
    fn evaluate(&self, _record: &dyn Record, _previous: &FieldValue) -> FieldValue {
        FieldValue::Null
    }

    fn name(&self) -> &str {
        "nilable"
    }
}

/// Leaves the value as it was
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOp;

impl FieldStrategy for NoOp {
    fn evaluate(&self, _record: &dyn Record, previous: &FieldValue) -> FieldValue {
        previous.clone()
    }

    fn name(&self) -> &str {
        "no_op"
    }
}
