//! Subject selectors
//!
//! A selector finds every record of one record type that relates to an
//! external subject, e.g. all orders placed by a given user id. Bulk
//! anonymisation runs the selector and applies the policy to each match.

use crate::api::errors::AnonymiserError;
use crate::strategies::ConfigurationError;
use crate::types::{Record, RecordError};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Query returning the records matching a subject id, in store order
pub type SelectorQuery =
    Arc<dyn Fn(&str) -> Result<Vec<Box<dyn Record>>, RecordError> + Send + Sync>;

#[derive(Clone)]
pub struct SelectorRegistry {
    record_type: String,
    selectors: BTreeMap<String, SelectorQuery>,
}

impl SelectorRegistry {
    pub fn new(record_type: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            selectors: BTreeMap::new(),
        }
    }

    /// Register the query for `subject`, replacing any previous one
    pub fn for_subject<F>(&mut self, subject: impl Into<String>, query: F) -> &mut Self
    where
        F: Fn(&str) -> Result<Vec<Box<dyn Record>>, RecordError> + Send + Sync + 'static,
    {
        self.selectors.insert(subject.into(), Arc::new(query));
        self
    }

    /// Run the query registered for `subject`
    pub fn select(
        &self,
        subject: &str,
        subject_id: &str,
    ) -> Result<Vec<Box<dyn Record>>, AnonymiserError> {
        let query = self
            .selectors
            .get(subject)
            .ok_or_else(|| ConfigurationError::SelectorNotFound {
                subject: subject.to_string(),
                record_type: self.record_type.clone(),
            })?;

        Ok(query(subject_id)?)
    }

    pub fn has_subject(&self, subject: &str) -> bool {
        self.selectors.contains_key(subject)
    }

    /// Registered subject keys in sorted order
    pub fn subjects(&self) -> Vec<&str> {
        self.selectors.keys().map(String::as_str).collect()
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }
}

impl fmt::Debug for SelectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectorRegistry")
            .field("record_type", &self.record_type)
            .field("subjects", &self.subjects())
            .finish()
    }
}
