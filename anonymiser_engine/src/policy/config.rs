//! Per-record-type policy
//!
//! The strategy slot moves `Undefined -> Fields | Destroy` exactly once. A skip
//! filter and subject selectors may be added alongside either branch.

use crate::api::config::AnonymiserConfig;
use crate::api::errors::AnonymiserError;
use crate::policy::audit::AuditLogHook;
use crate::policy::builder::FieldStrategyBuilder;
use crate::policy::destroy::DestroyStrategy;
use crate::policy::selectors::SelectorRegistry;
use crate::policy::StrategyKind;
use crate::results::{AnonymisationResult, ResultSummary};
use crate::strategies::{ConfigurationError, StrategyRegistry};
use crate::types::{Record, RecordError, RecordRef, RecordSchema};
use anonymiser_core::config::compile_time::selectors::MAX_RECORDS_PER_SUBJECT;
use anonymiser_core::logging::{self, codes};
use anonymiser_core::{log_info, log_success};
use std::fmt;
use std::sync::Arc;

/// Predicate marking records that must be left alone
pub type SkipFilter = Arc<dyn Fn(&dyn Record) -> bool + Send + Sync>;

enum StrategySlot {
    Undefined,
    Fields(FieldStrategyBuilder),
    Destroy(DestroyStrategy),
}

impl StrategySlot {
    fn kind(&self) -> Option<StrategyKind> {
        match self {
            StrategySlot::Undefined => None,
            StrategySlot::Fields(_) => Some(StrategyKind::Fields),
            StrategySlot::Destroy(_) => Some(StrategyKind::Destroy),
        }
    }
}

pub struct PolicyConfig {
    schema: Arc<RecordSchema>,
    config: Arc<AnonymiserConfig>,
    strategies: Arc<StrategyRegistry>,
    slot: StrategySlot,
    skip_filter: Option<SkipFilter>,
    selectors: Option<SelectorRegistry>,
    audit_hook: Option<Arc<dyn AuditLogHook>>,
}

impl PolicyConfig {
    pub fn new(
        schema: RecordSchema,
        config: Arc<AnonymiserConfig>,
        strategies: Arc<StrategyRegistry>,
    ) -> Self {
        Self {
            schema: Arc::new(schema),
            config,
            strategies,
            slot: StrategySlot::Undefined,
            skip_filter: None,
            selectors: None,
            audit_hook: None,
        }
    }

    pub fn record_type(&self) -> &str {
        self.schema.name()
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    fn claim_slot(&self, attempted: StrategyKind) -> Result<(), ConfigurationError> {
        match self.slot.kind() {
            None => Ok(()),
            Some(existing) => Err(ConfigurationError::StrategyAlreadyDefined {
                record_type: self.record_type().to_string(),
                attempted,
                existing,
            }),
        }
    }

    /// Delete matching records instead of overwriting them
    pub fn destroy(&mut self) -> Result<&mut Self, ConfigurationError> {
        self.claim_slot(StrategyKind::Destroy)?;
        self.slot = StrategySlot::Destroy(DestroyStrategy);
        Ok(self)
    }

    /// Declare field strategies; the slot is only claimed if `declare` succeeds
    pub fn fields<F>(&mut self, declare: F) -> Result<&mut Self, ConfigurationError>
    where
        F: FnOnce(&mut FieldStrategyBuilder) -> Result<(), ConfigurationError>,
    {
        self.claim_slot(StrategyKind::Fields)?;

        let mut builder = FieldStrategyBuilder::new(
            Arc::clone(&self.schema),
            Arc::clone(&self.config),
            Arc::clone(&self.strategies),
        );
        declare(&mut builder)?;

        self.slot = StrategySlot::Fields(builder);
        Ok(self)
    }

    pub fn skip_if<F>(&mut self, predicate: F) -> Result<&mut Self, ConfigurationError>
    where
        F: Fn(&dyn Record) -> bool + Send + Sync + 'static,
    {
        if self.skip_filter.is_some() {
            return Err(ConfigurationError::SkipFilterAlreadyDefined {
                record_type: self.record_type().to_string(),
            });
        }
        self.skip_filter = Some(Arc::new(predicate));
        Ok(self)
    }

    /// Register subject selectors; repeated calls extend the same registry
    pub fn selectors<F>(&mut self, declare: F) -> &mut Self
    where
        F: FnOnce(&mut SelectorRegistry),
    {
        let record_type = self.schema.name().to_string();
        declare(
            self.selectors
                .get_or_insert_with(|| SelectorRegistry::new(record_type)),
        );
        self
    }

    pub fn audit_with(&mut self, hook: Arc<dyn AuditLogHook>) -> &mut Self {
        self.audit_hook = Some(hook);
        self
    }

    pub fn strategy_kind(&self) -> Option<StrategyKind> {
        self.slot.kind()
    }

    pub fn field_strategies(&self) -> Option<&FieldStrategyBuilder> {
        match &self.slot {
            StrategySlot::Fields(builder) => Some(builder),
            _ => None,
        }
    }

    pub fn has_skip_filter(&self) -> bool {
        self.skip_filter.is_some()
    }

    pub fn selector_registry(&self) -> Option<&SelectorRegistry> {
        self.selectors.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        match &self.slot {
            StrategySlot::Undefined => false,
            StrategySlot::Fields(builder) => builder.is_valid(),
            StrategySlot::Destroy(destroy) => destroy.is_valid(),
        }
    }

    pub fn validate(&self) -> Result<(), AnonymiserError> {
        match &self.slot {
            StrategySlot::Undefined => Err(ConfigurationError::UndefinedStrategy {
                record_type: self.record_type().to_string(),
            }
            .into()),
            StrategySlot::Fields(builder) => Ok(builder.validate()?),
            StrategySlot::Destroy(destroy) => Ok(destroy.validate()?),
        }
    }

    /// Apply the policy to one record
    ///
    /// Store failures come back as failed results; an undefined or incomplete
    /// policy is an error and leaves the record untouched.
    pub fn apply(&self, record: &mut dyn Record) -> Result<AnonymisationResult, AnonymiserError> {
        let record_ref = RecordRef::of(record);

        logging::with_record_context((&record_ref).into(), || -> Result<_, AnonymiserError> {
            if let Some(skip) = &self.skip_filter {
                if skip(&*record) {
                    log_success!(codes::success::RECORD_SKIPPED, "Record skipped");
                    return Ok(AnonymisationResult::skipped(record_ref));
                }
            }

            match &self.slot {
                StrategySlot::Undefined => Err(ConfigurationError::UndefinedStrategy {
                    record_type: self.record_type().to_string(),
                }
                .into()),
                StrategySlot::Fields(builder) => {
                    Ok(builder.apply_with_hook(record, self.audit_hook.as_deref())?)
                }
                StrategySlot::Destroy(destroy) => Ok(destroy.apply(record)),
            }
        })
    }

    pub fn select(
        &self,
        subject: &str,
        subject_id: &str,
    ) -> Result<Vec<Box<dyn Record>>, AnonymiserError> {
        match &self.selectors {
            Some(selectors) => selectors.select(subject, subject_id),
            None => Err(ConfigurationError::SelectorNotFound {
                subject: subject.to_string(),
                record_type: self.record_type().to_string(),
            }
            .into()),
        }
    }

    /// Apply the policy to every record the `subject` selector returns, in
    /// query order
    ///
    /// More than `MAX_RECORDS_PER_SUBJECT` records fails the whole call before
    /// any record is touched. The cap bounds writes, not the query: the
    /// selector has already materialised its records by then.
    pub fn apply_for_subject(
        &self,
        subject: &str,
        subject_id: &str,
    ) -> Result<Vec<AnonymisationResult>, AnonymiserError> {
        let mut records = self.select(subject, subject_id)?;

        if records.len() > MAX_RECORDS_PER_SUBJECT {
            return Err(RecordError::QueryFailed {
                subject: subject.to_string(),
                reason: format!(
                    "selector returned {} records, limit is {}",
                    records.len(),
                    MAX_RECORDS_PER_SUBJECT
                ),
            }
            .into());
        }

        log_info!(
            "Applying policy for subject",
            "record_type" => self.record_type(),
            "subject" => subject,
            "records" => records.len()
        );

        let results = records
            .iter_mut()
            .map(|record| self.apply(&mut **record))
            .collect::<Result<Vec<_>, _>>()?;

        let summary = ResultSummary::from_results(&results);
        log_success!(
            codes::success::SUBJECT_APPLY_COMPLETED,
            "Subject anonymisation completed",
            "record_type" => self.record_type(),
            "subject" => subject,
            "overwritten" => summary.overwritten,
            "destroyed" => summary.destroyed,
            "skipped" => summary.skipped,
            "failed" => summary.failed
        );

        Ok(results)
    }

    /// Whether `record` carries the processing marker
    pub fn is_anonymised(&self, record: &dyn Record) -> Result<bool, AnonymiserError> {
        let marker = self.config.marker_field();
        if !self.schema.has_field(marker) {
            return Err(AnonymiserError::AnonymisationNotKnown {
                record_type: self.record_type().to_string(),
            });
        }

        match record.get_field(marker) {
            Ok(value) => Ok(!value.is_null()),
            Err(RecordError::FieldNotFound { .. }) => Ok(false),
            Err(error) => Err(error.into()),
        }
    }
}

impl fmt::Debug for PolicyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyConfig")
            .field("record_type", &self.record_type())
            .field("strategy_kind", &self.strategy_kind())
            .field("skip_filter", &self.skip_filter.is_some())
            .field("selectors", &self.selectors)
            .field("audit_hook", &self.audit_hook.is_some())
            .finish()
    }
}
