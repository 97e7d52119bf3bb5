use crate::results::AnonymisationResult;
use crate::strategies::ValidationError;
use crate::types::{Record, RecordRef};
use anonymiser_core::logging::codes;
use anonymiser_core::{log_error, log_success};

/// Deletes the whole record; needs no field coverage
#[derive(Debug, Clone, Copy, Default)]
pub struct DestroyStrategy;

impl DestroyStrategy {
    pub fn is_valid(&self) -> bool {
        true
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    pub fn apply(&self, record: &mut dyn Record) -> AnonymisationResult {
        let record_ref = RecordRef::of(record);

        match record.delete() {
            Ok(()) => {
                log_success!(codes::success::RECORD_DESTROYED, "Record destroyed");
                AnonymisationResult::destroyed(record_ref)
            }
            Err(error) => {
                log_error!(
                    codes::persistence::DELETE_FAILED,
                    "Destroy failed, record may still hold personal data",
                    "record" => record_ref,
                    "reason" => error
                );
                AnonymisationResult::failed(error, record_ref)
            }
        }
    }
}
