pub mod types;

pub use types::{AnonymisationResult, ResultStatus, ResultSummary};
