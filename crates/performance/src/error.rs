use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PerformanceError {
    /// A malformed filter or unsupported window type. Surfaced to the caller
    /// as a client error and never retried.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A store query failed. Fatal for the request; no partial results.
    #[error("Upstream store unavailable: {0}")]
    Upstream(#[from] database::DbError),

    /// Anchor resolution returned fewer rows than the fixed expected shape.
    /// Downstream computation cannot proceed safely, so this is fatal.
    #[error("Anchor resolution returned incomplete data: {0}")]
    DataIntegrity(String),

    /// The per-request deadline covering all store calls was exceeded.
    #[error("Request deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

impl From<core_types::CoreError> for PerformanceError {
    fn from(err: core_types::CoreError) -> Self {
        PerformanceError::InvalidArgument(err.to_string())
    }
}
