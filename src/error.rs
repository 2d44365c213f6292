//! Error types for the pipeline.

use thiserror::Error;

use netdata_client::FetchError;

/// Errors raised by post-processing steps.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// A frequency string could not be parsed.
    #[error("invalid frequency '{0}'")]
    InvalidFrequency(String),

    /// The index does not step by the requested frequency.
    #[error("index does not conform to frequency of {expected}s: found a step of {found}s at time {at}")]
    FrequencyMismatch { expected: f64, found: i64, at: i64 },

    /// A timestamp cannot be represented as calendar time.
    #[error("timestamp {0} is out of range")]
    TimestampOutOfRange(i64),
}

/// Any failure of a `get_data` call.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
