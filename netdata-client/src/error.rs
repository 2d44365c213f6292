//! Error types for the client.

use thiserror::Error;

/// Errors that can occur when talking to a netdata host.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A single HTTP request hit the client's own request timeout.
    #[error("Request timed out")]
    Timeout,

    /// The request plan or client settings are unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A fetch task panicked.
    #[error("Fetch task failed: {0}")]
    Task(String),

    /// A chart fetch failed; names the host and chart it was for.
    #[error("chart '{chart}' on host '{host}': {source}")]
    Chart {
        host: String,
        chart: String,
        #[source]
        source: Box<FetchError>,
    },
}

impl FetchError {
    /// Attach the host and chart a failure belongs to.
    pub fn for_chart(self, host: impl Into<String>, chart: impl Into<String>) -> Self {
        FetchError::Chart {
            host: host.into(),
            chart: chart.into(),
            source: Box::new(self),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}
