//! Media provider error types.

use thiserror::Error;

/// Result type for media provider operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media operations.
#[derive(Debug, Error)]
pub enum MediaError {
    /// HTTP transport failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The source asset could not be decoded.
    #[error("failed to decode source asset: {0}")]
    Decode(String),

    /// The processing backend reported a job failure.
    #[error("processing job failed: {reason}")]
    Job {
        /// Backend-reported failure reason.
        reason: String,
    },

    /// The processing job did not reach a terminal state in time.
    #[error("processing job did not complete in time")]
    JobTimeout,

    /// The backend returned an unexpected response.
    #[error("unexpected backend response: {0}")]
    Backend(String),

    /// Client configuration is invalid.
    #[error("invalid media configuration: {0}")]
    Config(String),
}

impl MediaError {
    /// Creates a job failure error.
    pub fn job(reason: impl Into<String>) -> Self {
        Self::Job {
            reason: reason.into(),
        }
    }
}
