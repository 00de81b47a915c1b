//! Completion provider error types.

use thiserror::Error;

/// Result type for completion provider operations.
pub type RigResult<T> = Result<T, RigError>;

/// Errors that can occur when calling completion providers.
#[derive(Debug, Error)]
pub enum RigError {
    /// No registered backend matches the requested model name.
    #[error("no completion provider registered for model '{0}'")]
    UnknownModel(String),

    /// The provider rejected the request or the transport failed.
    #[error("{provider} provider error: {message}")]
    Provider {
        /// Provider family name.
        provider: &'static str,
        /// Error message.
        message: String,
    },

    /// Provider client configuration is invalid.
    #[error("invalid provider configuration: {0}")]
    Config(String),
}

impl RigError {
    /// Creates a provider error.
    pub fn provider(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Provider {
            provider,
            message: message.into(),
        }
    }
}
