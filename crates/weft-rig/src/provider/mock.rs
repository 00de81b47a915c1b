//! Mock completion backend for testing.
//!
//! Returns configurable canned responses and records every request it
//! receives, so tests can assert on the assembled prompts.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! weft-rig = { version = "...", features = ["test-utils"] }
//! ```

use std::sync::Mutex;
use std::time::Duration;

use super::CompletionBackend;
use crate::error::{RigError, RigResult};
use crate::request::CompletionRequest;

/// Configuration for the mock backend.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Canned response returned for every request.
    pub response: Option<String>,
    /// When set, every request fails with this message.
    pub fail_with: Option<String>,
    /// When set, responses echo the assembled prompt back.
    pub echo_prompt: bool,
    /// Artificial latency applied before responding.
    pub latency: Option<Duration>,
}

/// Mock completion backend for unit and integration tests.
#[derive(Debug, Default)]
pub struct MockBackend {
    config: MockConfig,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockBackend {
    /// Creates a mock backend with the given configuration.
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock that returns a fixed response.
    pub fn canned(response: impl Into<String>) -> Self {
        Self::new(MockConfig {
            response: Some(response.into()),
            ..Default::default()
        })
    }

    /// Creates a mock that echoes the assembled prompt back.
    pub fn echo() -> Self {
        Self::new(MockConfig {
            echo_prompt: true,
            ..Default::default()
        })
    }

    /// Creates a mock that fails every request.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(MockConfig {
            fail_with: Some(message.into()),
            ..Default::default()
        })
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CompletionBackend for MockBackend {
    fn provider_name(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, request: &CompletionRequest) -> RigResult<String> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(latency) = self.config.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(message) = &self.config.fail_with {
            return Err(RigError::provider("mock", message.clone()));
        }
        if self.config.echo_prompt {
            return Ok(request.prompt());
        }
        Ok(self
            .config
            .response
            .clone()
            .unwrap_or_else(|| "mock response".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canned_response() {
        let mock = MockBackend::canned("42");
        let request = CompletionRequest::new("mock-model", "meaning of life?");
        assert_eq!(mock.generate(&request).await.unwrap(), "42");
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let mock = MockBackend::failing("quota exceeded");
        let request = CompletionRequest::new("mock-model", "hi");
        let err = mock.generate(&request).await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_echo_returns_prompt() {
        let mock = MockBackend::echo();
        let request = CompletionRequest::new("mock-model", "foo\nbar");
        assert_eq!(mock.generate(&request).await.unwrap(), "foo\nbar");
    }
}
