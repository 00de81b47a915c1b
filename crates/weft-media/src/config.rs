//! Configuration for the media processing client.

use std::time::Duration;

use url::Url;

use crate::error::{MediaError, MediaResult};
use crate::poll::PollSettings;

/// Configuration for the HTTP media processing backend.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Base URL of the processing service.
    base_url: Url,

    /// API key for authentication (if required).
    api_key: Option<String>,

    /// Request timeout duration.
    timeout: Duration,

    /// Pacing for job status polling.
    poll: PollSettings,

    /// User agent string for HTTP requests.
    user_agent: String,
}

impl MediaConfig {
    /// Creates a new configuration with the given base URL and defaults.
    pub fn new(base_url: impl AsRef<str>) -> MediaResult<Self> {
        let base_url = Url::parse(base_url.as_ref()).map_err(|e| {
            MediaError::Config(format!("invalid base URL '{}': {}", base_url.as_ref(), e))
        })?;

        Ok(Self {
            base_url,
            api_key: None,
            timeout: Duration::from_secs(30),
            poll: PollSettings::default(),
            user_agent: format!("weft-media/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the job polling pace.
    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the job submission endpoint.
    pub fn jobs_url(&self) -> MediaResult<Url> {
        self.base_url
            .join("jobs")
            .map_err(|e| MediaError::Config(e.to_string()))
    }

    /// Returns the API key, if set.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the job polling pace.
    pub fn poll(&self) -> PollSettings {
        self.poll
    }

    /// Returns the user agent string.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = MediaConfig::new("https://media.example.com/").unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.api_key().is_none());
        assert_eq!(
            config.jobs_url().unwrap().as_str(),
            "https://media.example.com/jobs"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(MediaConfig::new("not a url").is_err());
    }
}
