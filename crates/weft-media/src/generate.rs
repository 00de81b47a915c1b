//! Generative text-to-image and text-to-video.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET;
use crate::backend::MediaBackend;
use crate::job::MediaOperation;
use crate::poll::{PollOutcome, PollSettings, await_job};

/// A generated asset, possibly degraded to a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAsset {
    /// URL of the generated (or placeholder) asset.
    pub url: String,
    /// The prompt the asset was generated from.
    pub prompt: String,
    /// Present when the provider was unavailable and a placeholder was
    /// substituted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Generative media service backed by a media backend.
///
/// This service never fails: provider errors and timeouts degrade to a
/// placeholder asset with a warning attached.
#[derive(Clone)]
pub struct GenerativeService {
    backend: Arc<dyn MediaBackend>,
    poll: PollSettings,
}

impl GenerativeService {
    /// Creates a new service with default poll pacing.
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            backend,
            poll: PollSettings::default(),
        }
    }

    /// Sets the job polling pace.
    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    /// Generates an image from a text prompt.
    pub async fn text_to_image(&self, prompt: &str) -> GeneratedAsset {
        let operation = MediaOperation::GenerateImage {
            prompt: prompt.to_string(),
        };
        self.generate(operation, prompt, placeholder_image_url(prompt))
            .await
    }

    /// Generates a video clip from a text prompt.
    pub async fn text_to_video(&self, prompt: &str) -> GeneratedAsset {
        let operation = MediaOperation::GenerateVideo {
            prompt: prompt.to_string(),
        };
        self.generate(operation, prompt, placeholder_video_url())
            .await
    }

    async fn generate(
        &self,
        operation: MediaOperation,
        prompt: &str,
        placeholder: String,
    ) -> GeneratedAsset {
        let name = operation.name();

        let handle = match self.backend.submit(&operation).await {
            Ok(handle) => handle,
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    operation = name,
                    error = %err,
                    "Generation submit failed, substituting placeholder"
                );
                return GeneratedAsset {
                    url: placeholder,
                    prompt: prompt.to_string(),
                    warning: Some(format!("generation unavailable, using placeholder: {}", err)),
                };
            }
        };

        match await_job(self.backend.as_ref(), &handle, self.poll).await {
            PollOutcome::Completed(url) => GeneratedAsset {
                url,
                prompt: prompt.to_string(),
                warning: None,
            },
            PollOutcome::Failed(reason) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    operation = name,
                    reason = %reason,
                    "Generation failed, substituting placeholder"
                );
                GeneratedAsset {
                    url: placeholder,
                    prompt: prompt.to_string(),
                    warning: Some(format!("generation failed, using placeholder: {}", reason)),
                }
            }
            PollOutcome::TimedOut => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    operation = name,
                    "Generation timed out, substituting placeholder"
                );
                GeneratedAsset {
                    url: placeholder,
                    prompt: prompt.to_string(),
                    warning: Some("generation timed out, using placeholder".to_string()),
                }
            }
        }
    }
}

fn placeholder_image_url(prompt: &str) -> String {
    format!(
        "https://placehold.co/1024x1024/png?text={}",
        encode_snippet(prompt)
    )
}

fn placeholder_video_url() -> String {
    "https://placehold.co/1280x720/png?text=Video+Preview".to_string()
}

/// Form-encodes a short prompt snippet for placeholder URLs.
fn encode_snippet(prompt: &str) -> String {
    let snippet: String = prompt.chars().take(24).collect();
    url::form_urlencoded::byte_serialize(snippet.trim().as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::backend::{MockJobScript, MockMediaBackend};

    fn fast(service: GenerativeService) -> GenerativeService {
        service.with_poll_settings(PollSettings {
            interval: Duration::from_millis(1),
            max_attempts: 3,
        })
    }

    #[tokio::test]
    async fn test_successful_generation() {
        let backend = Arc::new(MockMediaBackend::new().with_script(MockJobScript::Complete {
            result_url: "https://cdn.example.com/gen.png".into(),
            pending_polls: 1,
        }));
        let service = fast(GenerativeService::new(backend));

        let asset = service.text_to_image("a calm harbor at dusk").await;
        assert_eq!(asset.url, "https://cdn.example.com/gen.png");
        assert_eq!(asset.prompt, "a calm harbor at dusk");
        assert!(asset.warning.is_none());
    }

    #[tokio::test]
    async fn test_failed_generation_soft_fails() {
        let backend = Arc::new(MockMediaBackend::new().with_script(MockJobScript::Fail {
            reason: "rate limited".into(),
        }));
        let service = fast(GenerativeService::new(backend));

        let asset = service.text_to_image("a calm harbor at dusk").await;
        assert!(asset.url.starts_with("https://placehold.co/"));
        assert!(asset.warning.as_deref().unwrap().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_submit_error_soft_fails() {
        let backend = Arc::new(MockMediaBackend::new().failing_submit("service unavailable"));
        let service = fast(GenerativeService::new(backend));

        let asset = service.text_to_video("waves").await;
        assert!(asset.url.starts_with("https://placehold.co/"));
        assert!(asset.warning.is_some());
    }

    #[tokio::test]
    async fn test_timeout_soft_fails() {
        let backend = Arc::new(MockMediaBackend::new().with_script(MockJobScript::Stall));
        let service = fast(GenerativeService::new(backend));

        let asset = service.text_to_image("waves").await;
        assert!(asset.url.starts_with("https://placehold.co/"));
        assert!(asset.warning.as_deref().unwrap().contains("timed out"));
    }

    #[test]
    fn test_placeholder_encodes_prompt_snippet() {
        let url = placeholder_image_url("a calm harbor");
        assert_eq!(url, "https://placehold.co/1024x1024/png?text=a+calm+harbor");
    }
}
