//! Rig-backed completion providers.

use rig::completion::{AssistantContent, CompletionError, CompletionModel as _};
use rig::one_or_many::OneOrMany;
use rig::prelude::CompletionClient;
use rig::providers::{anthropic, gemini, openai};

use super::CompletionBackend;
use crate::error::{RigError, RigResult};
use crate::request::CompletionRequest;

/// OpenAI completion backend.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    api_key: String,
}

impl OpenAiBackend {
    /// Creates a backend with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

#[async_trait::async_trait]
impl CompletionBackend for OpenAiBackend {
    fn provider_name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, request: &CompletionRequest) -> RigResult<String> {
        let client = openai::Client::new(&self.api_key)
            .map_err(|e| RigError::Config(e.to_string()))?
            .completions_api();
        let model: openai::CompletionModel = client.completion_model(&request.model);
        let prompt = request.full_prompt();
        model
            .completion_request(prompt.as_str())
            .send()
            .await
            .map(|r| extract_text_content(&r.choice))
            .map_err(|e: CompletionError| RigError::provider("openai", e.to_string()))
    }
}

/// Anthropic completion backend.
#[derive(Debug, Clone)]
pub struct AnthropicBackend {
    api_key: String,
}

impl AnthropicBackend {
    /// Creates a backend with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

#[async_trait::async_trait]
impl CompletionBackend for AnthropicBackend {
    fn provider_name(&self) -> &'static str {
        "anthropic"
    }

    async fn generate(&self, request: &CompletionRequest) -> RigResult<String> {
        let client =
            anthropic::Client::new(&self.api_key).map_err(|e| RigError::Config(e.to_string()))?;
        let model: anthropic::completion::CompletionModel =
            client.completion_model(&request.model);
        let prompt = request.full_prompt();
        model
            .completion_request(prompt.as_str())
            .send()
            .await
            .map(|r| extract_text_content(&r.choice))
            .map_err(|e: CompletionError| RigError::provider("anthropic", e.to_string()))
    }
}

/// Google Gemini completion backend.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    api_key: String,
}

impl GeminiBackend {
    /// Creates a backend with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

#[async_trait::async_trait]
impl CompletionBackend for GeminiBackend {
    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, request: &CompletionRequest) -> RigResult<String> {
        let client =
            gemini::Client::new(&self.api_key).map_err(|e| RigError::Config(e.to_string()))?;
        let model = client.completion_model(&request.model);
        let prompt = request.full_prompt();
        model
            .completion_request(prompt.as_str())
            .send()
            .await
            .map(|r| extract_text_content(&r.choice))
            .map_err(|e: CompletionError| RigError::provider("gemini", e.to_string()))
    }
}

/// Extracts text content from assistant content choices.
fn extract_text_content(choice: &OneOrMany<AssistantContent>) -> String {
    choice
        .iter()
        .filter_map(|content| match content {
            AssistantContent::Text(text) => Some(text.text()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}
