//! Model-name routing to completion backends.

use std::sync::Arc;

use crate::TRACING_TARGET;
use crate::error::{RigError, RigResult};
use crate::provider::{AnthropicBackend, CompletionBackend, GeminiBackend, OpenAiBackend};
use crate::request::CompletionRequest;

/// Routes completion requests to registered backends by model-name prefix.
///
/// Rules are evaluated in registration order; the first rule with a prefix
/// matching the start of the model name wins. A model that matches no rule
/// is an [`RigError::UnknownModel`] error, which the LLM node records as
/// its own failure.
#[derive(Clone, Default)]
pub struct CompletionRouter {
    rules: Vec<RouteRule>,
}

#[derive(Clone)]
struct RouteRule {
    prefixes: Vec<String>,
    backend: Arc<dyn CompletionBackend>,
}

impl CompletionRouter {
    /// Creates an empty router with no registered backends.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a router with the default prefix rules for every provider
    /// family an API key is configured for.
    pub fn from_keys(keys: ProviderKeys) -> Self {
        let mut router = Self::new();
        if let Some(key) = keys.openai {
            router = router.register(
                ["gpt-", "o1", "o3", "chatgpt-"],
                Arc::new(OpenAiBackend::new(key)),
            );
        }
        if let Some(key) = keys.anthropic {
            router = router.register(["claude-"], Arc::new(AnthropicBackend::new(key)));
        }
        if let Some(key) = keys.gemini {
            router = router.register(["gemini-"], Arc::new(GeminiBackend::new(key)));
        }
        router
    }

    /// Registers a backend for model names starting with any of `prefixes`.
    pub fn register<I, S>(mut self, prefixes: I, backend: Arc<dyn CompletionBackend>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.push(RouteRule {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            backend,
        });
        self
    }

    /// Returns the backend matching the model name, if any.
    pub fn route(&self, model: &str) -> Option<&Arc<dyn CompletionBackend>> {
        self.rules
            .iter()
            .find(|rule| rule.prefixes.iter().any(|p| model.starts_with(p.as_str())))
            .map(|rule| &rule.backend)
    }

    /// Generates a completion by dispatching to the matching backend.
    pub async fn generate(&self, request: &CompletionRequest) -> RigResult<String> {
        let backend = self
            .route(&request.model)
            .ok_or_else(|| RigError::UnknownModel(request.model.clone()))?;

        tracing::debug!(
            target: TRACING_TARGET,
            provider = backend.provider_name(),
            model = %request.model,
            "Dispatching completion request"
        );

        let response = backend.generate(request).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            provider = backend.provider_name(),
            response_len = response.len(),
            "Completion request finished"
        );

        Ok(response)
    }
}

impl std::fmt::Debug for CompletionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionRouter")
            .field("rules", &self.rules.len())
            .finish()
    }
}

/// API keys for the built-in provider families.
#[derive(Debug, Clone, Default)]
pub struct ProviderKeys {
    /// OpenAI API key.
    pub openai: Option<String>,
    /// Anthropic API key.
    pub anthropic: Option<String>,
    /// Google Gemini API key.
    pub gemini: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockBackend;

    fn router_with_mocks() -> CompletionRouter {
        CompletionRouter::new()
            .register(["gpt-", "o1"], Arc::new(MockBackend::canned("from openai")))
            .register(["claude-"], Arc::new(MockBackend::canned("from anthropic")))
            .register(["gemini-"], Arc::new(MockBackend::canned("from gemini")))
    }

    #[test]
    fn test_route_by_prefix() {
        let router = router_with_mocks();
        assert_eq!(
            router.route("gpt-4o-mini").unwrap().provider_name(),
            "mock"
        );
        assert!(router.route("claude-3-5-haiku-20241022").is_some());
        assert!(router.route("gemini-1.5-flash").is_some());
        assert!(router.route("mistral-large").is_none());
    }

    #[tokio::test]
    async fn test_first_matching_rule_wins() {
        let router = CompletionRouter::new()
            .register(["gemini-"], Arc::new(MockBackend::canned("first")))
            .register(["gemini-1.5"], Arc::new(MockBackend::canned("second")));
        // Registration order decides, not specificity.
        let request = CompletionRequest::new("gemini-1.5-flash", "hi");
        assert_eq!(router.generate(&request).await.unwrap(), "first");
    }

    #[tokio::test]
    async fn test_generate_unknown_model() {
        let router = router_with_mocks();
        let request = CompletionRequest::new("unknown-model", "hi");
        let err = router.generate(&request).await.unwrap_err();
        assert!(matches!(err, RigError::UnknownModel(_)));
    }

    #[tokio::test]
    async fn test_generate_dispatches() {
        let router = router_with_mocks();
        let request = CompletionRequest::new("claude-3-5-haiku-20241022", "hi");
        assert_eq!(router.generate(&request).await.unwrap(), "from anthropic");
    }
}
