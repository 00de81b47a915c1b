//! Completion backend interface and implementations.
//!
//! One backend per provider family, all behind the [`CompletionBackend`]
//! trait so the router can treat them uniformly:
//! - [`OpenAiBackend`], [`AnthropicBackend`], [`GeminiBackend`]: rig-backed
//! - [`MockBackend`]: test double (feature `test-utils`)

#[cfg(any(test, feature = "test-utils"))]
mod mock;
mod rig_impl;

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockBackend, MockConfig};
pub use rig_impl::{AnthropicBackend, GeminiBackend, OpenAiBackend};

use crate::error::RigResult;
use crate::request::CompletionRequest;

/// A pluggable completion provider.
///
/// The router selects a backend by model-name pattern and delegates the
/// request; the backend returns the response text or a provider error.
#[async_trait::async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Provider family name, used in logs and error messages.
    fn provider_name(&self) -> &'static str;

    /// Generates a completion for the request, returning the response text.
    async fn generate(&self, request: &CompletionRequest) -> RigResult<String>;
}
