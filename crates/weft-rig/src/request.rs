//! Provider-agnostic completion request.

use serde::{Deserialize, Serialize};

/// A completion request assembled by the LLM node executor.
///
/// The user message arrives already merged from upstream workflow inputs;
/// backends translate the request into their own wire shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier, e.g. `gpt-4o-mini` or `gemini-1.5-flash`.
    pub model: String,
    /// Optional system prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// The user message.
    pub user_message: String,
    /// Attached image URLs for vision-capable models.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl CompletionRequest {
    /// Creates a new request for the given model and user message.
    pub fn new(model: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            user_message: user_message.into(),
            ..Default::default()
        }
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Attaches an image URL.
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.images.push(url.into());
        self
    }

    /// Returns the user-visible prompt text with image references appended.
    ///
    /// Backends that inline visual context into the prompt use this form.
    pub fn prompt(&self) -> String {
        if self.images.is_empty() {
            return self.user_message.clone();
        }
        let mut prompt = self.user_message.clone();
        for url in &self.images {
            prompt.push_str("\n\n[Image: ");
            prompt.push_str(url);
            prompt.push(']');
        }
        prompt
    }

    /// Returns the full prompt with the system prompt folded in, if any.
    pub fn full_prompt(&self) -> String {
        match &self.system_prompt {
            Some(system) => format!("System: {}\n\n{}", system, self.prompt()),
            None => self.prompt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_images() {
        let request = CompletionRequest::new("gpt-4o-mini", "hello");
        assert_eq!(request.prompt(), "hello");
    }

    #[test]
    fn test_prompt_appends_image_references() {
        let request = CompletionRequest::new("gemini-1.5-flash", "describe this")
            .with_image("https://cdn.example.com/a.png");
        assert_eq!(
            request.prompt(),
            "describe this\n\n[Image: https://cdn.example.com/a.png]"
        );
    }

    #[test]
    fn test_full_prompt_folds_system_prompt() {
        let request =
            CompletionRequest::new("claude-3-5-haiku", "hi").with_system_prompt("Be terse.");
        assert_eq!(request.full_prompt(), "System: Be terse.\n\nhi");
    }
}
