//! LLM provider trait for chat completion

use async_trait::async_trait;
use crate::config::LlmConfig;
use crate::error::Result;

/// Trait for single-turn chat completion, optionally with an image
///
/// Implementations:
/// - `OpenAiClient`: OpenAI chat completions (gpt-3.5-turbo / gpt-4o)
/// - `CachingLlm`: memoizing wrapper around another provider
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send `prompt` (and the image at `image_url`, if any) as one user
    /// message and return the first generated message
    async fn complete(&self, prompt: &str, image_url: Option<&str>) -> Result<String>;

    /// Model that `complete` uses for this input
    fn model_for(&self, image_url: Option<&str>) -> &str;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Picks the vision-capable model when an image is attached, otherwise the
/// cheaper text-only model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelector {
    /// Text-only model
    pub text_model: String,
    /// Image-understanding model
    pub vision_model: String,
}

impl ModelSelector {
    /// Create a selector from explicit model names
    pub fn new(text_model: impl Into<String>, vision_model: impl Into<String>) -> Self {
        Self {
            text_model: text_model.into(),
            vision_model: vision_model.into(),
        }
    }

    /// Create a selector from LLM configuration
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config.text_model.clone(), config.vision_model.clone())
    }

    /// Model for an input with or without an image
    pub fn select(&self, image_url: Option<&str>) -> &str {
        match image_url {
            Some(_) => &self.vision_model,
            None => &self.text_model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_selection() {
        let selector = ModelSelector::from_config(&LlmConfig::default());
        assert_eq!(selector.select(None), "gpt-3.5-turbo");
        assert_eq!(selector.select(Some("https://example.com/a.png")), "gpt-4o");
    }
}
