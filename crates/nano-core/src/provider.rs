//! Completion Provider Strategy
//!
//! Defines a common interface for all LLM backends (Ollama, OpenAI, Anthropic, etc.)
//! allowing the orchestrator to work with any of them without code changes.
//! Backends differ only in how they shape requests and read responses.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nano_core::provider::{CompletionProvider, GenerationOptions};
//!
//! let provider = OllamaProvider::from_env();
//! let text = provider.generate(&messages, system_prompt, &GenerationOptions::default()).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::{Message, ResponseFormat};

/// Configuration for a single completion request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "llama3.2", "gpt-4o", "claude-3-5-sonnet-latest")
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature, provider default when unset
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Structured response format requested from the backend
    #[serde(default)]
    pub response_format: Option<ResponseFormat>,
}

fn default_model() -> String {
    "llama3.2".into()
}

const fn default_max_tokens() -> u32 {
    1000
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: None,
            response_format: None,
        }
    }
}

impl GenerationOptions {
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Strategy trait for LLM backends
///
/// Implement this trait to add support for a new backend. The session and
/// orchestrator work exclusively through this interface. Errors are treated
/// as fatal by the orchestrator and never interpreted.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logs (e.g., "ollama")
    fn name(&self) -> &str;

    /// Generate a completion for the ordered history under the given system prompt
    async fn generate(
        &self,
        messages: &[Message],
        system_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String>;

    /// Check if the provider is reachable and configured correctly
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert_eq!(opts.max_tokens, 1000);
        assert_eq!(opts.model, "llama3.2");
        assert!(opts.response_format.is_none());
    }

    #[test]
    fn test_generation_options_deserialize_partial() {
        let opts: GenerationOptions = serde_json::from_str(r#"{"model": "gpt-4o"}"#).unwrap();
        assert_eq!(opts.model, "gpt-4o");
        assert_eq!(opts.max_tokens, 1000);
    }
}
