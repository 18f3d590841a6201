//! Provider selection from the environment
//!
//! | variable | meaning |
//! |---|---|
//! | `LANGUAGE_PROVIDER` | `ollama` (default), `openai` or `anthropic` |
//! | `LANGUAGE_MODEL` | model identifier, defaults per provider |
//! | `OPENAI_API_KEY` / `ANTHROPIC_API_KEY` | credentials for hosted providers |
//! | `OPENAI_BASE_URL` / `ANTHROPIC_BASE_URL` | optional endpoint override |
//! | `OLLAMA_HOST` / `OLLAMA_PORT` | local Ollama endpoint |

use std::sync::Arc;

use nano_core::{
    error::{AgentError, Result},
    provider::{CompletionProvider, GenerationOptions},
};

use crate::anthropic::{AnthropicConfig, AnthropicProvider};
use crate::openai::{OpenAiConfig, OpenAiProvider};

/// Provider identifiers accepted in `LANGUAGE_PROVIDER`
pub const AVAILABLE_PROVIDERS: &[&str] = &["anthropic", "openai", "ollama"];

/// Resolved provider settings
#[derive(Clone, Debug)]
pub struct ProviderSettings {
    pub provider: String,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    #[cfg(feature = "ollama")]
    pub ollama: crate::ollama::OllamaConfig,
}

impl ProviderSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let provider = lookup("LANGUAGE_PROVIDER")
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "ollama".into());

        let model = lookup("LANGUAGE_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_model(&provider).into());

        let prefix = provider.to_uppercase();
        let api_key = lookup(&format!("{prefix}_API_KEY")).filter(|k| !k.is_empty());
        let base_url = lookup(&format!("{prefix}_BASE_URL")).filter(|u| !u.is_empty());

        Self {
            #[cfg(feature = "ollama")]
            ollama: crate::ollama::OllamaConfig::from_lookup(&lookup),
            provider,
            model,
            api_key,
            base_url,
        }
    }

    /// Generation defaults for sessions driven by this provider
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions::with_model(self.model.clone())
    }

    fn require_api_key(&self) -> Result<String> {
        self.api_key.clone().ok_or_else(|| {
            AgentError::Config(format!("{}_API_KEY is not set", self.provider.to_uppercase()))
        })
    }
}

fn default_model(provider: &str) -> &'static str {
    match provider {
        "openai" => "gpt-4o-mini",
        "anthropic" => "claude-3-5-sonnet-latest",
        _ => "llama3.2",
    }
}

/// Instantiate the configured backend
pub fn build_provider(settings: &ProviderSettings) -> Result<Arc<dyn CompletionProvider>> {
    tracing::info!(provider = %settings.provider, model = %settings.model, "Using language model");

    match settings.provider.as_str() {
        "openai" => {
            let mut config = OpenAiConfig::new(settings.require_api_key()?);
            if let Some(url) = &settings.base_url {
                config = config.with_base_url(url);
            }
            Ok(Arc::new(OpenAiProvider::new(config)?))
        }
        "anthropic" => {
            let mut config = AnthropicConfig::new(settings.require_api_key()?);
            if let Some(url) = &settings.base_url {
                config = config.with_base_url(url);
            }
            Ok(Arc::new(AnthropicProvider::new(config)?))
        }
        #[cfg(feature = "ollama")]
        "ollama" => Ok(Arc::new(crate::ollama::OllamaProvider::from_config(
            &settings.ollama,
        ))),
        other => Err(AgentError::Config(format!(
            "Unsupported provider: {other}. Available providers: {AVAILABLE_PROVIDERS:?}"
        ))),
    }
}
