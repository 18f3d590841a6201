//! # nano-runtime
//!
//! Completion provider backends for the nano-agent system.
//!
//! ## Providers
//!
//! - **Ollama** (default): Local LLM inference via Ollama
//! - **OpenAI**: Chat Completions API
//! - **Anthropic**: Messages API
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nano_runtime::{ProviderSettings, build_provider};
//!
//! let settings = ProviderSettings::from_env();
//! let agent = AgentBuilder::new()
//!     .provider(build_provider(&settings)?)
//!     .options(settings.generation_options())
//!     .build()?;
//! ```

pub mod anthropic;
mod http;
pub mod openai;
pub mod settings;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use anthropic::{AnthropicConfig, AnthropicProvider};
pub use openai::{OpenAiConfig, OpenAiProvider};
pub use settings::{AVAILABLE_PROVIDERS, ProviderSettings, build_provider};

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};
