//! Anthropic Provider
//!
//! Messages API over `reqwest`:
//! - `x-api-key` header authentication
//! - `anthropic-version` header
//! - System prompt as top-level field
//!
//! The API has no JSON mode, so a requested response format is left to the
//! prompt.

use async_trait::async_trait;
use nano_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{CompletionProvider, GenerationOptions},
};
use serde::{Deserialize, Serialize};

use crate::http;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic provider configuration
#[derive(Clone, Debug)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: http::DEFAULT_TIMEOUT_SECS,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Anthropic native Messages API provider
pub struct AnthropicProvider {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        Ok(Self {
            client: http::client(config.timeout_secs)?,
            config,
        })
    }

    fn build_request<'a>(
        messages: &'a [Message],
        system_prompt: &'a str,
        options: &'a GenerationOptions,
    ) -> MessagesRequest<'a> {
        // Only user and assistant turns exist on this API
        let messages = messages
            .iter()
            .map(|m| ApiMessage {
                role: if m.role == Role::Assistant { "assistant" } else { "user" },
                content: &m.content,
            })
            .collect();

        MessagesRequest {
            model: &options.model,
            system: (!system_prompt.is_empty()).then_some(system_prompt),
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        }
    }

    fn extract_text(response: MessagesResponse) -> Result<String> {
        response
            .content
            .into_iter()
            .find_map(|block| match block {
                ResponseBlock::Text { text } => Some(text),
                ResponseBlock::Other => None,
            })
            .ok_or_else(|| AgentError::Provider("anthropic: response contained no text".into()))
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(
        &self,
        messages: &[Message],
        system_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        let url = format!("{}/v1/messages", self.config.base_url);
        let body = Self::build_request(messages, system_prompt, options);

        if options.response_format.is_some() {
            tracing::debug!(provider = "anthropic", "Response format not supported, relying on prompt");
        }
        tracing::debug!(provider = "anthropic", model = %options.model, "Sending completion request");

        let request = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);

        let response: MessagesResponse = http::send_json("anthropic", request).await?;
        Self::extract_text(response)
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<ApiMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}
