//! OpenAI Provider
//!
//! Chat Completions API over `reqwest`. The system prompt is sent as a
//! leading `developer` message; a JSON response format maps to
//! `response_format: {"type": "json_object"}`.

use async_trait::async_trait;
use nano_core::{
    error::{AgentError, Result},
    message::{Message, ResponseFormat},
    provider::{CompletionProvider, GenerationOptions},
};
use serde::{Deserialize, Serialize};

use crate::http;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI provider configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl OpenAiConfig {
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

/// OpenAI LLM provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        Ok(Self {
            client: http::client(config.timeout_secs)?,
            config,
        })
    }

    fn build_request<'a>(
        messages: &'a [Message],
        system_prompt: &'a str,
        options: &'a GenerationOptions,
    ) -> ChatRequest<'a> {
        let mut api_messages = Vec::with_capacity(messages.len() + 1);
        if !system_prompt.is_empty() {
            api_messages.push(ApiMessage {
                role: "developer",
                content: system_prompt,
            });
        }
        api_messages.extend(messages.iter().map(|m| ApiMessage {
            role: m.role.as_str(),
            content: &m.content,
        }));

        ChatRequest {
            model: &options.model,
            messages: api_messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            response_format: options.response_format.map(|format| match format {
                ResponseFormat::Json => ApiResponseFormat {
                    kind: "json_object",
                },
            }),
        }
    }

    fn extract_text(response: ChatResponse) -> Result<String> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AgentError::Provider("openai: response contained no message".into()))
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        messages: &[Message],
        system_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = Self::build_request(messages, system_prompt, options);

        tracing::debug!(provider = "openai", model = %options.model, "Sending completion request");

        let request = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body);

        let response: ChatResponse = http::send_json("openai", request).await?;
        Self::extract_text(response)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ApiResponseFormat>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ApiResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_prepends_developer_prompt() {
        let messages = vec![Message::user("Request: hi"), Message::assistant("<Answer plan=0>hello</Answer>")];
        let options = GenerationOptions::with_model("gpt-4o-mini");

        let body = serde_json::to_value(OpenAiProvider::build_request(&messages, "protocol", &options)).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0], json!({"role": "developer", "content": "protocol"}));
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][2]["role"], "assistant");
        assert!(body.get("response_format").is_none());
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_request_json_format() {
        let messages = vec![Message::user("give me json")];
        let options = GenerationOptions {
            response_format: Some(ResponseFormat::Json),
            ..GenerationOptions::default()
        };

        let body = serde_json::to_value(OpenAiProvider::build_request(&messages, "", &options)).unwrap();
        assert_eq!(body["response_format"], json!({"type": "json_object"}));
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_extract_text() {
        let response: ChatResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "<Answer plan=0>ok</Answer>"}}]
        }))
        .unwrap();
        assert_eq!(OpenAiProvider::extract_text(response).unwrap(), "<Answer plan=0>ok</Answer>");

        let empty: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(OpenAiProvider::extract_text(empty), Err(AgentError::Provider(_))));
    }

    #[test]
    fn test_base_url_trimmed() {
        let config = OpenAiConfig::new("sk-test").with_base_url("http://localhost:8080/v1/");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
    }
}
