//! Ollama LLM Provider
//!
//! Implementation of `CompletionProvider` for local Ollama inference.

use async_trait::async_trait;
use nano_core::{
    error::{AgentError, Result},
    message::{Message, ResponseFormat, Role},
    provider::{CompletionProvider, GenerationOptions},
};
use ollama_rs::{
    Ollama,
    generation::{
        chat::{ChatMessage, MessageRole, request::ChatMessageRequest},
        parameters::FormatType,
    },
    models::ModelOptions,
};

/// Ollama provider configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
        }
    }
}

impl OllamaConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let host = lookup("OLLAMA_HOST").unwrap_or(defaults.host);
        let port = lookup("OLLAMA_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        Self { host, port }
    }
}

/// Ollama LLM provider
pub struct OllamaProvider {
    client: Ollama,
}

impl OllamaProvider {
    /// Create a new Ollama provider with custom host/port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::from_config(&OllamaConfig {
            host: host.into(),
            port,
        })
    }

    /// Create from configuration
    pub fn from_config(config: &OllamaConfig) -> Self {
        tracing::debug!(host = %config.host, port = config.port, "Configuring Ollama provider");
        Self {
            client: Ollama::new(&config.host, config.port),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_config(&OllamaConfig::from_env())
    }

    /// Convert history to Ollama format, system prompt first
    fn convert_messages(messages: &[Message], system_prompt: &str) -> Vec<ChatMessage> {
        let prompt = (!system_prompt.is_empty())
            .then(|| ChatMessage::new(MessageRole::System, system_prompt.to_owned()));

        prompt
            .into_iter()
            .chain(messages.iter().map(|m| {
                let role = match m.role {
                    Role::Assistant => MessageRole::Assistant,
                    Role::System | Role::User => MessageRole::User,
                };
                ChatMessage::new(role, m.content.clone())
            }))
            .collect()
    }

    fn build_options(opts: &GenerationOptions) -> ModelOptions {
        let num_predict = i32::try_from(opts.max_tokens).unwrap_or(i32::MAX);
        let options = ModelOptions::default().num_predict(num_predict);
        match opts.temperature {
            Some(t) => options.temperature(t),
            None => options,
        }
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(
        &self,
        messages: &[Message],
        system_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        let mut request = ChatMessageRequest::new(
            options.model.clone(),
            Self::convert_messages(messages, system_prompt),
        )
        .options(Self::build_options(options));

        if options.response_format == Some(ResponseFormat::Json) {
            request = request.format(FormatType::Json);
        }

        tracing::debug!(provider = "ollama", model = %options.model, "Sending completion request");

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AgentError::Provider(e.to_string()))?;

        Ok(response.message.content)
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.list_local_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OllamaConfig::default();
        assert_eq!(config.host, "http://localhost");
        assert_eq!(config.port, 11434);
    }

    #[test]
    fn test_config_lookup() {
        let config = OllamaConfig::from_lookup(|key| match key {
            "OLLAMA_HOST" => Some("http://gpu-box".into()),
            "OLLAMA_PORT" => Some("not-a-port".into()),
            _ => None,
        });
        assert_eq!(config.host, "http://gpu-box");
        assert_eq!(config.port, 11434);
    }

    #[test]
    fn test_message_conversion() {
        let messages = vec![Message::user("Hello"), Message::assistant("Hi"), Message::system("Note")];

        let converted = OllamaProvider::convert_messages(&messages, "You are helpful.");
        assert_eq!(converted.len(), 4);
        assert_eq!(converted[0].content, "You are helpful.");
        assert_eq!(converted[1].content, "Hello");
        assert_eq!(converted[2].content, "Hi");
        assert_eq!(converted[3].content, "Note");

        let without_prompt = OllamaProvider::convert_messages(&messages, "");
        assert_eq!(without_prompt.len(), 3);
    }
}
