//! Conversation Messages
//!
//! Standard message format stored in a [`ConversationSession`](crate::session::ConversationSession)
//! and handed to completion providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input and tool results
    User,
    /// Assistant (LLM) response
    Assistant,
}

impl Role {
    /// Wire name used by chat-style APIs
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response format a message may request from the next completion
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    Json,
}

/// Content accepted by [`ConversationSession::push`](crate::session::ConversationSession::push).
///
/// Providers only accept text, so structured values are serialized on the way in.
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Text(String),
    Structured(serde_json::Value),
}

impl Content {
    /// Flatten into the text that gets stored.
    ///
    /// A bare JSON string is stored as its raw text, everything else as compact JSON.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) | Self::Structured(serde_json::Value::String(text)) => text,
            Self::Structured(value) => value.to_string(),
        }
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<&String> for Content {
    fn from(text: &String) -> Self {
        Self::Text(text.clone())
    }
}

impl From<serde_json::Value> for Content {
    fn from(value: serde_json::Value) -> Self {
        Self::Structured(value)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Content {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self::Structured(serde_json::Value::Object(map))
    }
}

/// A single message in a conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Text content
    pub content: String,

    /// Response format requested from the completion that follows this message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,

    /// Timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            response_format: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Request a response format for the next completion
    #[must_use]
    pub const fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert!(msg.response_format.is_none());
    }

    #[test]
    fn test_structured_content_is_serialized() {
        let value = json!({"weather": [{"temperature": 21.5}]});
        let text = Content::from(value.clone()).into_text();
        assert_eq!(text, serde_json::to_string(&value).unwrap());
    }

    #[test]
    fn test_json_string_content_kept_raw() {
        let text = Content::from(json!("plain")).into_text();
        assert_eq!(text, "plain");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = Message::assistant("x").with_response_format(ResponseFormat::Json);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["response_format"], "json");
    }
}
