//! Session Management
//!
//! A [`ConversationSession`] owns the ordered message history and the system
//! prompt, and delegates completions to a [`CompletionProvider`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AgentError, Result};
use crate::message::{Content, Message, ResponseFormat, Role};
use crate::provider::{CompletionProvider, GenerationOptions};

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Conversation history bound to one completion provider
pub struct ConversationSession {
    id: SessionId,
    provider: Arc<dyn CompletionProvider>,
    system_prompt: String,
    history: Vec<Message>,
    defaults: GenerationOptions,
}

impl ConversationSession {
    /// Create an empty session
    pub fn new(provider: Arc<dyn CompletionProvider>, system_prompt: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            provider,
            system_prompt: system_prompt.into(),
            history: Vec::new(),
            defaults: GenerationOptions::default(),
        }
    }

    /// Create with specific ID
    #[must_use]
    pub fn with_id(mut self, id: SessionId) -> Self {
        self.id = id;
        self
    }

    /// Set the generation options used when a call passes none
    #[must_use]
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.defaults = options;
        self
    }

    pub const fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = prompt.into();
    }

    pub fn provider(&self) -> &Arc<dyn CompletionProvider> {
        &self.provider
    }

    pub const fn options(&self) -> &GenerationOptions {
        &self.defaults
    }

    /// Append a user message
    pub fn append(&mut self, content: impl Into<Content>) -> &mut Self {
        self.push(content, Role::User, None)
    }

    /// Append a message with an explicit role and optional response format hint
    pub fn push(
        &mut self,
        content: impl Into<Content>,
        role: Role,
        response_format: Option<ResponseFormat>,
    ) -> &mut Self {
        let mut message = Message::new(role, content.into().into_text());
        message.response_format = response_format;
        self.history.push(message);
        self
    }

    /// Request a completion over the full history.
    ///
    /// When the most recent message asked for a response format, it overrides
    /// whatever `options` carries.
    pub async fn latest_completion(&self, options: Option<GenerationOptions>) -> Result<String> {
        let last = self.history.last().ok_or(AgentError::EmptyHistory)?;

        let mut options = options.unwrap_or_else(|| self.defaults.clone());
        if let Some(format) = last.response_format {
            options.response_format = Some(format);
        }

        tracing::debug!(
            provider = self.provider.name(),
            messages = self.history.len(),
            "Requesting completion"
        );

        self.provider
            .generate(&self.history, &self.system_prompt, &options)
            .await
    }

    /// Reset history to empty
    pub fn clear(&mut self) -> &mut Self {
        self.history.clear();
        self
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn last(&self) -> Option<&Message> {
        self.history.last()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

impl std::fmt::Debug for ConversationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationSession")
            .field("id", &self.id)
            .field("provider", &self.provider.name())
            .field("messages", &self.history.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;
    use serde_json::json;

    fn session_with(responses: Vec<&str>) -> (Arc<ScriptedProvider>, ConversationSession) {
        let provider = Arc::new(ScriptedProvider::new(responses));
        let session = ConversationSession::new(provider.clone(), "be brief");
        (provider, session)
    }

    #[tokio::test]
    async fn test_empty_history_fails() {
        let (provider, session) = session_with(vec!["never"]);
        let err = session.latest_completion(None).await.unwrap_err();
        assert!(matches!(err, AgentError::EmptyHistory));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_completion_sees_history_and_prompt() {
        let (provider, mut session) = session_with(vec!["hi there"]);
        session.append("hello").push("previous", Role::Assistant, None);

        let text = session.latest_completion(None).await.unwrap();
        assert_eq!(text, "hi there");

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].system_prompt, "be brief");
        assert_eq!(calls[0].messages.len(), 2);
        assert_eq!(calls[0].messages[1].role, Role::Assistant);
        assert!(calls[0].options.response_format.is_none());
    }

    #[tokio::test]
    async fn test_json_hint_propagates_from_last_message() {
        let (provider, mut session) = session_with(vec!["{}", "plain"]);
        session.push("give json", Role::User, Some(ResponseFormat::Json));
        session.latest_completion(None).await.unwrap();

        session.append("now text");
        session.latest_completion(None).await.unwrap();

        let calls = provider.calls();
        assert_eq!(calls[0].options.response_format, Some(ResponseFormat::Json));
        assert!(calls[1].options.response_format.is_none());
    }

    #[test]
    fn test_structured_content_round_trip() {
        let (_, mut session) = session_with(vec![]);
        let original = json!({"execute_tool": "weather", "params": {"lat": 52.5}});
        session.append(original.clone());

        assert_eq!(
            session.history()[0].content,
            serde_json::to_string(&original).unwrap()
        );
    }

    #[test]
    fn test_clear() {
        let (_, mut session) = session_with(vec![]);
        session.append("a").append("b");
        assert_eq!(session.len(), 2);
        session.clear();
        assert!(session.is_empty());
    }
}
