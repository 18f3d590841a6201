//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// A completion was requested before any message was appended
    #[error("No messages in history")]
    EmptyHistory,

    /// The model kept emitting Execute payloads that are not valid JSON
    #[error("Tool payload unparseable after {attempts} attempts")]
    ToolPayloadUnparseable { attempts: usize },

    /// Tool not found in registry
    #[error("Tool {0} not found")]
    ToolNotFound(String),

    /// Tool raised an error while executing
    #[error("Tool {tool} execution failed: {cause}")]
    ToolExecutionFailed { tool: String, cause: String },

    /// A tool or widget with the same name is already registered
    #[error("{kind} {name} already registered")]
    DuplicateRegistration { kind: &'static str, name: String },

    /// Too many tool executions within one message
    #[error("Maximum iterations ({0}) reached")]
    MaxIterations(usize),

    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Check if error is retryable by the caller
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_) | Self::RateLimited(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyHistory => "There is nothing to respond to yet.".into(),
            Self::ToolPayloadUnparseable { .. } => {
                "The assistant produced an invalid tool request. Please rephrase.".into()
            }
            Self::ToolNotFound(name) => format!("The tool '{name}' is not available."),
            Self::ToolExecutionFailed { tool, .. } => format!("The tool '{tool}' failed."),
            Self::MaxIterations(_) => {
                "The request took too many steps. Please try a simpler query.".into()
            }
            Self::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            Self::RateLimited(_) => "You've made too many requests. Please wait a moment.".into(),
            Self::Auth(_) => "Authentication failed. Please check your credentials.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

/// Errors raised by tool implementations.
///
/// These never leave the registry as-is; dispatch wraps them in
/// [`AgentError::ToolExecutionFailed`].
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("missing required parameter: {0}")]
    MissingParam(String),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParam { name: String, reason: String },

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
