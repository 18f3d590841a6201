//! # nano-core
//!
//! Tag-protocol agent orchestration with a provider-agnostic completion
//! abstraction, a tool registry and display-only widget descriptors.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                              Agent                               │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────────────────┐  │
//! │  │   Protocol   │  │    Tools /   │  │  ConversationSession   │  │
//! │  │    Parser    │──│   Widgets    │──│  └ CompletionProvider  │  │
//! │  └──────────────┘  └──────────────┘  └────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The model answers in free text carrying `<Plan>`, `<Execute>` and
//! `<Answer>` tags; the [`Agent`] turns those into plan updates, tool calls
//! and terminal responses.

pub mod error;
pub mod message;
pub mod orchestrator;
pub mod prompt;
pub mod protocol;
pub mod provider;
pub mod session;
pub mod tool;
pub mod widget;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{AgentError, Result, ToolError};
pub use message::{Content, Message, ResponseFormat, Role};
pub use orchestrator::{Agent, AgentBuilder, AgentConfig, AgentEvent};
pub use protocol::{Answer, Execution, ExecutionRequest, Plan, WidgetInvocation};
pub use provider::{CompletionProvider, GenerationOptions};
pub use session::{ConversationSession, SessionId};
pub use tool::{ParamSpec, Tool, ToolDescriptor, ToolInvocation, ToolParams, ToolRegistry};
pub use widget::{WidgetDescriptor, WidgetRegistry};
