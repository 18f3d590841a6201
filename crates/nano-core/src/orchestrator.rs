//! Orchestration Loop
//!
//! Drives the tag protocol for one conversation. Each call to
//! [`Agent::send_message`] requests completions until the model produces
//! something that is not a tool execution:
//!
//! ```text
//! user message ──► completion ──► <Plan>?    upsert plan table
//!                      ▲          <Execute>? ──► malformed: retry (bounded)
//!                      │                     └─► dispatch tool, append result ─┐
//!                      └──────────────────────────────────────────────────────┘
//!                                 otherwise  ──► append, optionally reformat <Answer>, stop
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::{AgentError, Result};
use crate::message::Role;
use crate::prompt;
use crate::protocol::{self, Execution, ExecutionRequest, Plan};
use crate::provider::{CompletionProvider, GenerationOptions};
use crate::session::{ConversationSession, SessionId};
use crate::tool::{Tool, ToolRegistry};
use crate::widget::{WidgetDescriptor, WidgetRegistry};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Malformed Execute payloads tolerated per message before giving up
    pub max_payload_retries: usize,

    /// Tool executions allowed per message
    pub max_iterations: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_payload_retries: 3,
            max_iterations: 16,
        }
    }
}

/// Progress reported while a message is processed
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A plan was created or amended
    Plan(Plan),
    /// A tool was executed
    Execution(ExecutionRequest),
    /// The terminal completion of the message
    Response { text: String },
}

/// The tag-protocol orchestrator
pub struct Agent {
    session: ConversationSession,
    tools: Arc<ToolRegistry>,
    widgets: Arc<WidgetRegistry>,
    plans: BTreeMap<u64, Vec<String>>,
    answer_instruction: Option<String>,
    events: Option<UnboundedSender<AgentEvent>>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent over an existing session
    pub fn new(
        session: ConversationSession,
        tools: Arc<ToolRegistry>,
        widgets: Arc<WidgetRegistry>,
        config: AgentConfig,
    ) -> Self {
        tracing::info!(session = %session.id(), "Initializing agent");
        Self {
            session,
            tools,
            widgets,
            plans: BTreeMap::new(),
            answer_instruction: None,
            events: None,
            config,
        }
    }

    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// Process one user message and return the terminal completion.
    ///
    /// When an answer instruction is set and the model answered with an
    /// `<Answer>` tag, the returned text is the reformatted answer.
    pub async fn send_message(&mut self, message: &str) -> Result<String> {
        tracing::info!(session = %self.session.id(), "Processing new message");
        tracing::debug!(content = message, "Message content");

        if self.session.is_empty() {
            let seed = self.seed_message(message)?;
            self.session.append(seed);
        } else {
            self.session.append(message);
        }

        let mut retries = 0;
        let mut executions = 0;

        loop {
            let response = self.session.latest_completion(None).await?;

            if let Some(plan) = protocol::parse_plan(&response) {
                tracing::info!("Received plan {} with {} steps", plan.id, plan.steps.len());
                self.plans.insert(plan.id, plan.steps.clone());
                self.emit(AgentEvent::Plan(plan));
            }

            match protocol::parse_execution(&response) {
                Execution::Malformed { error, .. } => {
                    retries += 1;
                    tracing::warn!(
                        %error,
                        "JSON parse error, retry {}/{}",
                        retries,
                        self.config.max_payload_retries
                    );
                    if retries > self.config.max_payload_retries {
                        tracing::error!("Max retries reached for JSON parsing");
                        return Err(AgentError::ToolPayloadUnparseable { attempts: retries });
                    }
                }
                Execution::Request(request) => {
                    executions += 1;
                    if executions > self.config.max_iterations {
                        tracing::error!("Tool execution limit reached");
                        return Err(AgentError::MaxIterations(self.config.max_iterations));
                    }

                    tracing::info!(step = request.step, "Executing tool for plan {}", request.plan_id);
                    let result = self.tools.execute(&request.invocation).await?;

                    self.session.push(response, Role::Assistant, None);
                    self.session.append(result);
                    self.emit(AgentEvent::Execution(request));
                }
                Execution::Absent => {
                    self.session.push(response.as_str(), Role::Assistant, None);

                    let formatted = self.reformat_answer(&response).await?;
                    let text = formatted.unwrap_or(response);
                    self.emit(AgentEvent::Response { text: text.clone() });
                    return Ok(text);
                }
            }
        }
    }

    /// Ask the model to restate an `<Answer>` under the configured instruction
    async fn reformat_answer(&mut self, response: &str) -> Result<Option<String>> {
        let Some(instruction) = self.answer_instruction.as_deref() else {
            return Ok(None);
        };
        if protocol::parse_answer(response).is_none() {
            return Ok(None);
        }

        tracing::debug!("Reformatting answer");
        self.session.append(prompt::answer_instruction(instruction));
        let formatted = self.session.latest_completion(None).await?;
        self.session.push(formatted.as_str(), Role::Assistant, None);
        Ok(Some(formatted))
    }

    fn seed_message(&self, message: &str) -> Result<String> {
        let tools = self.tools.catalog_json()?;
        let widgets = if self.widgets.is_empty() {
            None
        } else {
            Some(self.widgets.catalog_json()?)
        };
        Ok(prompt::seed_message(message, &tools, widgets.as_deref()))
    }

    fn emit(&self, event: AgentEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).is_err() {
                tracing::debug!("Event receiver dropped");
            }
        }
    }

    pub fn set_answer_instruction(&mut self, instruction: impl Into<String>) {
        self.answer_instruction = Some(instruction.into());
    }

    pub fn clear_answer_instruction(&mut self) {
        self.answer_instruction = None;
    }

    pub fn answer_instruction(&self) -> Option<&str> {
        self.answer_instruction.as_deref()
    }

    /// Attach (or replace) the progress event sink
    pub fn set_event_sink(&mut self, events: Option<UnboundedSender<AgentEvent>>) {
        self.events = events;
    }

    /// Plan table: plan id to its current steps
    pub const fn plans(&self) -> &BTreeMap<u64, Vec<String>> {
        &self.plans
    }

    pub fn plan(&self, id: u64) -> Option<&[String]> {
        self.plans.get(&id).map(Vec::as_slice)
    }

    pub const fn session(&self) -> &ConversationSession {
        &self.session
    }

    /// Forget the conversation and every plan
    pub fn reset(&mut self) {
        self.session.clear();
        self.plans.clear();
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn widgets(&self) -> &WidgetRegistry {
        &self.widgets
    }

    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn CompletionProvider>>,
    tools: Arc<ToolRegistry>,
    widgets: Arc<WidgetRegistry>,
    instructions: String,
    options: GenerationOptions,
    session_id: Option<SessionId>,
    answer_instruction: Option<String>,
    events: Option<UnboundedSender<AgentEvent>>,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: Arc::new(ToolRegistry::new()),
            widgets: Arc::new(WidgetRegistry::new()),
            instructions: String::new(),
            options: GenerationOptions::default(),
            session_id: None,
            answer_instruction: None,
            events: None,
            config: AgentConfig::default(),
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Result<Self> {
        Arc::make_mut(&mut self.tools).register(tool)?;
        Ok(self)
    }

    pub fn register_tools<I>(mut self, tools: I) -> Result<Self>
    where
        I: IntoIterator<Item = Arc<dyn Tool>>,
    {
        Arc::make_mut(&mut self.tools).register_all(tools)?;
        Ok(self)
    }

    /// Share an already populated registry
    #[must_use]
    pub fn tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = tools;
        self
    }

    pub fn register_widgets<I>(mut self, widgets: I) -> Result<Self>
    where
        I: IntoIterator<Item = WidgetDescriptor>,
    {
        Arc::make_mut(&mut self.widgets).register_all(widgets)?;
        Ok(self)
    }

    #[must_use]
    pub fn widgets(mut self, widgets: Arc<WidgetRegistry>) -> Self {
        self.widgets = widgets;
        self
    }

    /// Extra instructions appended to the protocol system prompt
    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    #[must_use]
    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.options.model = model.into();
        self
    }

    #[must_use]
    pub fn session_id(mut self, id: SessionId) -> Self {
        self.session_id = Some(id);
        self
    }

    #[must_use]
    pub fn answer_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.answer_instruction = Some(instruction.into());
        self
    }

    #[must_use]
    pub fn events(mut self, events: UnboundedSender<AgentEvent>) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub const fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    #[must_use]
    pub const fn max_payload_retries(mut self, max: usize) -> Self {
        self.config.max_payload_retries = max;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        if !self.instructions.is_empty() {
            tracing::debug!(instructions = %self.instructions, "Using additional instructions");
        }

        let mut session =
            ConversationSession::new(provider, prompt::system_prompt_with(&self.instructions))
                .with_options(self.options);
        if let Some(id) = self.session_id {
            session = session.with_id(id);
        }

        let mut agent = Agent::new(session, self.tools, self.widgets, self.config);
        agent.answer_instruction = self.answer_instruction;
        agent.events = self.events;
        Ok(agent)
    }
}
