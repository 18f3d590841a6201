//! Application State

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::{Duration, Instant};

use nano_core::{
    Agent, CompletionProvider, GenerationOptions, Result, SessionId, ToolRegistry, WidgetRegistry,
};
use tokio::sync::{Mutex, RwLock};

/// One conversation; the mutex serializes messages within a session
pub type SharedAgent = Arc<Mutex<Agent>>;

pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// A live session and when it was last handed out
pub struct SessionEntry {
    pub agent: SharedAgent,
    pub last_used: Instant,
}

impl SessionEntry {
    /// Held by a request in flight
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.agent) > 1
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// LLM provider (Ollama, OpenAI, Anthropic)
    pub provider: Arc<dyn CompletionProvider>,

    /// Tool registry shared by every session
    pub tools: Arc<ToolRegistry>,

    /// Widget descriptors shared by every session
    pub widgets: Arc<WidgetRegistry>,

    /// Generation defaults for new sessions
    pub options: GenerationOptions,

    /// Extra instructions appended to the protocol prompt
    pub instructions: Arc<str>,

    /// Optional answer reformatting instruction for new sessions
    pub answer_instruction: Option<Arc<str>>,

    /// Sessions unused for this long are dropped
    pub session_idle: Duration,

    /// Upper bound on live sessions; the least recently used goes first
    pub max_sessions: usize,

    /// Live sessions by id
    pub sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        tools: Arc<ToolRegistry>,
        widgets: Arc<WidgetRegistry>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            provider,
            tools,
            widgets,
            options,
            instructions: Arc::from(""),
            answer_instruction: None,
            session_idle: DEFAULT_SESSION_IDLE,
            max_sessions: DEFAULT_MAX_SESSIONS,
            sessions: Arc::default(),
        }
    }

    #[must_use]
    pub fn with_instructions(mut self, instructions: &str) -> Self {
        self.instructions = Arc::from(instructions);
        self
    }

    #[must_use]
    pub fn with_answer_instruction(mut self, instruction: Option<&str>) -> Self {
        self.answer_instruction = instruction.map(Arc::from);
        self
    }

    #[must_use]
    pub fn with_session_limits(mut self, idle: Duration, max_sessions: usize) -> Self {
        self.session_idle = idle;
        self.max_sessions = max_sessions.max(1);
        self
    }

    fn create_agent(&self, id: SessionId) -> Result<Agent> {
        let builder = Agent::builder()
            .provider(Arc::clone(&self.provider))
            .tools(Arc::clone(&self.tools))
            .widgets(Arc::clone(&self.widgets))
            .instructions(&*self.instructions)
            .options(self.options.clone())
            .session_id(id);

        match &self.answer_instruction {
            Some(instruction) => builder.answer_instruction(&**instruction).build(),
            None => builder.build(),
        }
    }

    /// Look up a session, creating it when the id is new or absent
    pub async fn session(&self, id: Option<&str>) -> Result<(SessionId, SharedAgent)> {
        let id = id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map_or_else(SessionId::new, SessionId::from_string);

        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        self.evict_idle(&mut sessions, &id, now);

        let agent = match sessions.entry(id.clone()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().last_used = now;
                Arc::clone(&entry.get().agent)
            }
            Entry::Vacant(entry) => {
                tracing::info!(session = %id, "Creating session");
                let agent = Arc::new(Mutex::new(self.create_agent(id.clone())?));
                Arc::clone(
                    &entry
                        .insert(SessionEntry {
                            agent,
                            last_used: now,
                        })
                        .agent,
                )
            }
        };

        self.evict_over_capacity(&mut sessions, &id);
        Ok((id, agent))
    }

    /// Drop sessions idle past the timeout, sparing `keep` and busy ones
    fn evict_idle(
        &self,
        sessions: &mut HashMap<SessionId, SessionEntry>,
        keep: &SessionId,
        now: Instant,
    ) {
        sessions.retain(|id, entry| {
            let idle = now.saturating_duration_since(entry.last_used) >= self.session_idle;
            let evict = idle && id != keep && !entry.in_use();
            if evict {
                tracing::info!(session = %id, "Evicting idle session");
            }
            !evict
        });
    }

    /// Drop least recently used sessions until the cap holds
    fn evict_over_capacity(&self, sessions: &mut HashMap<SessionId, SessionEntry>, keep: &SessionId) {
        while sessions.len() > self.max_sessions {
            let oldest = sessions
                .iter()
                .filter(|(id, entry)| *id != keep && !entry.in_use())
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| id.clone());
            let Some(oldest) = oldest else {
                tracing::warn!(live = sessions.len(), "Session cap exceeded, all sessions busy");
                break;
            };
            tracing::info!(session = %oldest, "Evicting least recently used session");
            sessions.remove(&oldest);
        }
    }

    /// Drop a session; returns whether it existed
    pub async fn remove_session(&self, id: &str) -> bool {
        let removed = self
            .sessions
            .write()
            .await
            .remove(&SessionId::from_string(id))
            .is_some();
        if removed {
            tracing::info!(session = id, "Session removed");
        }
        removed
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
