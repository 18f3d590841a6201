//! HTTP/WebSocket Handlers

use axum::{
    Json,
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use nano_core::{AgentError, AgentEvent, SessionId, protocol};

use crate::state::{AppState, SharedAgent};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub provider_connected: bool,
    pub tools: usize,
    pub widgets: usize,
    pub sessions: usize,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// A widget the client should render next to the reply
#[derive(Debug, Serialize)]
pub struct WidgetView {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    /// Raw terminal completion
    pub reply: String,
    /// User-visible text extracted from the reply
    pub display: String,
    pub widgets: Vec<WidgetView>,
    /// Progress lines collected while the message was processed
    pub status: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

// ============================================================================
// Rendering
// ============================================================================

/// Human-readable progress lines for an event
pub fn status_lines(event: &AgentEvent) -> Vec<String> {
    match event {
        AgentEvent::Plan(plan) => plan
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| format!("Step {}: {}", i + 1, step.trim()))
            .collect(),
        AgentEvent::Execution(request) => {
            vec![format!("Checking information using {}...", request.tool_name())]
        }
        AgentEvent::Response { .. } => Vec::new(),
    }
}

fn widget_views(reply: &str) -> Vec<WidgetView> {
    protocol::parse_widgets(reply)
        .into_iter()
        .map(|w| match w.params() {
            Ok(params) => WidgetView {
                name: w.name,
                params: Some(params),
                error: None,
            },
            Err(e) => {
                tracing::warn!(widget = %w.name, "Error parsing widget params: {}", e);
                WidgetView {
                    name: w.name,
                    params: None,
                    error: Some(format!("Error parsing widget params: {}", w.payload)),
                }
            }
        })
        .collect()
}

fn render_reply(session_id: &SessionId, reply: String, status: Vec<String>) -> ChatResponse {
    let formatted = !protocol::formatted_answer_segments(&reply).is_empty();
    ChatResponse {
        session_id: session_id.to_string(),
        display: protocol::display_text(&reply, formatted),
        widgets: widget_views(&reply),
        reply,
        status,
    }
}

fn error_status(err: &AgentError) -> (StatusCode, &'static str) {
    match err {
        AgentError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
        AgentError::ProviderUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "PROVIDER_UNAVAILABLE"),
        AgentError::Provider(_) | AgentError::Auth(_) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "AGENT_ERROR"),
    }
}

fn api_error(err: &AgentError) -> ApiError {
    tracing::error!("Agent error: {}", err);
    let (status, code) = error_status(err);
    (
        status,
        Json(ErrorResponse {
            error: err.user_message(),
            code: code.into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.provider.name().to_owned(),
        provider_connected,
        tools: state.tools.len(),
        widgets: state.widgets.len(),
        sessions: state.session_count().await,
    })
}

/// Run one message through a session's agent, forwarding progress events
async fn process(
    agent: SharedAgent,
    message: String,
    events: mpsc::UnboundedSender<AgentEvent>,
) -> nano_core::Result<String> {
    let mut agent = agent.lock_owned().await;
    agent.set_event_sink(Some(events));
    let result = agent.send_message(&message).await;
    agent.set_event_sink(None);
    result
}

/// Main chat endpoint (non-streaming)
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let (session_id, agent) = state
        .session(payload.session_id.as_deref())
        .await
        .map_err(|e| api_error(&e))?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let reply = process(agent, payload.message, tx)
        .await
        .map_err(|e| api_error(&e))?;

    let mut status = Vec::new();
    while let Ok(event) = rx.try_recv() {
        status.extend(status_lines(&event));
    }

    Ok(Json(render_reply(&session_id, reply, status)))
}

/// Forget a session
pub async fn clear_session(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    if state.remove_session(&id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// WebSocket chat with live progress
pub async fn chat_stream_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_stream(socket, state))
}

fn frame(value: &impl Serialize) -> Message {
    let text = serde_json::to_string(value).unwrap_or_else(|e| {
        serde_json::json!({"type": "error", "error": e.to_string()}).to_string()
    });
    Message::Text(text.into())
}

fn error_frame(error: &str, code: &str) -> Message {
    frame(&serde_json::json!({"type": "error", "error": error, "code": code}))
}

async fn handle_stream(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::error!("WebSocket error: {}", e);
                break;
            }
            _ => continue,
        };

        let request: ChatRequest = match serde_json::from_str(&msg) {
            Ok(r) => r,
            Err(e) => {
                let _ = sender.send(error_frame(&e.to_string(), "BAD_REQUEST")).await;
                continue;
            }
        };

        let (session_id, agent) = match state.session(request.session_id.as_deref()).await {
            Ok(found) => found,
            Err(e) => {
                let (_, code) = error_status(&e);
                let _ = sender.send(error_frame(&e.user_message(), code)).await;
                continue;
            }
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        let work = tokio::spawn(process(agent, request.message, tx));

        let mut status = Vec::new();
        let mut open = true;
        while let Some(event) = rx.recv().await {
            let lines = status_lines(&event);
            if lines.is_empty() {
                continue;
            }
            let progress = serde_json::json!({"type": "progress", "event": &event, "status": &lines});
            status.extend(lines);
            if open && sender.send(frame(&progress)).await.is_err() {
                open = false;
            }
        }

        let outcome = match work.await {
            Ok(Ok(reply)) => {
                let response = render_reply(&session_id, reply, status);
                frame(&serde_json::json!({"type": "reply", "response": response}))
            }
            Ok(Err(e)) => {
                tracing::error!("Agent error: {}", e);
                let (_, code) = error_status(&e);
                error_frame(&e.user_message(), code)
            }
            Err(e) => {
                tracing::error!("Agent task failed: {}", e);
                error_frame("An unexpected error occurred.", "AGENT_ERROR")
            }
        };

        if !open || sender.send(outcome).await.is_err() {
            break;
        }
    }
}
