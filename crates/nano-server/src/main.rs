//! nano-agent HTTP Server
//!
//! Axum-based server providing REST API and WebSocket endpoints for the
//! travel assistant.

mod handlers;
mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nano_core::{ToolRegistry, WidgetRegistry};
use nano_runtime::{ProviderSettings, build_provider};
use travel_tools::{InMemoryCatalog, TRAVEL_INSTRUCTIONS, default_tools, default_widgets};

use crate::handlers::{chat_handler, chat_stream_handler, clear_session, health_check};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/stream", get(chat_stream_handler))
        .route("/api/sessions/{id}", delete(clear_session))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={}", key, raw);
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = ProviderSettings::from_env();
    let provider = build_provider(&settings)?;

    if provider.health_check().await.unwrap_or(false) {
        tracing::info!("✓ Connected to {}", provider.name());
    } else {
        tracing::warn!("⚠ {} not reachable - chat requests will fail", provider.name());
    }

    let mut tools = ToolRegistry::new();
    tools.register_all(default_tools(Arc::new(InMemoryCatalog::default()))?)?;

    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    let mut widgets = WidgetRegistry::new();
    widgets.register_all(default_widgets())?;

    let answer_instruction = std::env::var("ANSWER_INSTRUCTION")
        .ok()
        .filter(|s| !s.trim().is_empty());
    if answer_instruction.is_some() {
        tracing::info!("Answers will be reformatted");
    }

    let state = AppState::new(
        provider,
        Arc::new(tools),
        Arc::new(widgets),
        settings.generation_options(),
    )
    .with_instructions(TRAVEL_INSTRUCTIONS)
    .with_answer_instruction(answer_instruction.as_deref())
    .with_session_limits(
        env_parse("SESSION_IDLE_SECS").map_or(state::DEFAULT_SESSION_IDLE, Duration::from_secs),
        env_parse("MAX_SESSIONS").unwrap_or(state::DEFAULT_MAX_SESSIONS),
    );

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("nano-agent server running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health             - Health check");
    tracing::info!("  POST   /api/chat           - Send message");
    tracing::info!("  GET    /api/chat/stream    - WebSocket with progress");
    tracing::info!("  DELETE /api/sessions/{{id}} - Clear a session");

    axum::serve(listener, router(state)).await?;

    Ok(())
}
