//! Chat and health routes.

use axum::{Json, extract::State};
use persona_core::SessionKey;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::AppState;

/// Body of `POST /chat`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The visitor's message.
    pub message: String,
    /// Conversation to continue.
    #[serde(default)]
    pub session_id: SessionKey,
}

/// Reply to `POST /chat`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Reply to `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Answers a visitor message.
///
/// Always succeeds once the body parses; upstream failures surface as the
/// apology text.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    debug!(session = %request.session_id, "chat request");
    let reply = state
        .responder
        .respond(&request.session_id, &request.message)
        .await;
    Json(ChatResponse {
        response: reply.text,
    })
}

/// Liveness check.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}
