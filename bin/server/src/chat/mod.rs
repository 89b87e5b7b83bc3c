//! Chat API.

pub mod routes;

use persona_conversation::Responder;

pub use routes::{ChatRequest, ChatResponse, HealthResponse, chat, health};

/// Shared application state.
pub struct AppState {
    /// Reply loop shared by every request.
    pub responder: Responder,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(responder: Responder) -> Self {
        Self { responder }
    }
}
