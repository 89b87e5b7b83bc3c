//! Application assembly.
//!
//! Builds the responder from configuration and mounts the HTTP routes.

use crate::chat::{self, AppState};
use crate::config::ServerConfig;
use crate::error::StartupError;
use axum::{
    Router,
    routing::{get, post},
};
use persona_ai::{LlmEvaluator, OpenAiBackend};
use persona_conversation::{
    InMemorySessionStore, RecordUnknownQuestion, RecordUserDetails, Responder, ToolRegistry,
};
use persona_core::Result;
use persona_integration::{LogNotifier, Notifier, PushoverNotifier};
use persona_profile::Persona;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Loads the persona and wires every service the routes need.
///
/// # Errors
///
/// Returns an error if the persona configuration file is unusable or an
/// outbound client cannot be built.
pub fn build_state(config: &ServerConfig) -> Result<AppState, StartupError> {
    let persona = Persona::load(&config.profile).map_err(|e| StartupError::Persona {
        reason: e.to_string(),
    })?;

    let notifier: Arc<dyn Notifier> = match config.pushover.pushover_config() {
        Some(pushover) => Arc::new(PushoverNotifier::new(pushover).map_err(|e| {
            StartupError::Client {
                name: "pushover",
                reason: e.to_string(),
            }
        })?),
        None => {
            info!("pushover credentials not set, notifications will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let mut tools = ToolRegistry::new();
    tools.register(RecordUserDetails::new(notifier.clone()));
    tools.register(RecordUnknownQuestion::new(notifier));
    if let Some(schemas) = persona.tool_schemas() {
        tools = tools.with_schemas(schemas);
    }
    let advertised: Vec<&str> = tools.definitions().iter().map(|d| d.name.as_str()).collect();
    info!(tools = ?advertised, "tools advertised");

    let backend = OpenAiBackend::new(config.llm.openai_config()).map_err(|e| {
        StartupError::Client {
            name: "llm",
            reason: e.to_string(),
        }
    })?;

    let mut responder = Responder::new(
        Arc::new(backend),
        Arc::new(tools),
        Arc::new(InMemorySessionStore::new()),
        persona.system_prompt(),
    )
    .with_config(config.responder.clone());

    match config.evaluation.openai_config() {
        Some(evaluation) => {
            let judge = OpenAiBackend::new(evaluation).map_err(|e| StartupError::Client {
                name: "evaluation",
                reason: e.to_string(),
            })?;
            info!(model = %config.evaluation.model, "reply evaluation enabled");
            responder = responder.with_evaluator(Arc::new(LlmEvaluator::new(
                Arc::new(judge),
                persona.evaluator_prompt(),
            )));
        }
        None => info!("reply evaluation disabled"),
    }

    Ok(AppState::new(responder))
}

/// Mounts the API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat", post(chat::chat))
        .route("/health", get(chat::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
