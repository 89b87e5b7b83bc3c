//! Built-in tools offered to every persona.

use crate::error::ToolError;
use crate::tool::{Tool, ToolDefinition};
use async_trait::async_trait;
use persona_core::Result;
use persona_integration::Notifier;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tracing::info;

fn parse_arguments<T: DeserializeOwned>(name: &str, arguments: JsonValue) -> Result<T, ToolError> {
    // Arguments the backend could not parse arrive as the raw string.
    let arguments = match arguments {
        JsonValue::String(raw) => {
            serde_json::from_str(&raw).map_err(|e| ToolError::InvalidInput {
                name: name.to_string(),
                reason: e.to_string(),
            })?
        }
        other => other,
    };

    Ok(serde_json::from_value(arguments).map_err(|e| ToolError::InvalidInput {
        name: name.to_string(),
        reason: e.to_string(),
    })?)
}

fn recorded() -> JsonValue {
    json!({"recorded": "ok"})
}

#[derive(Debug, Deserialize)]
struct UserDetails {
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

/// Records a visitor who wants to get in touch.
pub struct RecordUserDetails {
    notifier: Arc<dyn Notifier>,
}

impl RecordUserDetails {
    /// Tool name advertised to the model.
    pub const NAME: &'static str = "record_user_details";

    /// Creates the tool, pushing through `notifier`.
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl Tool for RecordUserDetails {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            Self::NAME,
            "Use this tool to record that a user is interested in being in touch and provided an email address",
        )
        .with_input_schema(json!({
            "type": "object",
            "properties": {
                "email": {
                    "type": "string",
                    "description": "The email address of this user"
                },
                "name": {
                    "type": "string",
                    "description": "The user's name, if they provided it"
                },
                "notes": {
                    "type": "string",
                    "description": "Any additional information about the conversation that's worth recording to give context"
                }
            },
            "required": ["email"],
            "additionalProperties": false
        }))
    }

    async fn execute(&self, arguments: JsonValue) -> Result<JsonValue, ToolError> {
        let details: UserDetails = parse_arguments(Self::NAME, arguments)?;
        let name = details.name.unwrap_or_else(|| "Name not provided".to_string());
        let notes = details.notes.unwrap_or_else(|| "not provided".to_string());

        info!(email = %details.email, "recording visitor contact details");
        self.notifier
            .notify(&format!(
                "Recording interest from {name} with email {} and notes {notes}",
                details.email
            ))
            .await;
        Ok(recorded())
    }
}

#[derive(Debug, Deserialize)]
struct UnknownQuestion {
    question: String,
}

/// Records a question the persona could not answer.
pub struct RecordUnknownQuestion {
    notifier: Arc<dyn Notifier>,
}

impl RecordUnknownQuestion {
    /// Tool name advertised to the model.
    pub const NAME: &'static str = "record_unknown_question";

    /// Creates the tool, pushing through `notifier`.
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl Tool for RecordUnknownQuestion {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            Self::NAME,
            "Always use this tool to record any question that couldn't be answered as you didn't know the answer",
        )
        .with_input_schema(json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "The question that couldn't be answered"
                }
            },
            "required": ["question"],
            "additionalProperties": false
        }))
    }

    async fn execute(&self, arguments: JsonValue) -> Result<JsonValue, ToolError> {
        let UnknownQuestion { question } = parse_arguments(Self::NAME, arguments)?;

        info!(question = %question, "recording unanswered question");
        self.notifier
            .notify(&format!("Recording {question} asked that I couldn't answer"))
            .await;
        Ok(recorded())
    }
}
