//! Tool registry for conversation mode.
//!
//! Tools are side-effecting functions the model may ask for during a
//! turn. The registry dispatches calls by name and never lets a tool
//! failure abort the turn: unknown tools and rejected arguments both
//! produce an empty JSON object.

use crate::error::ToolError;
use crate::message::ToolCall;
use async_trait::async_trait;
use persona_core::Result;
use persona_profile::ToolSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Definition of a tool available during conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON schema for input parameters.
    pub input_schema: JsonValue,
}

impl ToolDefinition {
    /// Creates a new tool definition.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: json!({"type": "object", "properties": {}}),
        }
    }

    /// Sets the input schema.
    #[must_use]
    pub fn with_input_schema(mut self, schema: JsonValue) -> Self {
        self.input_schema = schema;
        self
    }

    /// Renders the definition as an entry of the OpenAI `tools` array.
    #[must_use]
    pub fn to_llm_format(&self) -> JsonValue {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.input_schema
            }
        })
    }
}

impl From<&ToolSchema> for ToolDefinition {
    fn from(schema: &ToolSchema) -> Self {
        Self::new(schema.name.clone(), schema.description.clone())
            .with_input_schema(schema.parameters.clone())
    }
}

/// Trait for tool execution.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Executes the tool with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments do not fit the tool or the side
    /// effect could not be started.
    async fn execute(&self, arguments: JsonValue) -> Result<JsonValue, ToolError>;
}

/// Registry of available tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool and advertises its definition.
    ///
    /// Registering a name twice replaces the earlier tool in place.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let definition = tool.definition();
        self.tools.insert(definition.name.clone(), Arc::new(tool));
        self.advertise(definition);
    }

    /// Replaces the advertised definition of a tool, keeping its position.
    ///
    /// Definitions for names with no registered tool are still advertised;
    /// calls to them resolve to an empty result.
    pub fn advertise(&mut self, definition: ToolDefinition) {
        match self.definitions.iter_mut().find(|d| d.name == definition.name) {
            Some(existing) => *existing = definition,
            None => self.definitions.push(definition),
        }
    }

    /// Replaces the advertised definitions with schemas from a persona
    /// file.
    ///
    /// Registered implementations are kept, so a listed name that matches a
    /// built-in tool still runs it.
    #[must_use]
    pub fn with_schemas(mut self, schemas: &[ToolSchema]) -> Self {
        self.definitions.clear();
        for schema in schemas {
            self.advertise(schema.into());
        }
        self
    }

    /// Returns advertised definitions in registration order.
    #[must_use]
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Converts definitions to the format expected by LLM APIs.
    #[must_use]
    pub fn to_llm_format(&self) -> Vec<JsonValue> {
        self.definitions
            .iter()
            .map(ToolDefinition::to_llm_format)
            .collect()
    }

    /// Runs a tool call and returns its result.
    ///
    /// Never fails. Unknown tools and tools that reject their arguments
    /// yield `{}`.
    pub async fn invoke(&self, call: &ToolCall) -> JsonValue {
        let Some(tool) = self.tools.get(&call.name) else {
            warn!(tool = %call.name, call_id = %call.id, "model requested an unknown tool");
            return json!({});
        };

        debug!(tool = %call.name, call_id = %call.id, "invoking tool");
        match tool.execute(call.arguments.clone()).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %call.name, call_id = %call.id, error = %e, "tool call failed");
                json!({})
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Echo {
        seen: Arc<Mutex<Vec<JsonValue>>>,
    }

    #[async_trait]
    impl Tool for Echo {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("echo", "Echo the arguments")
        }

        async fn execute(&self, arguments: JsonValue) -> Result<JsonValue, ToolError> {
            self.seen.lock().expect("lock").push(arguments.clone());
            if arguments.is_object() {
                Ok(json!({"echo": arguments}))
            } else {
                Err(ToolError::InvalidInput {
                    name: "echo".to_string(),
                    reason: "expected an object".to_string(),
                }
                .into())
            }
        }
    }

    fn registry() -> (ToolRegistry, Arc<Mutex<Vec<JsonValue>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ToolRegistry::new();
        registry.register(Echo { seen: seen.clone() });
        (registry, seen)
    }

    #[test]
    fn tool_definition_builder() {
        let tool = ToolDefinition::new("search", "Search things").with_input_schema(json!({
            "type": "object",
            "properties": { "query": { "type": "string" } }
        }));

        assert_eq!(tool.name, "search");
        assert_eq!(tool.input_schema["properties"]["query"]["type"], "string");
    }

    #[test]
    fn llm_format_uses_function_envelope() {
        let (registry, _) = registry();
        let tools = registry.to_llm_format();

        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["type"], "function");
        assert_eq!(tools[0]["function"]["name"], "echo");
        assert_eq!(tools[0]["function"]["parameters"]["type"], "object");
    }

    #[tokio::test]
    async fn persona_schemas_replace_advertised_tools() {
        let (mut registry, _) = registry();
        registry.advertise(ToolDefinition::new("second", "Another"));

        let schemas = [
            ToolSchema {
                name: "echo".to_string(),
                description: "Repeat what you were told".to_string(),
                parameters: json!({"type": "object", "properties": {"text": {"type": "string"}}}),
            },
            ToolSchema {
                name: "book_meeting".to_string(),
                description: "Not implemented here".to_string(),
                parameters: json!({"type": "object", "properties": {}}),
            },
        ];
        let registry = registry.with_schemas(&schemas);

        let names: Vec<_> = registry.definitions().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["echo", "book_meeting"]);
        assert_eq!(registry.definitions()[0].description, "Repeat what you were told");

        // The built-in still runs under the configured schema.
        let echoed = registry.invoke(&ToolCall::new("c1", "echo", json!({"text": "hi"}))).await;
        assert_eq!(echoed, json!({"echo": {"text": "hi"}}));
        // Advertised without an implementation.
        let missing = registry.invoke(&ToolCall::new("c2", "book_meeting", json!({}))).await;
        assert_eq!(missing, json!({}));
    }

    #[tokio::test]
    async fn invoke_dispatches_by_name() {
        let (registry, seen) = registry();
        let call = ToolCall::new("c1", "echo", json!({"a": 1}));

        let result = registry.invoke(&call).await;

        assert_eq!(result, json!({"echo": {"a": 1}}));
        assert_eq!(seen.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn unknown_tool_yields_empty_object() {
        let (registry, seen) = registry();
        let call = ToolCall::new("c1", "delete_everything", json!({}));

        assert_eq!(registry.invoke(&call).await, json!({}));
        assert!(seen.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn rejected_arguments_yield_empty_object() {
        let (registry, _) = registry();
        let call = ToolCall::new("c1", "echo", JsonValue::String("{not json".to_string()));

        assert_eq!(registry.invoke(&call).await, json!({}));
    }
}
