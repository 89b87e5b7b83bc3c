//! OpenAI-compatible chat-completions backend.
//!
//! Works against any endpoint speaking the `/chat/completions` protocol,
//! including Gemini's OpenAI compatibility layer used for evaluation.

use crate::backend::{
    FinishReason, LlmBackend, LlmMessage, LlmRequest, LlmResponse, LlmToolCall, MessageRole,
    TokenUsage,
};
use crate::error::LlmError;
use async_trait::async_trait;
use persona_core::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::time::Duration;
use tracing::{debug, instrument};

/// Connection settings for an OpenAI-compatible provider.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    /// Base URL up to and including the API version, e.g.
    /// `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl OpenAiConfig {
    /// Creates a configuration with the default timeout.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            timeout_secs: default_timeout_secs(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Chat-completions client.
#[derive(Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiBackend {
    /// Creates a backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not http(s) or the HTTP client
    /// cannot be built.
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(LlmError::InvalidConfig {
                reason: format!("base URL must be http(s): {}", config.base_url),
            }
            .into());
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(Self { client, config })
    }

    fn request_body(&self, request: &LlmRequest) -> JsonValue {
        let messages: Vec<WireMessage<'_>> = request.messages.iter().map(WireMessage::from).collect();

        let mut body = json!({
            "model": self.config.model,
            "messages": messages,
        });

        if !request.tools.is_empty() {
            body["tools"] = JsonValue::Array(request.tools.clone());
        }
        if let Some(schema) = &request.output_schema {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "response",
                    "strict": true,
                    "schema": schema,
                }
            });
        }

        body
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    #[instrument(skip(self, request), fields(model = %self.config.model, messages = request.messages.len()))]
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::RequestFailed {
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::ResponseParseFailed {
                reason: e.to_string(),
            })?;

        if !status.is_success() {
            return Err(LlmError::ProviderStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: WireResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::ResponseParseFailed {
                reason: e.to_string(),
            })?;

        let response = parsed.into_response(&self.config.model)?;
        debug!(
            finish_reason = ?response.finish_reason,
            tool_calls = response.tool_calls.len(),
            tokens = response.usage.total(),
            "completion received"
        );
        Ok(response)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: MessageRole,
    content: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCallOut<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

impl<'a> From<&'a LlmMessage> for WireMessage<'a> {
    fn from(message: &'a LlmMessage) -> Self {
        Self {
            role: message.role,
            content: &message.content,
            tool_calls: message
                .tool_calls
                .iter()
                .map(|call| WireToolCallOut {
                    id: &call.id,
                    kind: "function",
                    function: WireFunctionOut {
                        name: &call.name,
                        arguments: match &call.arguments {
                            JsonValue::String(raw) => raw.clone(),
                            other => other.to_string(),
                        },
                    },
                })
                .collect(),
            tool_call_id: message.tool_call_id.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct WireToolCallOut<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionOut<'a>,
}

#[derive(Serialize)]
struct WireFunctionOut<'a> {
    name: &'a str,
    arguments: String,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCallIn>,
}

#[derive(Deserialize)]
struct WireToolCallIn {
    id: String,
    function: WireFunctionIn,
}

#[derive(Deserialize)]
struct WireFunctionIn {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl WireResponse {
    fn into_response(self, requested_model: &str) -> Result<LlmResponse, LlmError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;

        let tool_calls = choice
            .message
            .tool_calls
            .into_iter()
            .map(|call| {
                let arguments = parse_arguments(&call.function.arguments);
                LlmToolCall::new(call.id, call.function.name, arguments)
            })
            .collect();

        let usage = self
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            finish_reason: choice
                .finish_reason
                .as_deref()
                .map_or(FinishReason::Stop, FinishReason::from_provider),
            usage,
            model: self.model.unwrap_or_else(|| requested_model.to_string()),
        })
    }
}

fn parse_arguments(raw: &str) -> JsonValue {
    if raw.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
    use axum::routing::post;
    use axum::{Json, Router};
    use std::collections::VecDeque;
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockProvider {
        replies: Arc<Mutex<VecDeque<(StatusCode, JsonValue)>>>,
        seen_bodies: Arc<Mutex<Vec<JsonValue>>>,
        seen_auth: Arc<Mutex<Vec<String>>>,
    }

    impl MockProvider {
        fn with_replies(replies: Vec<(StatusCode, JsonValue)>) -> Self {
            Self {
                replies: Arc::new(Mutex::new(VecDeque::from(replies))),
                seen_bodies: Arc::new(Mutex::new(Vec::new())),
                seen_auth: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    async fn completions(
        State(state): State<MockProvider>,
        headers: HeaderMap,
        Json(body): Json<JsonValue>,
    ) -> (StatusCode, Json<JsonValue>) {
        state.seen_bodies.lock().await.push(body);
        if let Some(auth) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            state.seen_auth.lock().await.push(auth.to_string());
        }
        let (status, reply) = state
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, json!({})));
        (status, Json(reply))
    }

    async fn spawn_provider(state: MockProvider) -> String {
        let app = Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(state);
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        format!("http://{addr}/v1")
    }

    fn backend(base_url: String) -> OpenAiBackend {
        OpenAiBackend::new(OpenAiConfig::new(base_url, "test-key", "gpt-4o-mini")).expect("backend")
    }

    #[tokio::test]
    async fn parses_text_completion() {
        let state = MockProvider::with_replies(vec![(
            StatusCode::OK,
            json!({
                "model": "gpt-4o-mini-2024",
                "choices": [{
                    "message": { "role": "assistant", "content": "Hello!" },
                    "finish_reason": "stop"
                }],
                "usage": { "prompt_tokens": 12, "completion_tokens": 3 }
            }),
        )]);
        let url = spawn_provider(state.clone()).await;

        let request = LlmRequest::new(vec![LlmMessage::system("sys"), LlmMessage::user("hi")]);
        let response = backend(url).complete(&request).await.expect("completion");

        assert_eq!(response.content, "Hello!");
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert!(!response.wants_tools());
        assert_eq!(response.usage.total(), 15);
        assert_eq!(response.model, "gpt-4o-mini-2024");

        let bodies = state.seen_bodies.lock().await;
        assert_eq!(bodies[0]["model"], "gpt-4o-mini");
        assert_eq!(bodies[0]["messages"][1]["content"], "hi");
        assert!(bodies[0].get("tools").is_none());
        assert_eq!(state.seen_auth.lock().await[0], "Bearer test-key");
    }

    #[tokio::test]
    async fn parses_tool_calls_and_replays_them() {
        let state = MockProvider::with_replies(vec![(
            StatusCode::OK,
            json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {
                                "name": "record_unknown_question",
                                "arguments": "{\"question\":\"Favourite colour?\"}"
                            }
                        }]
                    },
                    "finish_reason": "tool_calls"
                }]
            }),
        )]);
        let url = spawn_provider(state.clone()).await;

        let call = LlmToolCall::new("call_0", "record_user_details", json!({"email": "a@b.c"}));
        let request = LlmRequest::new(vec![
            LlmMessage::user("hi"),
            LlmMessage::assistant_tool_calls("", vec![call]),
            LlmMessage::tool("call_0", "{\"recorded\":\"ok\"}"),
        ])
        .with_tools(vec![json!({"type": "function", "function": {"name": "x"}})]);

        let response = backend(url).complete(&request).await.expect("completion");

        assert!(response.wants_tools());
        assert_eq!(response.finish_reason, FinishReason::ToolCalls);
        assert_eq!(response.content, "");
        assert_eq!(response.tool_calls[0].id, "call_1");
        assert_eq!(response.tool_calls[0].arguments["question"], "Favourite colour?");

        let bodies = state.seen_bodies.lock().await;
        let replayed = &bodies[0]["messages"];
        assert_eq!(replayed[1]["tool_calls"][0]["type"], "function");
        assert_eq!(
            replayed[1]["tool_calls"][0]["function"]["arguments"],
            "{\"email\":\"a@b.c\"}"
        );
        assert_eq!(replayed[2]["tool_call_id"], "call_0");
        assert_eq!(bodies[0]["tools"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn output_schema_becomes_response_format() {
        let state = MockProvider::with_replies(vec![(
            StatusCode::OK,
            json!({"choices": [{"message": {"content": "{}"}, "finish_reason": "stop"}]}),
        )]);
        let url = spawn_provider(state.clone()).await;

        let request = LlmRequest::new(vec![LlmMessage::user("judge")])
            .with_output_schema(json!({"type": "object"}));
        backend(url).complete(&request).await.expect("completion");

        let bodies = state.seen_bodies.lock().await;
        assert_eq!(bodies[0]["response_format"]["type"], "json_schema");
        assert_eq!(
            bodies[0]["response_format"]["json_schema"]["schema"]["type"],
            "object"
        );
    }

    #[tokio::test]
    async fn provider_error_status_is_reported() {
        let state = MockProvider::with_replies(vec![(
            StatusCode::TOO_MANY_REQUESTS,
            json!({"error": {"message": "rate limited"}}),
        )]);
        let url = spawn_provider(state).await;

        let err = backend(url)
            .complete(&LlmRequest::new(vec![LlmMessage::user("hi")]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let state = MockProvider::with_replies(vec![(StatusCode::OK, json!({"choices": []}))]);
        let url = spawn_provider(state).await;

        let result = backend(url)
            .complete(&LlmRequest::new(vec![LlmMessage::user("hi")]))
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn rejects_non_http_base_url() {
        let result = OpenAiBackend::new(OpenAiConfig::new("ftp://example.com", "k", "m"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_arguments_are_kept_raw() {
        assert_eq!(parse_arguments("not json"), JsonValue::String("not json".to_string()));
        assert_eq!(parse_arguments("  "), json!({}));
    }
}
