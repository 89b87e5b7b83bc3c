//! Reply evaluation.
//!
//! A second, independent model judges whether a candidate reply is fit to
//! show the visitor. The verdict is either [`Evaluation::Accepted`] or
//! [`Evaluation::Rejected`] with feedback for a regeneration attempt.

use crate::backend::{LlmBackend, LlmMessage, LlmRequest, MessageRole};
use crate::error::EvaluationError;
use async_trait::async_trait;
use persona_core::Result;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Verdict on a candidate reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// The reply may be shown as is.
    Accepted,
    /// The reply should be regenerated.
    Rejected {
        /// Why the reply was rejected.
        feedback: String,
    },
}

impl Evaluation {
    /// Returns true for [`Evaluation::Accepted`].
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Wire contract of the evaluation model.
#[derive(Debug, Deserialize)]
struct Verdict {
    is_acceptable: bool,
    #[serde(default)]
    feedback: String,
}

impl From<Verdict> for Evaluation {
    fn from(verdict: Verdict) -> Self {
        if verdict.is_acceptable {
            Self::Accepted
        } else {
            Self::Rejected {
                feedback: verdict.feedback,
            }
        }
    }
}

/// What the evaluator is asked to judge.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationRequest<'a> {
    /// The candidate reply.
    pub reply: &'a str,
    /// The visitor's latest message.
    pub message: &'a str,
    /// Earlier conversation, without the system prompt or the latest
    /// message.
    pub history: &'a [LlmMessage],
}

/// Judges candidate replies.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Evaluates a candidate reply.
    ///
    /// # Errors
    ///
    /// Returns an error if no verdict could be obtained.
    async fn evaluate(&self, request: EvaluationRequest<'_>) -> Result<Evaluation, EvaluationError>;
}

/// Evaluator backed by a language model with structured output.
pub struct LlmEvaluator {
    backend: Arc<dyn LlmBackend>,
    system_prompt: String,
}

impl LlmEvaluator {
    /// Creates an evaluator using `system_prompt` as the judging brief.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, system_prompt: impl Into<String>) -> Self {
        Self {
            backend,
            system_prompt: system_prompt.into(),
        }
    }

    fn output_schema() -> JsonValue {
        json!({
            "type": "object",
            "properties": {
                "is_acceptable": { "type": "boolean" },
                "feedback": { "type": "string" }
            },
            "required": ["is_acceptable", "feedback"],
            "additionalProperties": false
        })
    }
}

#[async_trait]
impl Evaluator for LlmEvaluator {
    #[instrument(skip_all, fields(model = %self.backend.model()))]
    async fn evaluate(&self, request: EvaluationRequest<'_>) -> Result<Evaluation, EvaluationError> {
        let llm_request = LlmRequest::new(vec![
            LlmMessage::system(self.system_prompt.clone()),
            LlmMessage::user(evaluation_prompt(&request)),
        ])
        .with_output_schema(Self::output_schema());

        let response = self
            .backend
            .complete(&llm_request)
            .await
            .map_err(|e| EvaluationError::Backend {
                reason: e.to_string(),
            })?;

        let verdict = parse_verdict(&response.content)?;
        debug!(accepted = verdict.is_accepted(), "evaluation verdict");
        Ok(verdict)
    }
}

fn parse_verdict(content: &str) -> Result<Evaluation, EvaluationError> {
    let trimmed = content.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    let verdict: Verdict =
        serde_json::from_str(json.trim()).map_err(|e| EvaluationError::InvalidVerdict {
            reason: e.to_string(),
        })?;
    Ok(verdict.into())
}

/// Builds the user prompt handed to the evaluation model.
#[must_use]
pub fn evaluation_prompt(request: &EvaluationRequest<'_>) -> String {
    format!(
        "Here's the conversation between the User and the Agent:\n\n{}\n\n\
         Here's the latest message from the User:\n\n{}\n\n\
         Here's the latest response from the Agent:\n\n{}\n\n\
         Please evaluate the response, replying with whether it is acceptable and your feedback.",
        transcript(request.history),
        request.message,
        request.reply,
    )
}

fn transcript(history: &[LlmMessage]) -> String {
    if history.is_empty() {
        return "(no earlier messages)".to_string();
    }

    let mut out = String::new();
    for message in history {
        let _ = match message.role {
            MessageRole::System => writeln!(out, "System: {}", message.content),
            MessageRole::User => writeln!(out, "User: {}", message.content),
            MessageRole::Assistant if message.tool_calls.is_empty() => {
                writeln!(out, "Agent: {}", message.content)
            }
            MessageRole::Assistant => {
                let calls: Vec<String> = message
                    .tool_calls
                    .iter()
                    .map(|call| format!("{}({})", call.name, call.arguments))
                    .collect();
                writeln!(out, "Agent called tools: {}", calls.join(", "))
            }
            MessageRole::Tool => writeln!(out, "Tool result: {}", message.content),
        };
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{LlmResponse, LlmToolCall};
    use crate::error::LlmError;
    use std::sync::Mutex;

    struct CannedBackend {
        reply: std::result::Result<String, LlmError>,
        seen: Mutex<Vec<LlmRequest>>,
    }

    impl CannedBackend {
        fn replying(reply: std::result::Result<&str, LlmError>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmBackend for CannedBackend {
        async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
            self.seen.lock().expect("lock").push(request.clone());
            match &self.reply {
                Ok(text) => Ok(LlmResponse::text(text.clone())),
                Err(e) => Err(e.clone().into()),
            }
        }

        fn model(&self) -> &str {
            "canned"
        }
    }

    fn request<'a>(history: &'a [LlmMessage]) -> EvaluationRequest<'a> {
        EvaluationRequest {
            reply: "I worked at Initech.",
            message: "Where did you work?",
            history,
        }
    }

    #[tokio::test]
    async fn acceptable_verdict_is_accepted() {
        let backend = CannedBackend::replying(Ok(r#"{"is_acceptable": true, "feedback": "fine"}"#));
        let evaluator = LlmEvaluator::new(backend.clone(), "judge");

        let verdict = evaluator.evaluate(request(&[])).await.expect("verdict");

        assert_eq!(verdict, Evaluation::Accepted);
        let seen = backend.seen.lock().expect("lock");
        assert_eq!(seen[0].messages[0].content, "judge");
        assert!(seen[0].messages[1].content.contains("Where did you work?"));
        assert!(seen[0].messages[1].content.contains("I worked at Initech."));
        assert!(seen[0].output_schema.is_some());
    }

    #[tokio::test]
    async fn unacceptable_verdict_carries_feedback() {
        let backend = CannedBackend::replying(Ok(
            "```json\n{\"is_acceptable\": false, \"feedback\": \"Too casual\"}\n```",
        ));
        let evaluator = LlmEvaluator::new(backend, "judge");

        let verdict = evaluator.evaluate(request(&[])).await.expect("verdict");

        assert_eq!(
            verdict,
            Evaluation::Rejected {
                feedback: "Too casual".to_string()
            }
        );
    }

    #[tokio::test]
    async fn backend_failure_is_an_error() {
        let backend = CannedBackend::replying(Err(LlmError::Timeout));
        let evaluator = LlmEvaluator::new(backend, "judge");

        assert!(evaluator.evaluate(request(&[])).await.is_err());
    }

    #[tokio::test]
    async fn garbage_verdict_is_an_error() {
        let backend = CannedBackend::replying(Ok("Looks good to me!"));
        let evaluator = LlmEvaluator::new(backend, "judge");

        assert!(evaluator.evaluate(request(&[])).await.is_err());
    }

    #[test]
    fn transcript_renders_each_role() {
        let history = vec![
            LlmMessage::user("Hi"),
            LlmMessage::assistant_tool_calls(
                "",
                vec![LlmToolCall::new("c1", "record_unknown_question", json!({"question": "Q"}))],
            ),
            LlmMessage::tool("c1", "{\"recorded\":\"ok\"}"),
            LlmMessage::assistant("Hello"),
        ];

        let text = transcript(&history);

        assert!(text.starts_with("User: Hi\n"));
        assert!(text.contains("Agent called tools: record_unknown_question({\"question\":\"Q\"})"));
        assert!(text.contains("Tool result: {\"recorded\":\"ok\"}"));
        assert!(text.ends_with("Agent: Hello"));
    }
}
