//! The reply loop.
//!
//! A turn asks the model for a completion, runs any tools it requests and
//! asks again, until the model answers in text. When an evaluator is
//! configured the answer then passes a quality gate, which may trigger a
//! single regeneration. The turn's messages are committed to the session
//! only once a reply exists; a failed turn leaves the session untouched.

use crate::error::ResponderError;
use crate::message::{Message, MessageRole};
use crate::session::SessionStore;
use crate::tool::ToolRegistry;
use persona_ai::{Evaluation, EvaluationRequest, Evaluator, LlmBackend, LlmMessage, LlmRequest};
use persona_core::{Result, SessionKey};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Reply sent when a turn cannot be completed.
pub const APOLOGY: &str =
    "I'm having trouble processing your request right now. Please try again later.";

/// Responder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponderConfig {
    /// Tool rounds allowed in one turn before it is abandoned.
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: u32,
}

fn default_max_tool_iterations() -> u32 {
    8
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            max_tool_iterations: default_max_tool_iterations(),
        }
    }
}

impl ResponderConfig {
    /// Sets the tool round limit.
    #[must_use]
    pub fn with_max_tool_iterations(mut self, max: u32) -> Self {
        self.max_tool_iterations = max;
        self
    }
}

/// How the final reply of a turn came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyOutcome {
    /// The evaluator accepted the reply, or could not judge it.
    Accepted,
    /// No evaluator is configured.
    Unchecked,
    /// The first reply was rejected and replaced.
    Regenerated,
    /// The first reply was rejected but regeneration failed.
    FallbackToOriginal,
    /// The turn failed and the apology was sent.
    Failed,
}

/// The result of one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Text shown to the visitor.
    pub text: String,
    /// How the text was produced.
    pub outcome: ReplyOutcome,
}

impl Reply {
    fn failed() -> Self {
        Self {
            text: APOLOGY.to_string(),
            outcome: ReplyOutcome::Failed,
        }
    }
}

/// Drives turns for every session.
pub struct Responder {
    backend: Arc<dyn LlmBackend>,
    evaluator: Option<Arc<dyn Evaluator>>,
    tools: Arc<ToolRegistry>,
    sessions: Arc<dyn SessionStore>,
    system_prompt: String,
    config: ResponderConfig,
}

impl Responder {
    /// Creates a responder with no quality gate.
    #[must_use]
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        tools: Arc<ToolRegistry>,
        sessions: Arc<dyn SessionStore>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            evaluator: None,
            tools,
            sessions,
            system_prompt: system_prompt.into(),
            config: ResponderConfig::default(),
        }
    }

    /// Enables the quality gate.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Sets the responder settings.
    #[must_use]
    pub fn with_config(mut self, config: ResponderConfig) -> Self {
        self.config = config;
        self
    }

    /// Answers `message` within the session for `key`.
    ///
    /// Never fails: a turn that cannot be completed returns [`APOLOGY`] and
    /// leaves the session as it was.
    #[instrument(skip(self, message), fields(session = %key))]
    pub async fn respond(&self, key: &SessionKey, message: &str) -> Reply {
        let mut session = match self.sessions.acquire(key).await {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, "could not open session");
                return Reply::failed();
            }
        };

        let committed = session.message_count();
        let prior: Vec<LlmMessage> = session
            .messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(Message::to_llm)
            .collect();

        let mut working = session.messages.clone();
        if session.is_empty() {
            working.push(Message::system(self.system_prompt.clone()));
        }
        working.push(Message::user(message));

        let candidate = match self.generate(&mut working).await {
            Ok(candidate) => candidate,
            Err(e) => {
                error!(error = %e, "turn abandoned");
                return Reply::failed();
            }
        };

        let (text, outcome) = self.review(candidate, message, &prior).await;
        working.push(Message::assistant(text.clone()));
        session.extend(working.drain(committed..));

        info!(?outcome, messages = session.message_count(), "reply ready");
        Reply { text, outcome }
    }

    async fn generate(&self, working: &mut Vec<Message>) -> Result<String, ResponderError> {
        let tools = self.tools.to_llm_format();
        let mut rounds = 0;

        loop {
            let request = LlmRequest::new(working.iter().map(Message::to_llm).collect())
                .with_tools(tools.clone());
            let response = self.backend.complete(&request).await.map_err(|e| {
                ResponderError::Generation {
                    reason: e.to_string(),
                }
            })?;

            if !response.wants_tools() {
                return Ok(response.content);
            }
            if rounds == self.config.max_tool_iterations {
                return Err(ResponderError::ToolIterationsExceeded {
                    max: self.config.max_tool_iterations,
                }
                .into());
            }
            rounds += 1;
            debug!(round = rounds, calls = response.tool_calls.len(), "model requested tools");

            let calls = response.tool_calls;
            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                let result = self.tools.invoke(call).await;
                results.push(Message::tool(call.id.clone(), result.to_string()));
            }
            working.push(Message::assistant_tool_calls(response.content, calls));
            working.extend(results);
        }
    }

    async fn review(
        &self,
        candidate: String,
        message: &str,
        history: &[LlmMessage],
    ) -> (String, ReplyOutcome) {
        let Some(evaluator) = &self.evaluator else {
            return (candidate, ReplyOutcome::Unchecked);
        };

        let request = EvaluationRequest {
            reply: &candidate,
            message,
            history,
        };
        let verdict = evaluator.evaluate(request).await;
        let feedback = match verdict {
            Ok(Evaluation::Accepted) => return (candidate, ReplyOutcome::Accepted),
            Ok(Evaluation::Rejected { feedback }) => feedback,
            Err(e) => {
                warn!(error = %e, "evaluation failed, accepting reply");
                return (candidate, ReplyOutcome::Accepted);
            }
        };

        info!(%feedback, "reply rejected, regenerating");
        match self.regenerate(&candidate, &feedback, message, history).await {
            Ok(text) => (text, ReplyOutcome::Regenerated),
            Err(e) => {
                warn!(error = %e, "regeneration failed, keeping first reply");
                (candidate, ReplyOutcome::FallbackToOriginal)
            }
        }
    }

    async fn regenerate(
        &self,
        rejected: &str,
        feedback: &str,
        message: &str,
        history: &[LlmMessage],
    ) -> Result<String, ResponderError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(LlmMessage::system(regeneration_prompt(
            &self.system_prompt,
            rejected,
            feedback,
        )));
        messages.extend_from_slice(history);
        messages.push(LlmMessage::user(message));

        let response = self
            .backend
            .complete(&LlmRequest::new(messages))
            .await
            .map_err(|e| ResponderError::Generation {
                reason: e.to_string(),
            })?;

        if response.content.trim().is_empty() {
            return Err(ResponderError::Generation {
                reason: "regenerated reply was empty".to_string(),
            }
            .into());
        }
        Ok(response.content)
    }
}

/// System prompt for the second attempt after a rejected reply.
#[must_use]
pub fn regeneration_prompt(system_prompt: &str, rejected: &str, feedback: &str) -> String {
    format!(
        "{system_prompt}\n\n## Previous answer rejected\n\
         You just tried to reply, but the quality control rejected your reply\n\
         ## Your attempted answer:\n{rejected}\n\n\
         ## Reason for rejection:\n{feedback}\n\n"
    )
}
