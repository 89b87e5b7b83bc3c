//! AI primitives for persona-chat.
//!
//! This crate provides:
//!
//! - **LLM backend**: a chat-completion interface with tool calling
//! - **OpenAI-compatible backend**: the HTTP implementation used for both
//!   the assistant model and the evaluation model
//! - **Evaluation**: the accept/reject verdict on a candidate reply

pub mod backend;
pub mod error;
pub mod evaluation;
pub mod openai;

pub use backend::{
    FinishReason, LlmBackend, LlmMessage, LlmRequest, LlmResponse, LlmToolCall, MessageRole,
    TokenUsage,
};
pub use error::{EvaluationError, LlmError};
pub use evaluation::{Evaluation, EvaluationRequest, Evaluator, LlmEvaluator};
pub use openai::{OpenAiBackend, OpenAiConfig};
