//! Error types for the AI crate.
//!
//! - `LlmError`: chat-completion backend failures
//! - `EvaluationError`: failures of the reply evaluator

use std::fmt;

/// Errors from LLM backend operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// The request never produced a response.
    RequestFailed { reason: String },
    /// The provider answered with a non-success status.
    ProviderStatus { status: u16, body: String },
    /// Response parsing failed.
    ResponseParseFailed { reason: String },
    /// The response contained no choices.
    EmptyResponse,
    /// Timeout waiting for response.
    Timeout,
    /// Invalid configuration.
    InvalidConfig { reason: String },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { reason } => {
                write!(f, "LLM request failed: {reason}")
            }
            Self::ProviderStatus { status, body } => {
                write!(f, "LLM provider returned status {status}: {body}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse LLM response: {reason}")
            }
            Self::EmptyResponse => write!(f, "LLM response contained no choices"),
            Self::Timeout => write!(f, "LLM request timed out"),
            Self::InvalidConfig { reason } => {
                write!(f, "invalid LLM configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for LlmError {}

/// Errors from evaluating a candidate reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// The evaluation model call failed.
    Backend { reason: String },
    /// The evaluation model did not return a verdict object.
    InvalidVerdict { reason: String },
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend { reason } => write!(f, "evaluation call failed: {reason}"),
            Self::InvalidVerdict { reason } => {
                write!(f, "evaluation verdict unusable: {reason}")
            }
        }
    }
}

impl std::error::Error for EvaluationError {}
