//! Error types for the conversation crate.
//!
//! - `SessionError`: session store failures
//! - `ToolError`: tool execution failures
//! - `ResponderError`: a turn that could not produce a reply

use std::fmt;

/// Errors from session store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Storage operation failed.
    StorageFailed { reason: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StorageFailed { reason } => {
                write!(f, "session storage failed: {reason}")
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// Errors from tool execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The arguments do not match the tool's schema.
    InvalidInput { name: String, reason: String },
    /// Tool execution failed.
    ExecutionFailed { name: String, reason: String },
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { name, reason } => {
                write!(f, "invalid input for tool '{name}': {reason}")
            }
            Self::ExecutionFailed { name, reason } => {
                write!(f, "tool '{name}' execution failed: {reason}")
            }
        }
    }
}

impl std::error::Error for ToolError {}

/// Reasons a turn ended without a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderError {
    /// The session could not be opened.
    Session { reason: String },
    /// The language model call failed.
    Generation { reason: String },
    /// The model kept asking for tools past the configured limit.
    ToolIterationsExceeded { max: u32 },
}

impl fmt::Display for ResponderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session { reason } => write!(f, "session unavailable: {reason}"),
            Self::Generation { reason } => write!(f, "generation failed: {reason}"),
            Self::ToolIterationsExceeded { max } => {
                write!(f, "model requested tools more than {max} times in one turn")
            }
        }
    }
}

impl std::error::Error for ResponderError {}
