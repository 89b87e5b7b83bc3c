//! Conversation service for persona-chat.
//!
//! This crate provides:
//!
//! - **Messages**: the per-session conversation record
//! - **Tool Registry**: side-effecting functions offered to the model
//! - **Session Store**: per-visitor histories with per-session locking
//! - **Responder**: the generate, tool-call and quality-gate loop

pub mod builtin;
pub mod error;
pub mod message;
pub mod responder;
pub mod session;
pub mod tool;

pub use builtin::{RecordUnknownQuestion, RecordUserDetails};
pub use error::{ResponderError, SessionError, ToolError};
pub use message::{Message, MessageRole, ToolCall};
pub use responder::{APOLOGY, Reply, ReplyOutcome, Responder, ResponderConfig};
pub use session::{InMemorySessionStore, Session, SessionGuard, SessionStore};
pub use tool::{Tool, ToolDefinition, ToolRegistry};
