//! Core types shared by every persona-chat crate.
//!
//! Provides the rootcause-based `Result` alias and the strongly-typed
//! identifiers used for conversation sessions and messages.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{MessageId, ParseIdError, SessionKey};
