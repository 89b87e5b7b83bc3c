//! Persona material for persona-chat.
//!
//! This crate provides:
//!
//! - **Document Loader**: biography summary and profile document text
//! - **Persona**: the represented person, with optional JSON configuration
//! - **Prompts**: system and evaluator prompt templates

pub mod documents;
pub mod error;
pub mod persona;
pub mod prompt;

pub use documents::{PROFILE_PLACEHOLDER, SUMMARY_PLACEHOLDER, load_profile, load_summary};
pub use error::ProfileError;
pub use persona::{Persona, PersonaFile, ProfileConfig, ToolSchema};
pub use prompt::PromptTemplate;
