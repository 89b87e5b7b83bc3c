//! Error types for the profile crate.

use std::fmt;
use std::path::PathBuf;

/// Errors from loading persona material.
///
/// Missing or unreadable documents are not errors: they degrade to
/// placeholder text. Only the persona configuration file can fail a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// The persona configuration file could not be read.
    PersonaUnreadable { path: PathBuf, reason: String },
    /// The persona configuration file is not valid JSON for the schema.
    PersonaInvalid { path: PathBuf, reason: String },
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PersonaUnreadable { path, reason } => {
                write!(f, "cannot read persona file {}: {reason}", path.display())
            }
            Self::PersonaInvalid { path, reason } => {
                write!(f, "invalid persona file {}: {reason}", path.display())
            }
        }
    }
}

impl std::error::Error for ProfileError {}
