//! Startup error types.
//!
//! Request handling never fails outward: the responder turns every
//! upstream failure into an apology. Only building the server can fail.

use std::fmt;

/// Errors that stop the server from starting.
#[derive(Debug)]
pub enum StartupError {
    /// Configuration is missing or invalid.
    Config { reason: String },
    /// The persona configuration file could not be used.
    Persona { reason: String },
    /// An outbound client could not be built.
    Client { name: &'static str, reason: String },
    /// The listening socket could not be bound.
    Bind { addr: String, reason: String },
    /// The server stopped with an error.
    Serve { reason: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { reason } => write!(f, "invalid configuration: {reason}"),
            Self::Persona { reason } => write!(f, "persona unavailable: {reason}"),
            Self::Client { name, reason } => {
                write!(f, "could not build {name} client: {reason}")
            }
            Self::Bind { addr, reason } => write!(f, "could not bind {addr}: {reason}"),
            Self::Serve { reason } => write!(f, "server error: {reason}"),
        }
    }
}

impl std::error::Error for StartupError {}
