//! persona-chat HTTP server.
//!
//! Exposes the responder over a small JSON API:
//! - `POST /chat` answers a visitor message within a session
//! - `GET /health` reports liveness

pub mod app;
pub mod chat;
pub mod config;
pub mod error;
