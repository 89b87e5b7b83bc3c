//! Outbound notifications for persona-chat.
//!
//! The assistant's tools report visitor contact details and unanswered
//! questions to the represented person through a [`Notifier`].

pub mod error;
pub mod notifier;
pub mod pushover;

pub use error::NotifyError;
pub use notifier::{LogNotifier, Notifier};
pub use pushover::{DEFAULT_PUSHOVER_URL, PushoverConfig, PushoverNotifier};
