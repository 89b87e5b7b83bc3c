//! Best-effort notification delivery.

use async_trait::async_trait;
use tracing::info;

/// Delivers a short text message to the represented person.
///
/// Delivery is best effort: implementations log failures and never
/// surface them to the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `message`.
    async fn notify(&self, message: &str);
}

/// Notifier used when no push endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) {
        info!(message, "push notification not configured");
    }
}
