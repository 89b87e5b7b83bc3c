//! Pushover delivery.

use crate::error::NotifyError;
use crate::notifier::Notifier;
use async_trait::async_trait;
use persona_core::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Default Pushover messages endpoint.
pub const DEFAULT_PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

/// Credentials and endpoint for Pushover.
#[derive(Debug, Clone, Deserialize)]
pub struct PushoverConfig {
    /// Pushover user key.
    pub user: String,
    /// Pushover application token.
    pub token: String,
    /// Messages endpoint.
    #[serde(default = "default_url")]
    pub url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    DEFAULT_PUSHOVER_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl PushoverConfig {
    /// Creates a configuration for the public Pushover endpoint.
    #[must_use]
    pub fn new(user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            token: token.into(),
            url: default_url(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Overrides the endpoint.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[derive(Serialize)]
struct PushoverForm<'a> {
    user: &'a str,
    token: &'a str,
    message: &'a str,
}

/// Sends notifications through the Pushover messages API.
#[derive(Clone)]
pub struct PushoverNotifier {
    client: reqwest::Client,
    config: PushoverConfig,
}

impl PushoverNotifier {
    /// Creates a notifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: PushoverConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotifyError::ClientBuild {
                reason: e.to_string(),
            })?;

        Ok(Self { client, config })
    }

    /// Sends `message`, reporting failures to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Pushover rejects it.
    pub async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let form = PushoverForm {
            user: &self.config.user,
            token: &self.config.token,
            message,
        };

        let response = self
            .client
            .post(&self.config.url)
            .form(&form)
            .send()
            .await
            .map_err(|e| NotifyError::DeliveryFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn notify(&self, message: &str) {
        info!(message, "sending push notification");
        if let Err(e) = self.send(message).await {
            warn!(error = %e, "push notification failed");
        }
    }
}
