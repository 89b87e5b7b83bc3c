//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested keys
//! use a double underscore, e.g. `LLM__API_KEY` or `PROFILE__NAME`.
//!
//! An optional `.env` file is read first; its path comes from
//! `PERSONA_ENV_FILE` and defaults to `settings/.env`.

use persona_ai::OpenAiConfig;
use persona_conversation::ResponderConfig;
use persona_integration::{DEFAULT_PUSHOVER_URL, PushoverConfig};
use persona_profile::ProfileConfig;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Environment variable naming the `.env` file.
pub const ENV_FILE_VAR: &str = "PERSONA_ENV_FILE";

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Persona documents and configuration.
    pub profile: ProfileConfig,

    /// Assistant model connection.
    pub llm: LlmSettings,

    /// Evaluation model connection.
    #[serde(default)]
    pub evaluation: EvaluationSettings,

    /// Reply loop limits.
    #[serde(default)]
    pub responder: ResponderConfig,

    /// Push notification credentials.
    #[serde(default)]
    pub pushover: PushoverSettings,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

/// Assistant model settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl LlmSettings {
    /// Client configuration for the assistant model.
    #[must_use]
    pub fn openai_config(&self) -> OpenAiConfig {
        OpenAiConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Evaluation model settings.
///
/// The quality gate runs only when enabled and an API key is present.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationSettings {
    #[serde(default = "default_evaluation_enabled")]
    pub enabled: bool,
    #[serde(default = "default_evaluation_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_evaluation_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_evaluation_enabled() -> bool {
    true
}

fn default_evaluation_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
}

fn default_evaluation_model() -> String {
    "gemini-2.0-flash".to_string()
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            enabled: default_evaluation_enabled(),
            base_url: default_evaluation_base_url(),
            api_key: None,
            model: default_evaluation_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EvaluationSettings {
    /// Client configuration for the evaluation model, or `None` when the
    /// gate is off.
    #[must_use]
    pub fn openai_config(&self) -> Option<OpenAiConfig> {
        if !self.enabled {
            return None;
        }
        let api_key = self.api_key.as_deref().filter(|key| !key.is_empty())?;
        Some(OpenAiConfig {
            base_url: self.base_url.clone(),
            api_key: api_key.to_string(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
        })
    }
}

/// Pushover settings. Notifications are logged instead when either
/// credential is missing.
#[derive(Debug, Clone, Deserialize)]
pub struct PushoverSettings {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_pushover_url")]
    pub url: String,
    #[serde(default = "default_pushover_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_pushover_url() -> String {
    DEFAULT_PUSHOVER_URL.to_string()
}

fn default_pushover_timeout_secs() -> u64 {
    10
}

impl Default for PushoverSettings {
    fn default() -> Self {
        Self {
            user: None,
            token: None,
            url: default_pushover_url(),
            timeout_secs: default_pushover_timeout_secs(),
        }
    }
}

impl PushoverSettings {
    /// Client configuration, or `None` when credentials are incomplete.
    #[must_use]
    pub fn pushover_config(&self) -> Option<PushoverConfig> {
        let user = self.user.as_deref().filter(|v| !v.is_empty())?;
        let token = self.token.as_deref().filter(|v| !v.is_empty())?;
        let mut config = PushoverConfig::new(user, token).with_url(self.url.clone());
        config.timeout_secs = self.timeout_secs;
        Some(config)
    }
}

impl ServerConfig {
    /// Loads configuration from the `.env` file and environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        load_env_file();
        Self::from_source(
            config::Environment::default()
                .separator("__")
                .try_parsing(true),
        )
    }

    fn from_source(source: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }
}

fn load_env_file() {
    let path = std::env::var_os(ENV_FILE_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("settings/.env"));

    match dotenvy::from_path(&path) {
        Ok(()) => info!(path = %path.display(), "loaded environment file"),
        Err(e) if e.not_found() => debug!(path = %path.display(), "no environment file"),
        Err(e) => warn!(path = %path.display(), error = %e, "could not read environment file"),
    }
}
