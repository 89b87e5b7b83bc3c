//! The represented person.

use crate::documents::{load_profile, load_summary};
use crate::error::ProfileError;
use crate::prompt::{DEFAULT_EVALUATOR_PROMPT, DEFAULT_SYSTEM_PROMPT, PromptTemplate};
use persona_core::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where the persona material lives.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileConfig {
    /// Name of the represented person.
    pub name: String,
    /// Plain-text biography summary.
    #[serde(default = "default_summary_path")]
    pub summary_path: PathBuf,
    /// Profile document (PDF or plain text).
    #[serde(default = "default_document_path")]
    pub document_path: PathBuf,
    /// Optional persona configuration JSON.
    #[serde(default)]
    pub persona_path: Option<PathBuf>,
}

fn default_summary_path() -> PathBuf {
    PathBuf::from("settings/summary.txt")
}

fn default_document_path() -> PathBuf {
    PathBuf::from("settings/linkedin.pdf")
}

impl ProfileConfig {
    /// Creates a configuration with the default document locations.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            summary_path: default_summary_path(),
            document_path: default_document_path(),
            persona_path: None,
        }
    }
}

/// Schema of a tool advertised to the language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name.
    pub name: String,
    /// What the tool is for.
    pub description: String,
    /// JSON schema of the arguments.
    #[serde(default = "empty_object_schema")]
    pub parameters: JsonValue,
}

fn empty_object_schema() -> JsonValue {
    serde_json::json!({ "type": "object", "properties": {} })
}

/// Contents of the persona configuration file.
///
/// Every field is optional; absent fields keep the built-in behaviour.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonaFile {
    /// Overrides the configured name.
    #[serde(default)]
    pub name: Option<String>,
    /// System prompt template.
    #[serde(default)]
    pub system_prompt_template: Option<String>,
    /// Evaluator prompt template.
    #[serde(default)]
    pub evaluator_prompt_template: Option<String>,
    /// Replaces the advertised tool schemas.
    #[serde(default)]
    pub tools: Option<Vec<ToolSchema>>,
}

impl PersonaFile {
    /// Reads and parses a persona configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn read(path: &Path) -> Result<Self, ProfileError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ProfileError::PersonaUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(
            serde_json::from_str(&raw).map_err(|e| ProfileError::PersonaInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?,
        )
    }
}

/// The person the assistant represents, with everything needed to build
/// its prompts.
#[derive(Debug, Clone)]
pub struct Persona {
    name: String,
    summary: String,
    profile: String,
    system_template: PromptTemplate,
    evaluator_template: PromptTemplate,
    tool_schemas: Option<Vec<ToolSchema>>,
}

impl Persona {
    /// Creates a persona from already-loaded text with the default prompts.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        summary: impl Into<String>,
        profile: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            summary: summary.into(),
            profile: profile.into(),
            system_template: PromptTemplate::new(DEFAULT_SYSTEM_PROMPT),
            evaluator_template: PromptTemplate::new(DEFAULT_EVALUATOR_PROMPT),
            tool_schemas: None,
        }
    }

    /// Loads the persona documents and optional configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error only when a configured persona file is unreadable
    /// or malformed; missing documents fall back to placeholder text.
    pub fn load(config: &ProfileConfig) -> Result<Self, ProfileError> {
        let summary = load_summary(&config.summary_path);
        let profile = load_profile(&config.document_path);
        let mut persona = Self::new(config.name.clone(), summary, profile);

        if let Some(path) = &config.persona_path {
            persona = persona.with_file(PersonaFile::read(path)?);
            info!(path = %path.display(), "applied persona configuration");
        }

        info!(name = %persona.name, "loaded persona");
        Ok(persona)
    }

    /// Applies the overrides from a persona configuration file.
    #[must_use]
    pub fn with_file(mut self, file: PersonaFile) -> Self {
        if let Some(name) = file.name {
            self.name = name;
        }
        if let Some(template) = file.system_prompt_template {
            self.system_template = PromptTemplate::new(template);
        }
        if let Some(template) = file.evaluator_prompt_template {
            self.evaluator_template = PromptTemplate::new(template);
        }
        if file.tools.is_some() {
            self.tool_schemas = file.tools;
        }
        self
    }

    /// Returns the represented person's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the biography summary.
    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Returns the profile document text.
    #[must_use]
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Tool schemas supplied by the persona file, if any.
    #[must_use]
    pub fn tool_schemas(&self) -> Option<&[ToolSchema]> {
        self.tool_schemas.as_deref()
    }

    /// Renders the assistant's system prompt.
    #[must_use]
    pub fn system_prompt(&self) -> String {
        self.system_template.render(&self.variables())
    }

    /// Renders the evaluator's system prompt.
    #[must_use]
    pub fn evaluator_prompt(&self) -> String {
        self.evaluator_template.render(&self.variables())
    }

    fn variables(&self) -> [(&str, &str); 3] {
        [
            ("name", self.name.as_str()),
            ("summary", self.summary.as_str()),
            ("profile", self.profile.as_str()),
        ]
    }
}
