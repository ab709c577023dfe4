//! Backend binding configuration.
//!
//! Bindings are owned by the surrounding gateway; this module only describes
//! their shape and offers a YAML loader with environment variable expansion
//! for standalone deployments and tests.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

/// Prefix of the environment variables that override a binding's model name.
pub const MODEL_OVERRIDE_ENV_PREFIX: &str = "TRANSLATOR_MODEL_NAME_OVERRIDE_";

static ENV_VAR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([^}:]+)(?::-?([^}]*))?\}").expect("env var pattern is valid")
});

/// Wire schema spoken by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendSchema {
    /// Native Messages API, forwarded as is.
    #[serde(rename = "anthropic")]
    Anthropic,
    /// Messages API hosted on AWS Bedrock.
    #[serde(rename = "aws-anthropic", alias = "aws_anthropic", alias = "bedrock")]
    AwsAnthropic,
    /// Messages API hosted on GCP Vertex AI.
    #[serde(rename = "gcp-anthropic", alias = "gcp_anthropic", alias = "gcp-vertex")]
    GcpAnthropic,
}

impl BackendSchema {
    /// Whether the backend needs `anthropic_version` in the request body.
    pub fn requires_api_version(&self) -> bool {
        matches!(self, BackendSchema::AwsAnthropic | BackendSchema::GcpAnthropic)
    }
}

impl fmt::Display for BackendSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendSchema::Anthropic => write!(f, "anthropic"),
            BackendSchema::AwsAnthropic => write!(f, "aws-anthropic"),
            BackendSchema::GcpAnthropic => write!(f, "gcp-anthropic"),
        }
    }
}

/// Per-backend translation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendBinding {
    /// Backend name (for registry lookups and logging)
    pub name: String,

    /// Wire schema of the backend
    pub schema: BackendSchema,

    /// Value injected as `anthropic_version` for hosted backends
    #[serde(default)]
    pub api_version: String,

    /// Replaces the request model for path and body when non-empty
    #[serde(default)]
    pub model_name_override: String,
}

impl BackendBinding {
    /// Create a binding with no API version and no override.
    pub fn new(name: impl Into<String>, schema: BackendSchema) -> Self {
        Self {
            name: name.into(),
            schema,
            api_version: String::new(),
            model_name_override: String::new(),
        }
    }

    /// Set the `anthropic_version` value.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Set the model name override.
    pub fn with_model_name_override(mut self, model: impl Into<String>) -> Self {
        self.model_name_override = model.into();
        self
    }
}

/// Top-level configuration: the set of backend bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default)]
    pub backends: Vec<BackendBinding>,
}

impl TranslatorConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use llm_proxy_translator::core::config::TranslatorConfig;
    ///
    /// let config = TranslatorConfig::load("backends.yaml").expect("Failed to load config");
    /// ```
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        // Load .env file if it exists (skip in tests to avoid interference)
        #[cfg(not(test))]
        dotenvy::dotenv().ok();

        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to load config file: {}", path.display()))
    }

    /// Parse configuration from YAML text, expanding `${VAR}` references first.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content);

        let mut config: TranslatorConfig =
            serde_yaml::from_str(&expanded).context("Failed to parse backend configuration")?;

        // Environment variables take precedence over the file
        for binding in &mut config.backends {
            if let Ok(model) = std::env::var(model_override_env_var(&binding.name)) {
                binding.model_name_override = model;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the registry cannot serve unambiguously.
    ///
    /// A missing `api_version` is deliberately not checked here; it is raised
    /// when the first request body is translated.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for binding in &self.backends {
            if binding.name.trim().is_empty() {
                bail!("backend name must not be empty");
            }
            if !seen.insert(binding.name.as_str()) {
                bail!("duplicate backend name: {}", binding.name);
            }
        }
        Ok(())
    }

    /// Find a binding by backend name.
    pub fn find(&self, name: &str) -> Option<&BackendBinding> {
        self.backends.iter().find(|b| b.name == name)
    }
}

/// Name of the environment variable overriding the model of `backend`.
pub fn model_override_env_var(backend: &str) -> String {
    format!(
        "{}{}",
        MODEL_OVERRIDE_ENV_PREFIX,
        backend.to_ascii_uppercase().replace('-', "_")
    )
}

/// Expand environment variables in configuration content.
///
/// Supports patterns: ${VAR}, ${VAR:-default}, ${VAR:default}
fn expand_env_vars(content: &str) -> String {
    ENV_VAR_REGEX
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var_name).unwrap_or_else(|_| default_value.to_string())
        })
        .to_string()
}
