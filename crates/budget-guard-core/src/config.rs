//! Configuration management for Budget Guard
//!
//! Settings are layered: built-in defaults, then an optional config file, then
//! `BUDGET_GUARD_*` environment variables (nested keys joined with `__`).
//! When no project id has been configured, `GCLOUD_PROJECT` and
//! `GOOGLE_CLOUD_PROJECT` are consulted, matching what Cloud Run and Cloud
//! Functions inject.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::ProjectName;

/// Environment prefix for overrides
pub const ENV_PREFIX: &str = "BUDGET_GUARD";

/// Environment variables checked for the project id, in order
pub const PROJECT_ID_ENV_VARS: [&str; 2] = ["GCLOUD_PROJECT", "GOOGLE_CLOUD_PROJECT"];

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Project whose billing is guarded
    #[serde(default)]
    pub project_id: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Cloud Billing client configuration
    pub billing: BillingConfig,

    /// Failure handling policy
    pub policy: PolicyConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            server: ServerConfig::default(),
            billing: BillingConfig::default(),
            policy: PolicyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// `project_id` takes precedence over every other source.
    pub fn load(path: Option<&Path>, project_id: Option<&str>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Config::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut config: Config = settings.try_deserialize()?;

        if let Some(project_id) = project_id {
            config.project_id = project_id.trim().to_string();
        }

        if config.project_id.trim().is_empty() {
            if let Some(project_id) = project_id_from_env() {
                config.project_id = project_id;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        let project_id = self.project_id.trim();
        if project_id.is_empty() {
            return Err(Error::config(format!(
                "project id is not set; export {} or {}_PROJECT_ID",
                PROJECT_ID_ENV_VARS.join(" / "),
                ENV_PREFIX
            )));
        }
        if project_id.contains('/') {
            return Err(Error::config(format!(
                "project id must be a bare id, not a resource name: {project_id}"
            )));
        }
        if self.billing.endpoint.trim().is_empty() {
            return Err(Error::config("billing.endpoint cannot be empty"));
        }
        if self.billing.timeout.is_zero() {
            return Err(Error::config("billing.timeout must be greater than zero"));
        }
        Ok(())
    }

    /// Resource name of the guarded project
    pub fn project_name(&self) -> ProjectName {
        ProjectName::from_project_id(self.project_id.trim())
    }
}

fn project_id_from_env() -> Option<String> {
    PROJECT_ID_ENV_VARS
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// HTTP port for the push endpoint
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Cloud Billing client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Base URL of the Cloud Billing REST API
    pub endpoint: String,
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Static bearer token; the metadata server is used when unset
    #[serde(default)]
    pub access_token: Option<String>,
    /// Metadata server token URL
    pub metadata_token_url: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://cloudbilling.googleapis.com/v1".to_string(),
            timeout: Duration::from_secs(30),
            access_token: None,
            metadata_token_url: "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token".to_string(),
        }
    }
}

/// What the message handler does after the evaluation chain fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HandlerFailurePolicy {
    /// Log the failure and acknowledge the message; no redelivery
    #[default]
    Swallow,
    /// Log the failure and report it so the transport redelivers
    Propagate,
}

/// Failure handling configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Behaviour when the evaluation chain returns an error
    #[serde(default)]
    pub on_failure: HandlerFailurePolicy,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (overridden by `RUST_LOG`)
    pub level: String,
    /// Log format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}
