//! Configuration for Pressflow
//!
//! Sources are layered with precedence:
//! 1. Default values
//! 2. `pressflow.toml` in the working directory (optional)
//! 3. Environment variables prefixed with `PRESSFLOW__`, e.g.
//!    `PRESSFLOW__WORKFLOW__MAX_CONFLICT_RETRIES=5`

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::CoreError;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PressflowConfig {
    /// Workflow engine settings
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Database settings (optional)
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

/// Workflow service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// How many times a transition is re-planned after losing a version race
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
}

fn default_max_conflict_retries() -> u32 {
    3
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: default_max_conflict_retries(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directives (e.g., "info,pressflow_core=debug")
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Emit JSON lines instead of pretty output
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

/// Database connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string
    pub url: String,

    /// Maximum connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    /// Run migrations on startup
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_run_migrations() -> bool {
    true
}

impl PressflowConfig {
    /// Load configuration from `pressflow.toml` and the environment
    pub fn load() -> Result<Self, CoreError> {
        let config = Config::builder()
            .add_source(File::with_name("pressflow").required(false))
            .add_source(
                Environment::with_prefix("PRESSFLOW")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: PressflowConfig = config.try_deserialize()?;
        loaded.validate()?;
        info!(
            max_conflict_retries = loaded.workflow.max_conflict_retries,
            database = loaded.database.is_some(),
            "Configuration loaded"
        );
        Ok(loaded)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml_str(toml: &str) -> Result<Self, CoreError> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        let loaded: PressflowConfig = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    fn validate(&self) -> Result<(), CoreError> {
        if let Some(database) = &self.database {
            if database.url.trim().is_empty() {
                return Err(CoreError::ConfigurationError(
                    "database.url must not be empty".to_string(),
                ));
            }
            if database.max_connections == 0 {
                return Err(CoreError::ConfigurationError(
                    "database.max_connections must be at least 1".to_string(),
                ));
            }
        }
        Ok(())
    }
}
