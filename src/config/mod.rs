//! Configuration system for predictr
//!
//! An [`AppConfig`] holds the server settings and the ordered list of models
//! to load at startup. It is read from YAML or JSON; with no file the
//! built-in iris model is served on the default port.

mod models;
mod server;

pub use models::{LoadPolicy, ModelConfigEntry};
pub use server::ServerConfig;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "PREDICTR_CONFIG";

/// Predictr configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Models to load, in order
    #[serde(default = "models::default_models")]
    pub models: Vec<ModelConfigEntry>,

    /// Behaviour when a model fails to load
    #[serde(default)]
    pub on_load_error: LoadPolicy,
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration, picking the format from the file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(path),
            _ => Self::from_yaml(path),
        };
        config.with_context(|| format!("Failed to load configuration from {}", path.display()))
    }

    /// Resolve the configuration for a command.
    ///
    /// An explicit path wins, then the `PREDICTR_CONFIG` variable, then the
    /// built-in defaults.
    pub fn resolve(path: Option<PathBuf>) -> Result<Self> {
        let path = path.or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));
        match path {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                Self::from_path(path)
            }
            None => Ok(Self::default()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            models: models::default_models(),
            on_load_error: LoadPolicy::default(),
        }
    }
}
