//! CLI commands

mod info;
mod list;
mod predict;
mod serve;

pub use info::info;
pub use list::list;
pub use predict::predict;
pub use serve::serve;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::loader::ModelFactory;
use crate::registry::ModelRegistry;

/// Predictr - serve machine-learning model predictions over HTTP and WebSocket
#[derive(Parser)]
#[command(name = "predictr")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the prediction server
    Serve {
        /// Configuration file (YAML or JSON)
        #[arg(long, short, env = "PREDICTR_CONFIG")]
        config: Option<PathBuf>,

        /// Port to listen on (overrides the configuration)
        #[arg(long)]
        port: Option<u16>,

        /// Host to bind to (overrides the configuration)
        #[arg(long)]
        host: Option<String>,
    },

    /// List configured models
    List {
        /// Configuration file (YAML or JSON)
        #[arg(long, short, env = "PREDICTR_CONFIG")]
        config: Option<PathBuf>,

        /// Show schemas as well
        #[arg(long, short)]
        verbose: bool,
    },

    /// Show the metadata of one model
    Info {
        /// Qualified name of the model
        model: String,

        /// Configuration file (YAML or JSON)
        #[arg(long, short, env = "PREDICTR_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Make one prediction without starting the server
    Predict {
        /// Qualified name of the model
        model: String,

        /// Input data as a JSON object
        #[arg(long, short)]
        input: String,

        /// Configuration file (YAML or JSON)
        #[arg(long, short, env = "PREDICTR_CONFIG")]
        config: Option<PathBuf>,
    },
}

/// Load every configured model with the built-in factory
pub(crate) fn load_registry(config: &AppConfig) -> Result<ModelRegistry> {
    let factory = ModelFactory::builtin();
    ModelRegistry::from_config(&config.models, &factory, config.on_load_error)
        .context("Failed to load models from configuration")
}
