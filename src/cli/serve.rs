//! HTTP server command

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::config::AppConfig;
use crate::server;

use super::load_registry;

/// Start the prediction server
pub async fn serve(config: Option<PathBuf>, port: Option<u16>, host: Option<String>) -> Result<()> {
    let mut config = AppConfig::resolve(config)?;
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(host) = host {
        config.server.host = host;
    }

    tracing::info!("Loading models from configuration");
    let registry = Arc::new(load_registry(&config)?);
    tracing::info!("Finished loading {} models", registry.len());

    if registry.is_empty() {
        tracing::warn!("No models loaded; every prediction request will fail");
    }

    tracing::info!("Starting server at http://{}", config.server.addr());
    server::start(registry, config.server).await?;

    Ok(())
}
