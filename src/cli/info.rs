//! Model info command

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::config::AppConfig;

use super::load_registry;

/// Show model metadata as JSON
pub async fn info(model: String, config: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::resolve(config)?;
    let registry = load_registry(&config)?;

    let metadata = registry
        .get_model_metadata(&model)
        .ok_or_else(|| anyhow!("Model not found: {}", model))?;

    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}
