//! One-shot prediction command

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::dispatch::{Dispatcher, Outcome};

use super::load_registry;

/// Run one prediction and print the outbound event
pub async fn predict(model: String, input: String, config: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::resolve(config)?;
    let registry = Arc::new(load_registry(&config)?);

    let input_data: Value = serde_json::from_str(&input).context("--input is not valid JSON")?;
    let dispatcher = Dispatcher::new(registry).with_timeout(config.server.predict_timeout());

    let outcome = dispatcher
        .dispatch(json!({
            "model_qualified_name": model,
            "input_data": input_data,
        }))
        .await;

    let event = json!({
        "event": outcome.event_name(),
        "data": outcome.payload(),
    });
    println!("{}", serde_json::to_string_pretty(&event)?);

    if let Outcome::RespondedWithError { error, .. } = outcome {
        anyhow::bail!("{}", error.message);
    }
    Ok(())
}
