//! Route definitions

use std::sync::Arc;

use axum::{routing::get, Router};

use super::channel::channel;
use super::handlers::{health, list_models, model_metadata, AppState};

/// Create the API router
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Model catalog
        .route("/models", get(list_models))
        .route("/models/:qualified_name/metadata", get(model_metadata))
        // Persistent prediction channel
        .route("/channel", get(channel))
}
