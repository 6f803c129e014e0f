//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::dispatch::{Dispatcher, ErrorKind, ErrorResponse, MODEL_NOT_FOUND};
use crate::registry::{ModelRegistry, ModelSummary};

/// Shared application state
pub struct AppState {
    pub dispatcher: Dispatcher,
    /// Largest accepted channel message, in bytes
    pub max_message_size: usize,
    /// In-flight predictions allowed per channel connection
    pub max_concurrent_requests: usize,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, config: &ServerConfig) -> Self {
        Self {
            dispatcher,
            max_message_size: config.max_body_size,
            max_concurrent_requests: config.max_concurrent_requests.max(1),
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        self.dispatcher.registry()
    }
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// List loaded models
pub async fn list_models(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = ModelsResponse {
        models: state
            .registry()
            .get_models()
            .into_iter()
            .map(|descriptor| descriptor.summary())
            .collect(),
    };
    (StatusCode::OK, Json(response))
}

/// Metadata about one model
pub async fn model_metadata(
    State(state): State<Arc<AppState>>,
    Path(qualified_name): Path<String>,
) -> Response {
    match state.registry().get_model_metadata(&qualified_name) {
        Some(metadata) => (StatusCode::OK, Json(metadata)).into_response(),
        // 400 rather than 404: existing clients depend on it
        None => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                model_qualified_name: None,
                kind: ErrorKind::Error,
                message: MODEL_NOT_FOUND.to_string(),
            }),
        )
            .into_response(),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelSummary>,
}
