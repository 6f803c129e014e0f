//! HTTP and WebSocket server
//!
//! Serves the model catalog over REST and predictions over a persistent
//! WebSocket channel, both backed by one shared registry.

mod channel;
mod handlers;
mod routes;

use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::registry::ModelRegistry;

pub use channel::{decode_binary_frame, decode_frame, ChannelEvent, Inbound};
pub use handlers::{AppState, ModelsResponse};
pub use routes::api_routes;

/// Build the application router for a loaded registry
pub fn router(registry: Arc<ModelRegistry>, config: &ServerConfig) -> Router {
    let dispatcher = Dispatcher::new(registry).with_timeout(config.predict_timeout());
    let state = Arc::new(AppState::new(dispatcher, config));

    let mut app = Router::new()
        .merge(api_routes())
        .layer(DefaultBodyLimit::max(config.max_body_size));

    if config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }
    if config.request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app.with_state(state)
}

/// Start the server.
///
/// The registry must be fully loaded; it is only read from here on.
pub async fn start(registry: Arc<ModelRegistry>, config: ServerConfig) -> Result<()> {
    let app = router(registry, &config);

    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /health - Health check");
    tracing::info!("  GET  /models - List models");
    tracing::info!("  GET  /models/:qualified_name/metadata - Model metadata");
    tracing::info!("  GET  /channel - Prediction channel (WebSocket)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
