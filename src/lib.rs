//! Predictr - prediction server for machine-learning models
//!
//! Predictr loads a configured set of models into a registry at startup and
//! serves predictions from them over two transports:
//!
//! - **REST**: model catalog and metadata (`GET /models`,
//!   `GET /models/:qualified_name/metadata`)
//! - **WebSocket**: a persistent channel carrying `prediction_request`
//!   events and their `prediction_response` / `prediction_error` replies
//!
//! # Architecture
//!
//! - **model**: the capability contract every model implements
//! - **loader**: turns configuration entries into loaded models
//! - **registry**: read-only catalog of loaded models, keyed by qualified name
//! - **dispatch**: validation, lookup, prediction and error classification
//! - **server**: axum routes and the WebSocket channel
//!
//! # Example
//!
//! ```bash
//! # Serve the configured models
//! predictr serve --config predictr.yaml --port 8080
//!
//! # List configured models
//! predictr list
//!
//! # One prediction from the command line
//! predictr predict iris_model --input '{"sepal_length": 5.1, "sepal_width": 3.5, "petal_length": 1.4, "petal_width": 0.2}'
//! ```

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod loader;
pub mod model;
pub mod registry;
pub mod server;

// Re-export key types
pub use config::{AppConfig, LoadPolicy, ModelConfigEntry, ServerConfig};
pub use dispatch::{Dispatcher, Outcome};
pub use loader::{load_model, LoadError, ModelFactory};
pub use model::{Model, PredictError};
pub use registry::{ModelDescriptor, ModelRegistry};
