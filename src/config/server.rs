//! Server configuration settings

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// HTTP and WebSocket server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Maximum in-flight predictions per channel connection
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,

    /// Per-prediction timeout in seconds (None = wait for the model)
    #[serde(default)]
    pub predict_timeout_secs: Option<u64>,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Enable request logging
    #[serde(default = "default_true")]
    pub request_logging: bool,

    /// Maximum request body and WebSocket message size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_max_concurrent() -> usize {
    16
}

fn default_true() -> bool {
    true
}

fn default_max_body_size() -> usize {
    1024 * 1024 // 1 MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            max_concurrent_requests: default_max_concurrent(),
            predict_timeout_secs: None,
            cors_enabled: true,
            request_logging: true,
            max_body_size: default_max_body_size(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn predict_timeout(&self) -> Option<Duration> {
        self.predict_timeout_secs.map(Duration::from_secs)
    }
}
