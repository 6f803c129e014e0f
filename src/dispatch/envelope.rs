//! Envelopes exchanged at the system boundary

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::Document;

/// Inbound prediction request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// The model that will make the prediction
    pub model_qualified_name: String,
    /// Input data for the model
    pub input_data: Document,
}

impl PredictionRequest {
    /// Validate a raw payload into a request envelope
    pub fn from_value(payload: Value) -> Result<Self, String> {
        serde_json::from_value(payload).map_err(|e| e.to_string())
    }
}

/// Outbound prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// The model that made the prediction
    pub model_qualified_name: String,
    pub prediction: Document,
}

/// Error kinds reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or incomplete request envelope
    DeserializationError,
    /// Model not found, or an internal failure during prediction
    Error,
    /// Input data does not match the model's input schema
    SchemaError,
}

/// Outbound error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Absent when the failure happened before a model was identified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_qualified_name: Option<String>,

    #[serde(rename = "type")]
    pub kind: ErrorKind,

    pub message: String,
}
