//! Failure classification
//!
//! Maps every way a dispatch can fail onto the fixed set of error kinds.

use super::envelope::{ErrorKind, ErrorResponse};
use super::DispatchState;

/// Message returned when the requested model is not in the registry
pub const MODEL_NOT_FOUND: &str = "Model not found.";

/// Message returned for internal prediction failures
pub const PREDICTION_FAILED: &str = "Could not make a prediction.";

/// A failed dispatch, by the step that failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchFailure {
    /// The payload is not a valid request envelope
    EnvelopeInvalid { detail: String },
    /// No model with the requested name
    ModelNotFound { requested: String },
    /// The model rejected the input against its schema
    SchemaInvalid { model: String, detail: String },
    /// The model failed, panicked or timed out. `cause` stays server-side.
    PredictionFailed { model: String, cause: String },
}

impl DispatchFailure {
    /// State the dispatcher was in when it failed
    pub fn state(&self) -> DispatchState {
        match self {
            Self::EnvelopeInvalid { .. } => DispatchState::EnvelopeInvalid,
            Self::ModelNotFound { .. } => DispatchState::ModelNotFound,
            Self::SchemaInvalid { .. } => DispatchState::SchemaInvalid,
            Self::PredictionFailed { .. } => DispatchState::PredictionFailed,
        }
    }
}

/// Build the error envelope for a failure
pub fn classify(failure: &DispatchFailure) -> ErrorResponse {
    match failure {
        DispatchFailure::EnvelopeInvalid { detail } => ErrorResponse {
            model_qualified_name: None,
            kind: ErrorKind::DeserializationError,
            message: detail.clone(),
        },
        DispatchFailure::ModelNotFound { requested } => ErrorResponse {
            model_qualified_name: Some(requested.clone()),
            kind: ErrorKind::Error,
            message: MODEL_NOT_FOUND.to_string(),
        },
        DispatchFailure::SchemaInvalid { model, detail } => ErrorResponse {
            model_qualified_name: Some(model.clone()),
            kind: ErrorKind::SchemaError,
            message: detail.clone(),
        },
        DispatchFailure::PredictionFailed { model, .. } => ErrorResponse {
            model_qualified_name: Some(model.clone()),
            kind: ErrorKind::Error,
            message: PREDICTION_FAILED.to_string(),
        },
    }
}
