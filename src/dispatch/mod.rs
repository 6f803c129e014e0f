//! Prediction dispatch
//!
//! One inbound prediction event goes through:
//!
//! ```text
//! RECEIVED -> ENVELOPE_VALID -> MODEL_FOUND -> PREDICTED -> RESPONDED
//!     |             |               |
//!     v             v               v
//! ENVELOPE_INVALID  MODEL_NOT_FOUND SCHEMA_INVALID / PREDICTION_FAILED
//!                     \_______________|____________/
//!                           RESPONDED_WITH_ERROR
//! ```
//!
//! Every request reaches exactly one of the two terminal states.

mod classify;
mod dispatcher;
mod envelope;

pub use classify::{classify, DispatchFailure, MODEL_NOT_FOUND, PREDICTION_FAILED};
pub use dispatcher::{Dispatcher, Outcome};
pub use envelope::{ErrorKind, ErrorResponse, PredictionRequest, PredictionResponse};

/// Event name of an inbound prediction request
pub const PREDICTION_REQUEST: &str = "prediction_request";
/// Event name of a successful prediction
pub const PREDICTION_RESPONSE: &str = "prediction_response";
/// Event name of a failed prediction
pub const PREDICTION_ERROR: &str = "prediction_error";

/// Dispatch states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Received,
    EnvelopeValid,
    ModelFound,
    Predicted,
    Responded,
    EnvelopeInvalid,
    ModelNotFound,
    SchemaInvalid,
    PredictionFailed,
    RespondedWithError,
}

impl DispatchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Responded | Self::RespondedWithError)
    }
}
