//! Model capability contract
//!
//! Every model served by predictr implements [`Model`]: a set of metadata
//! accessors plus a `predict` call that maps an input document to a
//! prediction document. Models are held behind `Arc<dyn Model>` and shared by
//! every concurrent dispatch, so `predict` must be callable from many threads
//! at once unless the model opts into [`PredictConcurrency::Serialized`].

mod iris;
pub mod schema;

pub use iris::IrisModel;
pub use schema::{JsonSchema, JsonSchemaProperty, SchemaDefect};

use std::sync::Mutex;

use serde_json::{Map, Value};

/// Input and output documents exchanged with a model
pub type Document = Map<String, Value>;

/// Failure raised by [`Model::predict`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredictError {
    /// The input does not conform to the model's input schema.
    /// The detail is safe to return to the caller.
    #[error("{0}")]
    Schema(String),

    /// Any other failure. The detail is for server-side logs only.
    #[error("prediction failed: {0}")]
    Failed(String),
}

/// How a model tolerates concurrent `predict` calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredictConcurrency {
    /// `predict` may run on many threads at once
    #[default]
    Shared,
    /// Calls are serialized through a per-model lock
    Serialized,
}

/// The capability contract every loadable model satisfies
pub trait Model: Send + Sync {
    fn display_name(&self) -> &str;

    /// Unique identifier of the model within a registry
    fn qualified_name(&self) -> &str;

    fn description(&self) -> &str;

    fn major_version(&self) -> u32;

    fn minor_version(&self) -> u32;

    fn input_schema(&self) -> &JsonSchema;

    fn output_schema(&self) -> &JsonSchema;

    /// Make a prediction.
    ///
    /// Implementations validate `input` against their own input schema and
    /// return [`PredictError::Schema`] when it does not conform.
    fn predict(&self, input: &Document) -> Result<Document, PredictError>;

    fn concurrency(&self) -> PredictConcurrency {
        PredictConcurrency::Shared
    }
}

/// Wraps a model whose `predict` is not re-entrant.
///
/// Only calls to this one model wait on the lock; other models keep running.
pub struct Serialized {
    inner: Box<dyn Model>,
    gate: Mutex<()>,
}

impl Serialized {
    pub fn new(inner: Box<dyn Model>) -> Self {
        Self {
            inner,
            gate: Mutex::new(()),
        }
    }
}

impl Model for Serialized {
    fn display_name(&self) -> &str {
        self.inner.display_name()
    }

    fn qualified_name(&self) -> &str {
        self.inner.qualified_name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn major_version(&self) -> u32 {
        self.inner.major_version()
    }

    fn minor_version(&self) -> u32 {
        self.inner.minor_version()
    }

    fn input_schema(&self) -> &JsonSchema {
        self.inner.input_schema()
    }

    fn output_schema(&self) -> &JsonSchema {
        self.inner.output_schema()
    }

    fn predict(&self, input: &Document) -> Result<Document, PredictError> {
        // The lock guards no data; poisoning only means an earlier call panicked.
        let _guard = self
            .gate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.inner.predict(input)
    }

    fn concurrency(&self) -> PredictConcurrency {
        PredictConcurrency::Serialized
    }
}
