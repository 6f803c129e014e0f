//! The prediction dispatcher

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, warn};

use super::classify::{classify, DispatchFailure};
use super::envelope::{ErrorResponse, PredictionRequest, PredictionResponse};
use super::{DispatchState, PREDICTION_ERROR, PREDICTION_RESPONSE};
use crate::model::PredictError;
use crate::registry::ModelRegistry;

/// Result of one dispatch; always ready to be emitted
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Responded(PredictionResponse),
    RespondedWithError {
        /// Failure state the request went through
        failed_at: DispatchState,
        error: ErrorResponse,
    },
}

impl Outcome {
    /// Name of the outbound event carrying this outcome
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Responded(_) => PREDICTION_RESPONSE,
            Self::RespondedWithError { .. } => PREDICTION_ERROR,
        }
    }

    pub fn terminal_state(&self) -> DispatchState {
        match self {
            Self::Responded(_) => DispatchState::Responded,
            Self::RespondedWithError { .. } => DispatchState::RespondedWithError,
        }
    }

    /// The outbound payload
    pub fn payload(&self) -> Value {
        let payload = match self {
            Self::Responded(response) => serde_json::to_value(response),
            Self::RespondedWithError { error, .. } => serde_json::to_value(error),
        };
        // Both envelopes are plain string-keyed structs.
        payload.unwrap_or(Value::Null)
    }
}

/// Runs prediction requests against a shared registry.
///
/// Holds no per-request state; clone it freely and call it from as many
/// tasks as needed.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ModelRegistry>,
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            timeout: None,
        }
    }

    /// Fail predictions that take longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Dispatch one raw prediction request payload
    pub async fn dispatch(&self, payload: Value) -> Outcome {
        match self.run(payload).await {
            Ok(response) => {
                debug!(
                    model = %response.model_qualified_name,
                    state = ?DispatchState::Responded,
                    "Prediction dispatched"
                );
                Outcome::Responded(response)
            }
            Err(failure) => {
                match &failure {
                    DispatchFailure::PredictionFailed { model, cause } => {
                        error!(model = %model, cause = %cause, "Prediction failed");
                    }
                    other => {
                        warn!(state = ?other.state(), failure = ?other, "Prediction request rejected");
                    }
                }
                Outcome::RespondedWithError {
                    failed_at: failure.state(),
                    error: classify(&failure),
                }
            }
        }
    }

    async fn run(&self, payload: Value) -> Result<PredictionResponse, DispatchFailure> {
        debug!(state = ?DispatchState::Received, "Prediction request received");
        let request = PredictionRequest::from_value(payload)
            .map_err(|detail| DispatchFailure::EnvelopeInvalid { detail })?;
        debug!(
            model = %request.model_qualified_name,
            state = ?DispatchState::EnvelopeValid,
            "Prediction envelope valid"
        );

        let descriptor = self
            .registry
            .get_model(&request.model_qualified_name)
            .ok_or_else(|| DispatchFailure::ModelNotFound {
                requested: request.model_qualified_name.clone(),
            })?;
        let model_name = descriptor.qualified_name.clone();
        let model = Arc::clone(&descriptor.instance);
        debug!(model = %model_name, state = ?DispatchState::ModelFound, "Model resolved");

        let input = request.input_data;
        let task = tokio::task::spawn_blocking(move || model.predict(&input));

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                // The blocking call cannot be interrupted; it finishes in the
                // background and its result is dropped.
                Err(_) => {
                    return Err(DispatchFailure::PredictionFailed {
                        model: model_name,
                        cause: format!("timed out after {:?}", limit),
                    })
                }
            },
            None => task.await,
        };

        let prediction = match joined {
            Ok(Ok(prediction)) => prediction,
            Ok(Err(PredictError::Schema(detail))) => {
                return Err(DispatchFailure::SchemaInvalid {
                    model: model_name,
                    detail,
                })
            }
            Ok(Err(PredictError::Failed(cause))) => {
                return Err(DispatchFailure::PredictionFailed {
                    model: model_name,
                    cause,
                })
            }
            Err(join_error) => {
                return Err(DispatchFailure::PredictionFailed {
                    model: model_name,
                    cause: join_error.to_string(),
                })
            }
        };
        debug!(model = %model_name, state = ?DispatchState::Predicted, "Prediction made");

        Ok(PredictionResponse {
            model_qualified_name: model_name,
            prediction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoadPolicy, ModelConfigEntry};
    use crate::dispatch::{ErrorKind, MODEL_NOT_FOUND, PREDICTION_FAILED};
    use crate::loader::ModelFactory;
    use crate::model::{Document, JsonSchema, Model, PredictConcurrency};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behaviour {
        Fail,
        Panic,
        RejectSchema,
        Sleep(Duration),
    }

    struct Scripted {
        name: &'static str,
        behaviour: Behaviour,
        schema: JsonSchema,
    }

    impl Model for Scripted {
        fn display_name(&self) -> &str {
            self.name
        }
        fn qualified_name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            ""
        }
        fn major_version(&self) -> u32 {
            0
        }
        fn minor_version(&self) -> u32 {
            1
        }
        fn input_schema(&self) -> &JsonSchema {
            &self.schema
        }
        fn output_schema(&self) -> &JsonSchema {
            &self.schema
        }
        fn predict(&self, _input: &Document) -> Result<Document, PredictError> {
            match &self.behaviour {
                Behaviour::Fail => Err(PredictError::Failed("connection refused: 10.0.0.3".into())),
                Behaviour::Panic => panic!("model exploded"),
                Behaviour::RejectSchema => {
                    Err(PredictError::Schema("'x' is a required property".into()))
                }
                Behaviour::Sleep(duration) => {
                    std::thread::sleep(*duration);
                    Ok(Document::new())
                }
            }
        }
    }

    fn dispatcher() -> Dispatcher {
        let mut factory = ModelFactory::builtin();
        let scripted: [(&'static str, fn() -> Behaviour); 4] = [
            ("failing", || Behaviour::Fail),
            ("panicking", || Behaviour::Panic),
            ("strict", || Behaviour::RejectSchema),
            ("slow", || Behaviour::Sleep(Duration::from_millis(300))),
        ];
        let mut configs = vec![ModelConfigEntry::iris()];
        for (name, behaviour) in scripted {
            factory.register("test", name, move || {
                Ok(Box::new(Scripted {
                    name,
                    behaviour: behaviour(),
                    schema: JsonSchema::object(name),
                }) as Box<dyn Model>)
            });
            configs.push(ModelConfigEntry::new("test", name));
        }
        let registry = ModelRegistry::from_config(&configs, &factory, LoadPolicy::Abort).unwrap();
        Dispatcher::new(Arc::new(registry))
    }

    fn expect_error(outcome: Outcome) -> (DispatchState, ErrorResponse) {
        match outcome {
            Outcome::RespondedWithError { failed_at, error } => (failed_at, error),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_iris_prediction() {
        let outcome = dispatcher()
            .dispatch(json!({
                "model_qualified_name": "iris_model",
                "input_data": {
                    "sepal_length": 1.1,
                    "sepal_width": 1.1,
                    "petal_length": 1.1,
                    "petal_width": 1.1
                }
            }))
            .await;

        assert_eq!(outcome.event_name(), "prediction_response");
        assert_eq!(outcome.terminal_state(), DispatchState::Responded);
        match outcome {
            Outcome::Responded(response) => {
                assert_eq!(response.model_qualified_name, "iris_model");
                assert!(!response.prediction.is_empty());
            }
            other => panic!("expected response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_input_data() {
        let outcome = dispatcher()
            .dispatch(json!({"model_qualified_name": "iris_model"}))
            .await;
        assert_eq!(outcome.event_name(), "prediction_error");

        let (state, error) = expect_error(outcome);
        assert_eq!(state, DispatchState::EnvelopeInvalid);
        assert_eq!(error.kind, ErrorKind::DeserializationError);
        assert!(error.model_qualified_name.is_none());
    }

    #[tokio::test]
    async fn test_unknown_model() {
        let (state, error) = expect_error(
            dispatcher()
                .dispatch(json!({"model_qualified_name": "ghost_model", "input_data": {}}))
                .await,
        );
        assert_eq!(state, DispatchState::ModelNotFound);
        assert_eq!(error.kind, ErrorKind::Error);
        assert_eq!(error.model_qualified_name.as_deref(), Some("ghost_model"));
        assert_eq!(error.message, MODEL_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_schema_rejection() {
        let (state, error) = expect_error(
            dispatcher()
                .dispatch(json!({"model_qualified_name": "strict", "input_data": {}}))
                .await,
        );
        assert_eq!(state, DispatchState::SchemaInvalid);
        assert_eq!(error.kind, ErrorKind::SchemaError);
        assert_eq!(error.model_qualified_name.as_deref(), Some("strict"));
        assert_eq!(error.message, "'x' is a required property");
    }

    #[tokio::test]
    async fn test_iris_schema_rejection() {
        let (_, error) = expect_error(
            dispatcher()
                .dispatch(json!({
                    "model_qualified_name": "iris_model",
                    "input_data": {"sepal_length": "long"}
                }))
                .await,
        );
        assert_eq!(error.kind, ErrorKind::SchemaError);
        assert!(error.message.contains("'petal_width' is a required property"));
    }

    #[tokio::test]
    async fn test_failure_message_is_generic() {
        for name in ["failing", "panicking"] {
            let (state, error) = expect_error(
                dispatcher()
                    .dispatch(json!({"model_qualified_name": name, "input_data": {}}))
                    .await,
            );
            assert_eq!(state, DispatchState::PredictionFailed);
            assert_eq!(error.kind, ErrorKind::Error);
            assert_eq!(error.model_qualified_name.as_deref(), Some(name));
            assert_eq!(error.message, PREDICTION_FAILED);
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        let dispatcher = dispatcher().with_timeout(Some(Duration::from_millis(20)));
        let (state, error) = expect_error(
            dispatcher
                .dispatch(json!({"model_qualified_name": "slow", "input_data": {}}))
                .await,
        );
        assert_eq!(state, DispatchState::PredictionFailed);
        assert_eq!(error.message, PREDICTION_FAILED);

        let outcome = dispatcher
            .with_timeout(None)
            .dispatch(json!({"model_qualified_name": "slow", "input_data": {}}))
            .await;
        assert_eq!(outcome.terminal_state(), DispatchState::Responded);
    }

    #[tokio::test]
    async fn test_concurrent_dispatches() {
        let dispatcher = dispatcher();
        let mut handles = Vec::new();
        for i in 0..16 {
            let dispatcher = dispatcher.clone();
            handles.push(tokio::spawn(async move {
                let name = if i % 2 == 0 { "iris_model" } else { "ghost_model" };
                dispatcher
                    .dispatch(json!({
                        "model_qualified_name": name,
                        "input_data": {
                            "sepal_length": 6.0,
                            "sepal_width": 2.8,
                            "petal_length": 4.1,
                            "petal_width": 1.3
                        }
                    }))
                    .await
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            let outcome = handle.await.unwrap();
            assert!(outcome.terminal_state().is_terminal());
            if i % 2 == 0 {
                assert_eq!(outcome.payload()["prediction"]["species"], "versicolor");
            } else {
                assert_eq!(outcome.payload()["type"], "ERROR");
            }
        }
    }

    /// Records the largest number of overlapping `predict` calls
    struct Overlap {
        name: &'static str,
        concurrency: PredictConcurrency,
        schema: JsonSchema,
        active: AtomicUsize,
        peak: Arc<AtomicUsize>,
    }

    impl Model for Overlap {
        fn display_name(&self) -> &str {
            self.name
        }
        fn qualified_name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            ""
        }
        fn major_version(&self) -> u32 {
            0
        }
        fn minor_version(&self) -> u32 {
            1
        }
        fn input_schema(&self) -> &JsonSchema {
            &self.schema
        }
        fn output_schema(&self) -> &JsonSchema {
            &self.schema
        }
        fn predict(&self, _input: &Document) -> Result<Document, PredictError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(50));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(Document::new())
        }
        fn concurrency(&self) -> PredictConcurrency {
            self.concurrency
        }
    }

    #[tokio::test]
    async fn test_loaded_models_keep_their_concurrency() {
        let exclusive_peak = Arc::new(AtomicUsize::new(0));
        let shared_peak = Arc::new(AtomicUsize::new(0));

        let mut factory = ModelFactory::new();
        for (name, concurrency, peak) in [
            ("exclusive", PredictConcurrency::Serialized, Arc::clone(&exclusive_peak)),
            ("shared", PredictConcurrency::Shared, Arc::clone(&shared_peak)),
        ] {
            factory.register("test", name, move || {
                Ok(Box::new(Overlap {
                    name,
                    concurrency,
                    schema: JsonSchema::object(name),
                    active: AtomicUsize::new(0),
                    peak: Arc::clone(&peak),
                }) as Box<dyn Model>)
            });
        }
        let configs = vec![
            ModelConfigEntry::new("test", "exclusive"),
            ModelConfigEntry::new("test", "shared"),
        ];
        let registry = ModelRegistry::from_config(&configs, &factory, LoadPolicy::Abort).unwrap();
        let dispatcher = Dispatcher::new(Arc::new(registry));

        let mut handles = Vec::new();
        for i in 0..8 {
            let dispatcher = dispatcher.clone();
            let name = if i % 2 == 0 { "exclusive" } else { "shared" };
            handles.push(tokio::spawn(async move {
                dispatcher
                    .dispatch(json!({"model_qualified_name": name, "input_data": {}}))
                    .await
            }));
        }
        for handle in handles {
            let outcome = handle.await.unwrap();
            assert_eq!(outcome.terminal_state(), DispatchState::Responded);
        }

        assert_eq!(exclusive_peak.load(Ordering::SeqCst), 1);
        assert!(shared_peak.load(Ordering::SeqCst) > 1);
    }
}
