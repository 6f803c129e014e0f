//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use predictr::model::{Document, JsonSchema, JsonSchemaProperty, Model, PredictError};
use predictr::{LoadPolicy, ModelConfigEntry, ModelFactory, ModelRegistry};

/// Model that always fails with an internal error
pub struct Faulty {
    schema: JsonSchema,
}

impl Faulty {
    pub fn new() -> Self {
        Self {
            schema: JsonSchema::object("faulty")
                .property("value", JsonSchemaProperty::new("number"), true),
        }
    }
}

impl Model for Faulty {
    fn display_name(&self) -> &str {
        "Faulty Model"
    }
    fn qualified_name(&self) -> &str {
        "faulty_model"
    }
    fn description(&self) -> &str {
        "Fails every prediction."
    }
    fn major_version(&self) -> u32 {
        2
    }
    fn minor_version(&self) -> u32 {
        0
    }
    fn input_schema(&self) -> &JsonSchema {
        &self.schema
    }
    fn output_schema(&self) -> &JsonSchema {
        &self.schema
    }
    fn predict(&self, input: &Document) -> Result<Document, PredictError> {
        self.schema.validate(input).map_err(PredictError::Schema)?;
        Err(PredictError::Failed("/srv/models/faulty.bin: permission denied".into()))
    }
}

/// Counts concurrent `predict` calls; each call holds for `hold`
pub struct Gauge {
    schema: JsonSchema,
    hold: Duration,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl Gauge {
    pub fn new(hold: Duration, peak: Arc<AtomicUsize>) -> Self {
        Self {
            schema: JsonSchema::object("gauge"),
            hold,
            active: Arc::new(AtomicUsize::new(0)),
            peak,
        }
    }
}

impl Model for Gauge {
    fn display_name(&self) -> &str {
        "Gauge Model"
    }
    fn qualified_name(&self) -> &str {
        "gauge_model"
    }
    fn description(&self) -> &str {
        "Records how many predictions overlap."
    }
    fn major_version(&self) -> u32 {
        1
    }
    fn minor_version(&self) -> u32 {
        0
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
        std::thread::sleep(self.hold);
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(Document::new())
    }
}

/// Registry holding only a [`Gauge`] that reports into `peak`
pub fn gauge_registry(hold: Duration, peak: Arc<AtomicUsize>) -> Arc<ModelRegistry> {
    let mut factory = ModelFactory::new();
    factory.register("tests.gauge", "Gauge", move || {
        Ok(Box::new(Gauge::new(hold, Arc::clone(&peak))) as Box<dyn Model>)
    });
    let configs = vec![ModelConfigEntry::new("tests.gauge", "Gauge")];
    Arc::new(ModelRegistry::from_config(&configs, &factory, LoadPolicy::Abort).unwrap())
}

pub fn factory() -> ModelFactory {
    let mut factory = ModelFactory::builtin();
    factory.register("tests.faulty", "Faulty", || {
        Ok(Box::new(Faulty::new()) as Box<dyn Model>)
    });
    factory
}

pub fn registry() -> Arc<ModelRegistry> {
    let configs = vec![
        ModelConfigEntry::iris(),
        ModelConfigEntry::new("tests.faulty", "Faulty"),
    ];
    Arc::new(ModelRegistry::from_config(&configs, &factory(), LoadPolicy::Abort).unwrap())
}
