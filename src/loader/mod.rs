//! Model loading
//!
//! Configuration names a model by a `(module_reference, class_reference)`
//! pair. The [`ModelFactory`] maps those pairs to constructors known at build
//! time, and [`load_model`] turns one configuration entry into a
//! [`ModelDescriptor`] ready for the registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::ModelConfigEntry;
use crate::model::{IrisModel, Model, PredictConcurrency, Serialized};
use crate::registry::ModelDescriptor;

/// Constructor for one kind of model
pub type Constructor = Box<dyn Fn() -> Result<Box<dyn Model>, String> + Send + Sync>;

/// Failure to turn a configuration entry into a loaded model
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("no model registered for {module}.{class}")]
    UnknownModel { module: String, class: String },

    #[error("failed to instantiate {module}.{class}: {reason}")]
    Instantiation {
        module: String,
        class: String,
        reason: String,
    },

    #[error("invalid metadata from {module}.{class}: {reason}")]
    InvalidMetadata {
        module: String,
        class: String,
        reason: String,
    },
}

/// Table of model kinds that can be named in configuration
pub struct ModelFactory {
    constructors: HashMap<(String, String), Constructor>,
}

impl ModelFactory {
    /// Create an empty factory
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Factory with every model kind shipped in this crate
    pub fn builtin() -> Self {
        let mut factory = Self::new();
        factory.register("iris_model.iris_predict", "IrisModel", || {
            Ok(Box::new(IrisModel::new()) as Box<dyn Model>)
        });
        factory
    }

    /// Register a constructor, replacing any previous one for the same pair
    pub fn register<F>(
        &mut self,
        module_reference: impl Into<String>,
        class_reference: impl Into<String>,
        constructor: F,
    ) -> &mut Self
    where
        F: Fn() -> Result<Box<dyn Model>, String> + Send + Sync + 'static,
    {
        self.constructors.insert(
            (module_reference.into(), class_reference.into()),
            Box::new(constructor),
        );
        self
    }

    /// Registered `(module, class)` pairs, sorted
    pub fn kinds(&self) -> Vec<(String, String)> {
        let mut kinds: Vec<_> = self.constructors.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    fn constructor(&self, module: &str, class: &str) -> Option<&Constructor> {
        self.constructors
            .get(&(module.to_string(), class.to_string()))
    }
}

impl Default for ModelFactory {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for ModelFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelFactory")
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// Load one model from its configuration entry.
///
/// The instance is created with no arguments, and its metadata is read and
/// checked. Registering the result is left to the caller.
pub fn load_model(
    entry: &ModelConfigEntry,
    factory: &ModelFactory,
) -> Result<ModelDescriptor, LoadError> {
    let module = entry.module_reference.clone();
    let class = entry.class_reference.clone();

    let constructor = factory
        .constructor(&module, &class)
        .ok_or_else(|| LoadError::UnknownModel {
            module: module.clone(),
            class: class.clone(),
        })?;

    let model = constructor().map_err(|reason| LoadError::Instantiation {
        module: module.clone(),
        class: class.clone(),
        reason,
    })?;

    let invalid = |reason: String| LoadError::InvalidMetadata {
        module: module.clone(),
        class: class.clone(),
        reason,
    };

    if model.qualified_name().trim().is_empty() {
        return Err(invalid("qualified_name is empty".to_string()));
    }
    if model.display_name().trim().is_empty() {
        return Err(invalid("display_name is empty".to_string()));
    }
    model
        .input_schema()
        .check()
        .map_err(|e| invalid(format!("input_schema: {}", e)))?;
    model
        .output_schema()
        .check()
        .map_err(|e| invalid(format!("output_schema: {}", e)))?;

    let instance: Arc<dyn Model> = match model.concurrency() {
        PredictConcurrency::Shared => Arc::from(model),
        PredictConcurrency::Serialized => Arc::new(Serialized::new(model)),
    };

    debug!(
        model = %instance.qualified_name(),
        module = %module,
        class = %class,
        "Model instantiated"
    );

    Ok(ModelDescriptor::from_instance(instance))
}
