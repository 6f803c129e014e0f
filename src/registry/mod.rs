//! Model registry
//!
//! The catalog of loaded models, keyed by qualified name. It is populated
//! once at startup through [`ModelRegistry::load_models`] and then shared
//! read-only (behind an `Arc`) by every request handler.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{LoadPolicy, ModelConfigEntry};
use crate::loader::{load_model, LoadError, ModelFactory};
use crate::model::{JsonSchema, Model};

/// Catalog entry for one loaded model
#[derive(Clone)]
pub struct ModelDescriptor {
    pub qualified_name: String,
    pub display_name: String,
    pub description: String,
    pub major_version: u32,
    pub minor_version: u32,
    pub input_schema: JsonSchema,
    pub output_schema: JsonSchema,
    /// The live model
    pub instance: Arc<dyn Model>,
}

impl ModelDescriptor {
    /// Read the metadata off a model instance
    pub fn from_instance(instance: Arc<dyn Model>) -> Self {
        Self {
            qualified_name: instance.qualified_name().to_string(),
            display_name: instance.display_name().to_string(),
            description: instance.description().to_string(),
            major_version: instance.major_version(),
            minor_version: instance.minor_version(),
            input_schema: instance.input_schema().clone(),
            output_schema: instance.output_schema().clone(),
            instance,
        }
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            display_name: self.display_name.clone(),
            qualified_name: self.qualified_name.clone(),
            description: self.description.clone(),
            major_version: self.major_version,
            minor_version: self.minor_version,
        }
    }

    pub fn metadata(&self) -> ModelMetadata {
        ModelMetadata {
            summary: self.summary(),
            input_schema: self.input_schema.clone(),
            output_schema: self.output_schema.clone(),
        }
    }
}

impl fmt::Debug for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDescriptor")
            .field("qualified_name", &self.qualified_name)
            .field("display_name", &self.display_name)
            .field("major_version", &self.major_version)
            .field("minor_version", &self.minor_version)
            .finish_non_exhaustive()
    }
}

/// Short description of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub display_name: String,
    pub qualified_name: String,
    pub description: String,
    pub major_version: u32,
    pub minor_version: u32,
}

/// Full description of a model, including its schemas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(flatten)]
    pub summary: ModelSummary,
    pub input_schema: JsonSchema,
    pub output_schema: JsonSchema,
}

/// An entry skipped under [`LoadPolicy::Skip`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedModel {
    pub entry: ModelConfigEntry,
    pub error: LoadError,
}

/// In-memory catalog of loaded models
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelDescriptor>,
}

impl ModelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configuration in one step
    pub fn from_config(
        configs: &[ModelConfigEntry],
        factory: &ModelFactory,
        policy: LoadPolicy,
    ) -> Result<Self, LoadError> {
        let mut registry = Self::new();
        registry.load_models(configs, factory, policy)?;
        Ok(registry)
    }

    /// Load every configured model, in order.
    ///
    /// When two entries resolve to the same qualified name the later one
    /// wins; it keeps the list position of the first.
    ///
    /// Under [`LoadPolicy::Abort`] the first failure is returned and the
    /// registry is left exactly as it was before the call. Under
    /// [`LoadPolicy::Skip`] failing entries are logged and returned.
    pub fn load_models(
        &mut self,
        configs: &[ModelConfigEntry],
        factory: &ModelFactory,
        policy: LoadPolicy,
    ) -> Result<Vec<SkippedModel>, LoadError> {
        let mut staged = Vec::with_capacity(configs.len());
        let mut skipped = Vec::new();

        for entry in configs {
            match load_model(entry, factory) {
                Ok(descriptor) => staged.push(descriptor),
                Err(error) => match policy {
                    LoadPolicy::Abort => return Err(error),
                    LoadPolicy::Skip => {
                        warn!(
                            module = %entry.module_reference,
                            class = %entry.class_reference,
                            error = %error,
                            "Failed to load model, skipping"
                        );
                        skipped.push(SkippedModel {
                            entry: entry.clone(),
                            error,
                        });
                    }
                },
            }
        }

        for descriptor in staged {
            if let Some(previous) = self
                .models
                .insert(descriptor.qualified_name.clone(), descriptor)
            {
                warn!(
                    model = %previous.qualified_name,
                    "Model configured more than once, keeping the last entry"
                );
            }
        }

        info!(
            count = self.models.len(),
            skipped = skipped.len(),
            "Models loaded"
        );

        Ok(skipped)
    }

    /// All loaded models, in load order
    pub fn get_models(&self) -> Vec<&ModelDescriptor> {
        self.models.values().collect()
    }

    /// Look up a model by qualified name
    pub fn get_model(&self, qualified_name: &str) -> Option<&ModelDescriptor> {
        self.models.get(qualified_name)
    }

    /// Look up a model for its descriptive metadata
    pub fn get_model_metadata(&self, qualified_name: &str) -> Option<ModelMetadata> {
        self.get_model(qualified_name).map(ModelDescriptor::metadata)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
