//! Model configuration settings

use serde::{Deserialize, Serialize};

/// One configured model.
///
/// The pair of references selects a model kind from the
/// [`ModelFactory`](crate::loader::ModelFactory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfigEntry {
    #[serde(alias = "module_name")]
    pub module_reference: String,

    #[serde(alias = "class_name")]
    pub class_reference: String,
}

impl ModelConfigEntry {
    pub fn new(module_reference: impl Into<String>, class_reference: impl Into<String>) -> Self {
        Self {
            module_reference: module_reference.into(),
            class_reference: class_reference.into(),
        }
    }

    /// The built-in iris classifier
    pub fn iris() -> Self {
        Self::new("iris_model.iris_predict", "IrisModel")
    }
}

/// What to do when a configured model fails to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    /// Stop startup on the first failure
    #[default]
    Abort,
    /// Log the failure and continue with the remaining models
    Skip,
}

pub(crate) fn default_models() -> Vec<ModelConfigEntry> {
    vec![ModelConfigEntry::iris()]
}
