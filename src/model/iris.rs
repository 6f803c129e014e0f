//! Built-in iris species classifier
//!
//! Nearest-centroid classifier over the four classic iris measurements.
//! Centroids are the per-species means of Fisher's iris data set.

use serde_json::Value;

use super::{Document, JsonSchema, JsonSchemaProperty, Model, PredictError};

const FEATURES: [&str; 4] = ["sepal_length", "sepal_width", "petal_length", "petal_width"];

const SCHEMA_BASE: &str = "https://predictr.dev/schemas/iris_model";

const CENTROIDS: [(&str, [f64; 4]); 3] = [
    ("setosa", [5.006, 3.428, 1.462, 0.246]),
    ("versicolor", [5.936, 2.770, 4.260, 1.326]),
    ("virginica", [6.588, 2.974, 5.552, 2.026]),
];

/// Iris species classifier
pub struct IrisModel {
    input_schema: JsonSchema,
    output_schema: JsonSchema,
}

impl IrisModel {
    pub fn new() -> Self {
        let mut input_schema = JsonSchema::object(format!("{}/input.json", SCHEMA_BASE))
            .with_title("IrisModelInput");
        for feature in FEATURES {
            let description = format!("{} of the flower in centimeters.", feature.replace('_', " "));
            input_schema = input_schema.property(
                feature,
                JsonSchemaProperty::new("number").with_description(description),
                true,
            );
        }

        let output_schema = JsonSchema::object(format!("{}/output.json", SCHEMA_BASE))
            .with_title("IrisModelOutput")
            .property(
                "species",
                JsonSchemaProperty::new("string")
                    .with_description("The predicted species of the flower."),
                true,
            );

        Self {
            input_schema,
            output_schema,
        }
    }

    fn classify(measurements: &[f64; 4]) -> &'static str {
        let mut best = CENTROIDS[0].0;
        let mut best_distance = f64::INFINITY;
        for &(species, ref centroid) in CENTROIDS.iter() {
            let distance: f64 = centroid
                .iter()
                .zip(measurements)
                .map(|(c, m)| (c - m).powi(2))
                .sum();
            if distance < best_distance {
                best_distance = distance;
                best = species;
            }
        }
        best
    }
}

impl Default for IrisModel {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for IrisModel {
    fn display_name(&self) -> &str {
        "Iris Model"
    }

    fn qualified_name(&self) -> &str {
        "iris_model"
    }

    fn description(&self) -> &str {
        "A model that predicts the species of a flower based on its measurements."
    }

    fn major_version(&self) -> u32 {
        0
    }

    fn minor_version(&self) -> u32 {
        1
    }

    fn input_schema(&self) -> &JsonSchema {
        &self.input_schema
    }

    fn output_schema(&self) -> &JsonSchema {
        &self.output_schema
    }

    fn predict(&self, input: &Document) -> Result<Document, PredictError> {
        self.input_schema
            .validate(input)
            .map_err(PredictError::Schema)?;

        let mut measurements = [0.0; 4];
        for (slot, feature) in measurements.iter_mut().zip(FEATURES) {
            *slot = input
                .get(feature)
                .and_then(Value::as_f64)
                .ok_or_else(|| {
                    PredictError::Failed(format!("{} is not representable as f64", feature))
                })?;
        }

        let mut prediction = Document::new();
        prediction.insert(
            "species".to_string(),
            Value::String(Self::classify(&measurements).to_string()),
        );
        Ok(prediction)
    }
}
