//! JSON-Schema documents describing model inputs and outputs
//!
//! Only the subset of JSON Schema that models declare is supported: a flat
//! object with typed properties, a required list and a strict/lenient flag
//! for additional properties.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default schema dialect URI
pub const SCHEMA_DIALECT: &str = "http://json-schema.org/draft-07/schema#";

const KNOWN_TYPES: &[&str] = &[
    "string", "number", "integer", "boolean", "object", "array", "null",
];

/// One property of a JSON object schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchemaProperty {
    /// JSON type name ("number", "string", ...)
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl JsonSchemaProperty {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Top level of a JSON schema document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchema {
    pub id: String,

    /// Schema dialect URI
    #[serde(rename = "$schema")]
    pub schema: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub properties: IndexMap<String, JsonSchemaProperty>,

    pub required: Vec<String>,

    #[serde(rename = "additionalProperties")]
    pub additional_properties: bool,
}

/// Reason a schema document is not well formed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaDefect {
    #[error("schema id is empty")]
    MissingId,

    #[error("schema dialect is empty")]
    MissingDialect,

    #[error("schema type must be \"object\", found \"{0}\"")]
    NotAnObject(String),

    #[error("property '{name}' has unknown type \"{kind}\"")]
    UnknownPropertyType { name: String, kind: String },

    #[error("required property '{0}' is not declared")]
    UndeclaredRequired(String),
}

impl JsonSchema {
    /// Create an empty object schema with the default dialect
    pub fn object(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            schema: SCHEMA_DIALECT.to_string(),
            title: None,
            kind: "object".to_string(),
            properties: IndexMap::new(),
            required: Vec::new(),
            additional_properties: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Declare a property; `required` adds it to the required list
    pub fn property(
        mut self,
        name: impl Into<String>,
        property: JsonSchemaProperty,
        required: bool,
    ) -> Self {
        let name = name.into();
        if required && !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, property);
        self
    }

    /// Check that the document itself is well formed
    pub fn check(&self) -> Result<(), SchemaDefect> {
        if self.id.trim().is_empty() {
            return Err(SchemaDefect::MissingId);
        }
        if self.schema.trim().is_empty() {
            return Err(SchemaDefect::MissingDialect);
        }
        if self.kind != "object" {
            return Err(SchemaDefect::NotAnObject(self.kind.clone()));
        }
        for (name, property) in &self.properties {
            if !KNOWN_TYPES.contains(&property.kind.as_str()) {
                return Err(SchemaDefect::UnknownPropertyType {
                    name: name.clone(),
                    kind: property.kind.clone(),
                });
            }
        }
        if let Some(missing) = self
            .required
            .iter()
            .find(|name| !self.properties.contains_key(*name))
        {
            return Err(SchemaDefect::UndeclaredRequired(missing.clone()));
        }
        Ok(())
    }

    /// Validate a payload against this schema.
    ///
    /// Returns every violation found, joined into one message, so callers
    /// get the full picture in a single round trip.
    pub fn validate(&self, data: &Map<String, Value>) -> Result<(), String> {
        let mut violations = Vec::new();

        for name in &self.required {
            if !data.contains_key(name) {
                violations.push(format!("'{}' is a required property", name));
            }
        }

        for (name, value) in data {
            match self.properties.get(name) {
                Some(property) => {
                    if !matches_type(&property.kind, value) {
                        violations.push(format!(
                            "'{}' is not of type '{}'",
                            name, property.kind
                        ));
                    }
                }
                None if !self.additional_properties => {
                    violations.push(format!(
                        "additional property '{}' is not allowed",
                        name
                    ));
                }
                None => {}
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations.join("; "))
        }
    }
}

fn matches_type(kind: &str, value: &Value) -> bool {
    match kind {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => false,
    }
}
