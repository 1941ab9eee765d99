//! Configuration documents
//!
//! A [`ConfigDocument`] is always a JSON object at the top level; nested
//! values may be objects, scalars or sequences.

use crate::error::ShapeError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Nested key/value configuration of one source
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDocument(Map<String, Value>);

impl ConfigDocument {
    /// Wrap an already validated mapping
    #[inline]
    #[must_use]
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Create from an arbitrary JSON value
    ///
    /// # Errors
    /// Returns [`ShapeError::NotAMapping`] unless the value is an object
    pub fn from_value(value: Value) -> Result<Self, ShapeError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ShapeError::NotAMapping {
                found: value_kind(&other),
            }),
        }
    }

    /// Parse from JSON text
    ///
    /// # Errors
    /// Returns error if the text is not JSON or not an object
    pub fn from_json(json: &str) -> Result<Self, ShapeError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse from YAML text
    ///
    /// # Errors
    /// Returns error if the text is not YAML or not a mapping
    pub fn from_yaml(yaml: &str) -> Result<Self, ShapeError> {
        let value: Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Top-level entries in document order
    #[inline]
    pub fn entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of top-level keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the document has no keys
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Underlying mapping
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Convert back into a JSON value
    #[inline]
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Depth of nested mappings (a flat document has depth 1)
    #[must_use]
    pub fn depth(&self) -> usize {
        map_depth(&self.0)
    }
}

impl TryFrom<Value> for ConfigDocument {
    type Error = ShapeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// Canonical text of a leaf value
///
/// Strings are used verbatim, sequences keep their literal JSON form so
/// `["a","b"]` and `["b","a"]` stay distinct values.
#[must_use]
pub fn canonical_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn map_depth(map: &Map<String, Value>) -> usize {
    1 + map
        .values()
        .filter_map(Value::as_object)
        .map(map_depth)
        .max()
        .unwrap_or(0)
}
