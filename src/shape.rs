//! Expected-shape accessors over loosely typed JSON.
//!
//! Third-party payloads are walked one key at a time. Each step states what it
//! expects to find and returns a [`ShapeError`] naming the full path when the
//! document disagrees, so callers decide per site whether drift is fatal.

use std::fmt;

use serde_json::{Map, Value};

/// The JSON variant actually found at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl JsonKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonKind::Null,
            Value::Bool(_) => JsonKind::Bool,
            Value::Number(_) => JsonKind::Number,
            Value::String(_) => JsonKind::String,
            Value::Array(_) => JsonKind::Array,
            Value::Object(_) => JsonKind::Object,
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JsonKind::Null => "null",
            JsonKind::Bool => "boolean",
            JsonKind::Number => "number",
            JsonKind::String => "string",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// A document did not have the shape a caller expected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("missing field `{path}`")]
    Missing { path: String },

    #[error("field `{path}` is {found}, expected {expected}")]
    WrongType {
        path: String,
        expected: JsonKind,
        found: JsonKind,
    },
}

/// A cursor into a JSON document that remembers how it got there.
#[derive(Debug, Clone)]
pub struct Shape<'a> {
    value: &'a Value,
    path: String,
}

impl<'a> Shape<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self {
            value,
            path: String::new(),
        }
    }

    /// A cursor positioned at `key`, which requires this cursor to be an object.
    pub fn descend(&self, key: &str) -> Result<Shape<'a>, ShapeError> {
        Ok(Shape {
            value: self.field(key)?,
            path: self.child_path(key),
        })
    }

    fn child_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    fn wrong_type(&self, path: String, expected: JsonKind, found: &Value) -> ShapeError {
        ShapeError::WrongType {
            path,
            expected,
            found: JsonKind::of(found),
        }
    }

    /// The value under `key`, which requires this cursor to be an object.
    pub fn field(&self, key: &str) -> Result<&'a Value, ShapeError> {
        let map = self.as_object()?;
        map.get(key).ok_or_else(|| ShapeError::Missing {
            path: self.child_path(key),
        })
    }

    pub fn as_object(&self) -> Result<&'a Map<String, Value>, ShapeError> {
        self.value
            .as_object()
            .ok_or_else(|| self.wrong_type(self.path.clone(), JsonKind::Object, self.value))
    }

    /// Descend into `key`, which must hold an object.
    pub fn object(&self, key: &str) -> Result<&'a Map<String, Value>, ShapeError> {
        let value = self.field(key)?;
        value
            .as_object()
            .ok_or_else(|| self.wrong_type(self.child_path(key), JsonKind::Object, value))
    }

    /// Descend into `key`, which must hold an array.
    pub fn array(&self, key: &str) -> Result<&'a Vec<Value>, ShapeError> {
        let value = self.field(key)?;
        value
            .as_array()
            .ok_or_else(|| self.wrong_type(self.child_path(key), JsonKind::Array, value))
    }
}

/// Read an integer millisecond value, accepting integral and float encodings.
pub fn as_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    }
}

/// Read the numeric field `key` from an event mapping.
pub fn millis_field(map: &Map<String, Value>, key: &str) -> Result<i64, ShapeError> {
    let value = map.get(key).ok_or_else(|| ShapeError::Missing {
        path: key.to_string(),
    })?;
    as_millis(value).ok_or_else(|| ShapeError::WrongType {
        path: key.to_string(),
        expected: JsonKind::Number,
        found: JsonKind::of(value),
    })
}
