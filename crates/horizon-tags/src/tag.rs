//! Tag and suggestion records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::text::value_to_text;

/// A tag: an arbitrary record of named fields.
///
/// Which field holds the display text and which one identifies the tag is
/// decided by the options of the list that owns it, not by the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(Map<String, Value>);

/// Suggestions share the tag record shape.
pub type Suggestion = Tag;

impl Tag {
    /// Create an empty record.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Create a record holding `text` under `field`.
    pub fn with_text(field: &str, text: impl Into<String>) -> Self {
        let mut tag = Self::new();
        tag.set_text(field, text);
        tag
    }

    /// Normalize a raw value into a record.
    ///
    /// Objects are taken as-is; any other value becomes `{field: value}`.
    pub fn from_value(value: Value, field: &str) -> Self {
        match value {
            Value::Object(map) => Self(map),
            other => {
                let mut tag = Self::new();
                tag.0.insert(field.to_string(), other);
                tag
            }
        }
    }

    /// Text form of `field`, empty when the field is missing or null.
    pub fn text(&self, field: &str) -> String {
        self.0.get(field).map(value_to_text).unwrap_or_default()
    }

    /// Store `text` under `field`.
    pub fn set_text(&mut self, field: &str, text: impl Into<String>) {
        self.0.insert(field.to_string(), Value::String(text.into()));
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_field(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Get a raw field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Insert a raw field value.
    pub fn insert(&mut self, field: &str, value: impl Into<Value>) {
        self.0.insert(field.to_string(), value.into());
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume the record into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Tag {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Normalize a list of raw values into records keyed by `field`.
pub fn make_records(values: Vec<Value>, field: &str) -> Vec<Tag> {
    values
        .into_iter()
        .map(|value| Tag::from_value(value, field))
        .collect()
}
