//! Raw input store

use serde_json::Map;
use serde_json::Value;

/// Unvalidated values keyed by field name. Not every field needs a value.
pub type RawInput = Map<String, Value>;

/// Converts a JSON object into raw input.
///
/// Anything other than an object yields empty input.
pub fn raw_input(value: Value) -> RawInput {
    match value {
        Value::Object(map) => map,
        Value::Null => RawInput::new(),
        other => {
            log::warn!("Ignoring non-object raw input: {other}");
            RawInput::new()
        }
    }
}

/// The mutable bag of raw field values.
///
/// Accessors always return copies, so callers never hold a reference into
/// the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawInputStore {
    values: RawInput,
}

impl RawInputStore {
    /// Creates a store holding `values`.
    pub fn new(values: RawInput) -> Self {
        Self { values }
    }

    /// Snapshot of every value.
    pub fn get_all(&self) -> RawInput {
        self.values.clone()
    }

    /// The value of one field.
    pub fn get(&self, field: &str) -> Option<Value> {
        self.values.get(field).cloned()
    }

    /// Replaces every value.
    pub fn set_all(&mut self, values: RawInput) {
        self.values = values;
    }

    /// Shallow-merges `partial` into the stored values.
    pub fn merge(&mut self, partial: RawInput) {
        self.values.extend(partial);
    }

    /// Sets a single field.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.values.insert(field.into(), value);
    }

    /// Snapshot with `field` overridden by `value`; the store is unchanged.
    pub fn with_field(&self, field: &str, value: Value) -> RawInput {
        let mut values = self.values.clone();
        values.insert(field.to_string(), value);
        values
    }

    /// Returns the number of fields holding a value.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no field holds a value.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
