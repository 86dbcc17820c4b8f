//! Conversion of input element state into raw values.
//!
//! A UI binding reads an input element's text (and checked state) and hands
//! the result to a field setter. The raw value keeps the input's natural
//! shape: numbers for numeric inputs, booleans for checkboxes, and strings
//! for everything else. Parsing beyond that is the rule engine's job.

use serde_json::Number;
use serde_json::Value;

/// Kind of input element a value comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputKind {
    /// Free text (`text`, `email`, `password`, `search`, `tel`, `url`, ...).
    #[default]
    Text,
    /// Numeric input.
    Number,
    /// Slider.
    Range,
    /// Checkbox.
    Checkbox,
    /// Date picker. The raw value stays a `YYYY-MM-DD` string.
    Date,
    /// Date and time picker. The raw value stays a string.
    DateTime,
    /// Single-choice select or radio group.
    Select,
}

impl InputKind {
    /// Maps an HTML `type` attribute to an input kind.
    ///
    /// Unknown types are treated as text.
    pub fn from_type_attr(attr: &str) -> Self {
        match attr.trim().to_ascii_lowercase().as_str() {
            "number" => Self::Number,
            "range" => Self::Range,
            "checkbox" => Self::Checkbox,
            "date" => Self::Date,
            "datetime-local" => Self::DateTime,
            "select" | "select-one" | "radio" => Self::Select,
            _ => Self::Text,
        }
    }

    /// Returns `true` for inputs whose value is numeric.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::Range)
    }
}

/// Converts an input element's state into a raw value.
///
/// `checked` is only read for checkboxes. Numeric inputs yield `null` when
/// empty and the text itself when it does not parse, so the field rule can
/// report it.
pub fn input_value(kind: InputKind, text: &str, checked: bool) -> Value {
    match kind {
        InputKind::Checkbox => Value::Bool(checked),
        InputKind::Number | InputKind::Range => number_value(text),
        InputKind::Text
        | InputKind::Date
        | InputKind::DateTime
        | InputKind::Select => Value::String(text.to_string()),
    }
}

fn number_value(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(text.to_string()))
}
