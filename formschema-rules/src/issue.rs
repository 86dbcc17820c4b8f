//! Issue constructors shared by the built-in rules.

use formschema::rule::Issue;
use serde_json::Value;

/// Type alias for synchronous checks run after a value's type is confirmed.
pub(crate) type SyncCheck<V> = Box<dyn Fn(&V) -> Result<(), Issue> + Send + Sync>;

/// Name of a JSON value's type, as reported in `invalid_type` issues.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The value is not of the expected type.
pub fn invalid_type(expected: &str, received: &Value) -> Issue {
    let received = type_name(received);
    Issue::new("invalid_type")
        .message(format!("Expected {expected}, received {received}"))
        .param("expected", expected)
        .param("received", received)
}

/// The value is below a lower bound.
pub fn too_small(origin: &str, minimum: impl Into<Value>, message: &str) -> Issue {
    Issue::new("too_small")
        .origin(origin)
        .message(message)
        .param("minimum", minimum)
        .param("inclusive", true)
}

/// The value is above an upper bound.
pub fn too_big(origin: &str, maximum: impl Into<Value>, message: &str) -> Issue {
    Issue::new("too_big")
        .origin(origin)
        .message(message)
        .param("maximum", maximum)
        .param("inclusive", true)
}

/// The value does not match an expected format.
pub fn invalid_format(origin: &str, format: &str, message: &str) -> Issue {
    Issue::new("invalid_format")
        .origin(origin)
        .message(message)
        .param("format", format)
}

/// The value is of the right type but not an accepted one.
pub fn invalid_value(origin: &str, message: &str) -> Issue {
    Issue::new("invalid_value").origin(origin).message(message)
}

/// A caller-supplied check failed.
pub fn custom(message: &str) -> Issue {
    Issue::new("custom").message(message)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_invalid_type_names_both_types() {
        let issue = invalid_type("string", &json!(3));
        assert_eq!(issue.message.as_deref(), Some("Expected string, received number"));
        assert_eq!(issue.params["received"], json!("number"));
        assert_eq!(issue.origin, None);
    }

    #[test]
    fn test_bounds_carry_origin() {
        let issue = too_small("number", 18, "Too young");
        assert_eq!(issue.origin.as_deref(), Some("number"));
        assert_eq!(issue.params["minimum"], json!(18));
    }
}
