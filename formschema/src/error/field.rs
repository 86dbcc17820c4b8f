//! Field-level validation errors

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::rule::Issue;
use crate::rule::join_path;

/// Code of the error raised for a field name the schema does not declare.
pub const FIELD_UNKNOWN: &str = "FIELD_UNKNOWN";

/// Code of the error raised when a rule fails outside its issue format.
pub const UNEXPECTED: &str = "UNEXPECTED";

/// A single validation failure, attributed to a field path.
///
/// `path` uses dot notation for nested fields (`"address.street"`). An empty
/// path marks a form-level error that belongs to no particular field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dot-joined field path, empty for form-level errors.
    pub path: String,
    /// Error code, `origin.code` when the rule reported an origin.
    pub code: String,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// What kind of value the failing rule inspected (`string`, `number`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Extra parameters reported by the rule (bounds, formats, ...).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl FieldError {
    /// Creates a new field error without a message.
    pub fn new(path: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            code: code.into(),
            message: None,
            origin: None,
            params: Map::new(),
        }
    }

    /// Creates a new field error with a message.
    pub fn with_message(
        path: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(path, code)
        }
    }

    /// Error for a field name the schema does not declare.
    pub fn unknown_field(name: &str) -> Self {
        Self::with_message(name, FIELD_UNKNOWN, format!("Unknown Field: {name}"))
    }

    /// Error wrapping a failure the rule engine did not report as issues.
    pub fn unexpected(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_message(path, UNEXPECTED, message)
    }

    /// Converts an engine issue into the stored error shape.
    ///
    /// The path segments are joined with `.`, and the code is prefixed with
    /// the issue's origin when it has one.
    pub fn from_issue(issue: Issue) -> Self {
        let code = match &issue.origin {
            Some(origin) => format!("{origin}.{}", issue.code),
            None => issue.code,
        };
        Self {
            path: join_path(&issue.path),
            code,
            message: issue.message,
            origin: issue.origin,
            params: issue.params,
        }
    }

    /// Returns `true` if this error is not attached to any field.
    pub fn is_form_level(&self) -> bool {
        self.path.is_empty()
    }

    /// Returns `true` if this error is for `field` or one of its nested paths.
    pub fn belongs_to(&self, field: &str) -> bool {
        is_within(&self.path, field)
    }

    /// Message to show for this error, falling back to the code.
    pub fn display_message(&self) -> &str {
        self.message.as_deref().unwrap_or(&self.code)
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_form_level() {
            write!(f, "{}", self.display_message())
        } else {
            write!(f, "{}: {}", self.path, self.display_message())
        }
    }
}

/// Returns `true` if `path` equals `field` or is a dot-separated descendant.
pub(crate) fn is_within(path: &str, field: &str) -> bool {
    match path.strip_prefix(field) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}
