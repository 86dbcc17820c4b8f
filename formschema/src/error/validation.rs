//! Aggregate validation error

use std::sync::Arc;

use super::FIELD_UNKNOWN;
use super::FieldError;
use super::UNEXPECTED;

/// Separator between `path: message` pairs in the summary message.
const SUMMARY_SEPARATOR: &str = ", ";

/// Broad classification of a [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input was rejected by the rules. Expected during editing.
    UserInput,
    /// A field name outside the schema was referenced. Signals a caller bug.
    Programmer,
    /// The rule engine failed for a reason unrelated to the input.
    Unexpected,
}

/// The combined outcome of a failed validation pass.
///
/// Carries every individual [`FieldError`] plus a summary message built by
/// joining `path: message` pairs with `, `.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Every error reported by the pass, in engine order.
    pub errors: Vec<FieldError>,
    /// Summary of all errors.
    pub message: String,
    #[source]
    cause: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl ValidationError {
    /// Creates a new aggregate error from individual field errors.
    pub fn new(errors: Vec<FieldError>) -> Self {
        let message = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(SUMMARY_SEPARATOR);
        Self {
            errors,
            message,
            cause: None,
        }
    }

    /// Creates an `UNEXPECTED` error at `path` wrapping the original failure.
    pub fn unexpected(
        path: impl Into<String>,
        cause: impl Into<Arc<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        let cause = cause.into();
        let mut error = Self::new(vec![FieldError::unexpected(path, cause.to_string())]);
        error.cause = Some(cause);
        error
    }

    /// The original failure behind an `UNEXPECTED` error, if any.
    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Classifies this error by the codes it carries.
    ///
    /// Unexpected failures take precedence over unknown-field errors, which
    /// take precedence over ordinary input errors.
    pub fn kind(&self) -> ErrorKind {
        if self.errors.iter().any(|e| e.code == UNEXPECTED) {
            ErrorKind::Unexpected
        } else if self.errors.iter().any(|e| e.code == FIELD_UNKNOWN) {
            ErrorKind::Programmer
        } else {
            ErrorKind::UserInput
        }
    }

    /// Returns the errors attributed to `path`.
    pub fn errors_for<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors.iter().filter(move |e| e.path == path)
    }

    /// Returns the dot-joined paths that failed, in order, without duplicates.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = Vec::new();
        for error in &self.errors {
            if !paths.contains(&error.path.as_str()) {
                paths.push(&error.path);
            }
        }
        paths
    }
}
