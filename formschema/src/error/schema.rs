//! Schema construction errors

/// Errors that can occur while building a form schema or registering rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A field was declared with an empty name.
    ///
    /// The empty path is reserved for form-level errors.
    #[error("Field names must not be empty")]
    EmptyFieldName,

    /// A cross-field rule was registered without any field paths.
    #[error("Cross-field rule '{code}' does not list any field paths")]
    EmptyCrossFieldRule {
        /// Code of the offending rule.
        code: String,
    },
}
