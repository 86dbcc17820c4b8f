//! Rule engine failures

use std::any::Any;

use crate::rule::Issue;

/// Boxed error carried by unexpected rule failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure returned by a [`FieldRule`](crate::rule::FieldRule).
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// The value was rejected; each issue describes one problem.
    #[error("Rule rejected the value with {} issue(s)", .0.len())]
    Issues(Vec<Issue>),

    /// The rule failed for a reason unrelated to the value itself.
    #[error("Unexpected rule failure: {0}")]
    Unexpected(#[source] BoxError),
}

impl RuleError {
    /// Creates a failure holding a single issue.
    pub fn issue(issue: Issue) -> Self {
        Self::Issues(vec![issue])
    }

    /// Creates an unexpected failure from any error.
    pub fn unexpected(error: impl Into<BoxError>) -> Self {
        Self::Unexpected(error.into())
    }

    /// Prepends `segment` to the path of every issue.
    ///
    /// Unexpected failures are returned unchanged.
    pub fn at(self, segment: impl Into<crate::rule::PathSegment>) -> Self {
        match self {
            Self::Issues(issues) => {
                let segment = segment.into();
                Self::Issues(
                    issues
                        .into_iter()
                        .map(|issue| issue.at(segment.clone()))
                        .collect(),
                )
            }
            unexpected => unexpected,
        }
    }
}

impl From<Vec<Issue>> for RuleError {
    fn from(issues: Vec<Issue>) -> Self {
        Self::Issues(issues)
    }
}

impl From<Issue> for RuleError {
    fn from(issue: Issue) -> Self {
        Self::issue(issue)
    }
}

/// Extract a human-readable message from a panic payload.
pub(crate) fn panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
