//! Rule engine contract.
//!
//! The core never inspects values itself. Each declared field owns a
//! [`FieldRule`] supplied by an engine adapter; cross-field predicates are
//! expressed as [`CrossFieldRule`]s over the whole validated form.

mod cross;
mod issue;
mod resolve;

pub use cross::*;
pub use issue::*;
pub use resolve::*;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RuleError;

/// Validation capability for a single field.
///
/// Given a raw value, a rule yields the transformed value (a trimmed string,
/// a parsed number, ...) or the list of issues it found. Rules may suspend,
/// for example to run a remote uniqueness check.
#[async_trait]
pub trait FieldRule: Send + Sync {
    /// Validate `value`, returning the transformed value on success.
    async fn parse(&self, value: Value) -> Result<Value, RuleError>;
}

/// Shared handle to a resolved field rule.
pub type SharedRule = Arc<dyn FieldRule>;

#[async_trait]
impl<R: FieldRule + ?Sized> FieldRule for Arc<R> {
    async fn parse(&self, value: Value) -> Result<Value, RuleError> {
        (**self).parse(value).await
    }
}

/// A field rule backed by an async closure.
pub struct FnRule<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> FieldRule for FnRule<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, RuleError>> + Send + 'static,
{
    async fn parse(&self, value: Value) -> Result<Value, RuleError> {
        (self.f)(value).await
    }
}

/// Wrap an async closure as a [`FieldRule`].
///
/// # Example
///
/// ```
/// use formschema::rule::{rule_fn, Issue};
/// use formschema::RuleError;
///
/// let not_null = rule_fn(|value: serde_json::Value| async move {
///     if value.is_null() {
///         Err(RuleError::issue(Issue::new("required").message("Required")))
///     } else {
///         Ok(value)
///     }
/// });
/// # let _ = not_null;
/// ```
pub fn rule_fn<F, Fut>(f: F) -> FnRule<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, RuleError>> + Send + 'static,
{
    FnRule { f }
}
