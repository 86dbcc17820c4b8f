//! String rules

use std::future::Future;

use async_trait::async_trait;
use formschema::RuleError;
use formschema::rule::FieldRule;
use formschema::rule::Issue;
use futures::FutureExt;
use futures::future::BoxFuture;
use regex::Regex;
use serde_json::Value;

use crate::issue::SyncCheck;
use crate::issue::custom;
use crate::issue::invalid_format;
use crate::issue::invalid_type;
use crate::issue::invalid_value;
use crate::issue::too_big;
use crate::issue::too_small;

/// Type alias for async string checks.
type AsyncCheck = Box<dyn Fn(String) -> BoxFuture<'static, Result<(), Issue>> + Send + Sync>;

/// Rule for string fields.
///
/// Synchronous checks all run and report every failure. Async checks run
/// afterwards, in order, and only if every synchronous check passed.
///
/// # Example
///
/// ```
/// use formschema_rules::Rules;
///
/// let username = Rules
///     .string()
///     .trim()
///     .required("Username is required")
///     .min_length(3, "Username must be at least 3 characters");
/// # let _ = username;
/// ```
#[derive(Default)]
pub struct StringRule {
    trim: bool,
    optional: bool,
    checks: Vec<SyncCheck<String>>,
    async_checks: Vec<AsyncCheck>,
}

impl StringRule {
    /// Creates a rule accepting any string.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trim surrounding whitespace before checking; the output is trimmed too.
    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    /// Accept a missing value.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    fn rule<F>(mut self, check: F) -> Self
    where
        F: Fn(&String) -> Result<(), Issue> + Send + Sync + 'static,
    {
        self.checks.push(Box::new(check));
        self
    }

    /// Require the value to be non-blank.
    pub fn required(self, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        self.rule(move |v| {
            if v.trim().is_empty() {
                Err(too_small("string", 1, &msg))
            } else {
                Ok(())
            }
        })
    }

    /// Require minimum length (in characters).
    pub fn min_length(self, min: usize, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        self.rule(move |v| {
            if v.chars().count() >= min {
                Ok(())
            } else {
                Err(too_small("string", min, &msg))
            }
        })
    }

    /// Require maximum length (in characters).
    pub fn max_length(self, max: usize, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        self.rule(move |v| {
            if v.chars().count() <= max {
                Ok(())
            } else {
                Err(too_big("string", max, &msg))
            }
        })
    }

    /// Require the value to match a regex.
    pub fn pattern(self, re: Regex, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        self.rule(move |v| {
            if re.is_match(v) {
                Ok(())
            } else {
                Err(invalid_format("string", "regex", &msg).param("pattern", re.as_str()))
            }
        })
    }

    /// Require a valid email address.
    ///
    /// Empty is valid; use [`required`](Self::required) for non-empty.
    pub fn email(self, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        self.rule(move |v| {
            if v.is_empty() || email_address::EmailAddress::is_valid(v) {
                Ok(())
            } else {
                Err(invalid_format("string", "email", &msg))
            }
        })
    }

    /// Require the value to contain a substring.
    pub fn contains(self, substr: impl Into<String>, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        let substr = substr.into();
        self.rule(move |v| {
            if v.contains(&substr) {
                Ok(())
            } else {
                Err(invalid_format("string", "includes", &msg).param("includes", substr.as_str()))
            }
        })
    }

    /// Require the value to equal another value.
    pub fn equals(self, other: impl Into<String>, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        let other = other.into();
        self.rule(move |v| {
            if *v == other {
                Ok(())
            } else {
                Err(invalid_value("string", &msg))
            }
        })
    }

    /// Add a custom synchronous check.
    pub fn check<F>(self, f: F, msg: impl Into<String>) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        let msg = msg.into();
        self.rule(move |v| if f(v) { Ok(()) } else { Err(custom(&msg)) })
    }

    /// Add a custom asynchronous check, e.g. a remote uniqueness lookup.
    pub fn check_async<F, Fut>(mut self, f: F, msg: impl Into<String>) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let msg = msg.into();
        self.async_checks.push(Box::new(move |v| {
            let fut = f(v);
            let msg = msg.clone();
            async move { if fut.await { Ok(()) } else { Err(custom(&msg)) } }.boxed()
        }));
        self
    }
}

#[async_trait]
impl FieldRule for StringRule {
    async fn parse(&self, value: Value) -> Result<Value, RuleError> {
        let text = match value {
            Value::String(text) => text,
            Value::Null if self.optional => return Ok(Value::Null),
            other => return Err(invalid_type("string", &other).into()),
        };
        let text = if self.trim {
            text.trim().to_string()
        } else {
            text
        };

        let mut issues: Vec<Issue> = self
            .checks
            .iter()
            .filter_map(|check| check(&text).err())
            .collect();
        if issues.is_empty() {
            for check in &self.async_checks {
                if let Err(issue) = check(text.clone()).await {
                    issues.push(issue);
                }
            }
        }

        if issues.is_empty() {
            Ok(Value::String(text))
        } else {
            Err(issues.into())
        }
    }
}
