//! Number rules

use async_trait::async_trait;
use formschema::RuleError;
use formschema::rule::FieldRule;
use formschema::rule::Issue;
use serde_json::Number;
use serde_json::Value;

use crate::issue::SyncCheck;
use crate::issue::custom;
use crate::issue::invalid_type;
use crate::issue::too_big;
use crate::issue::too_small;

/// Rule for numeric fields.
#[derive(Default)]
pub struct NumberRule {
    optional: bool,
    coerce: bool,
    checks: Vec<SyncCheck<f64>>,
}

impl NumberRule {
    /// Creates a rule accepting any finite number.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a missing value.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Also accept numeric strings, as typed into text inputs.
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    fn rule<F>(mut self, check: F) -> Self
    where
        F: Fn(&f64) -> Result<(), Issue> + Send + Sync + 'static,
    {
        self.checks.push(Box::new(check));
        self
    }

    /// Require the value to be at least `min`.
    pub fn min(self, min: f64, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        self.rule(move |&v| {
            if v >= min {
                Ok(())
            } else {
                Err(too_small("number", min, &msg))
            }
        })
    }

    /// Require the value to be at most `max`.
    pub fn max(self, max: f64, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        self.rule(move |&v| {
            if v <= max {
                Ok(())
            } else {
                Err(too_big("number", max, &msg))
            }
        })
    }

    /// Require a whole number.
    pub fn integer(self, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        self.rule(move |&v| {
            if v.fract() == 0.0 {
                Ok(())
            } else {
                Err(Issue::new("invalid_type")
                    .message(msg.as_str())
                    .param("expected", "int")
                    .param("received", "number"))
            }
        })
    }

    /// Add a custom check.
    pub fn check<F>(self, f: F, msg: impl Into<String>) -> Self
    where
        F: Fn(f64) -> bool + Send + Sync + 'static,
    {
        let msg = msg.into();
        self.rule(move |&v| if f(v) { Ok(()) } else { Err(custom(&msg)) })
    }

    fn read(&self, value: &Value) -> Option<f64> {
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) if self.coerce => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        number.filter(|n| n.is_finite())
    }
}

#[async_trait]
impl FieldRule for NumberRule {
    async fn parse(&self, value: Value) -> Result<Value, RuleError> {
        if value.is_null() && self.optional {
            return Ok(Value::Null);
        }
        let Some(number) = self.read(&value) else {
            return Err(invalid_type("number", &value).into());
        };

        let issues: Vec<Issue> = self
            .checks
            .iter()
            .filter_map(|check| check(&number).err())
            .collect();
        if !issues.is_empty() {
            return Err(issues.into());
        }

        Ok(match value {
            Value::Number(_) => value,
            _ => number_value(number),
        })
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}
