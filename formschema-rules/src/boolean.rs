//! Boolean rules

use async_trait::async_trait;
use formschema::RuleError;
use formschema::rule::FieldRule;
use formschema::rule::Issue;
use serde_json::Value;

use crate::issue::SyncCheck;
use crate::issue::invalid_type;
use crate::issue::invalid_value;

/// Rule for checkbox fields.
#[derive(Default)]
pub struct BoolRule {
    optional: bool,
    checks: Vec<SyncCheck<bool>>,
}

impl BoolRule {
    /// Creates a rule accepting either boolean.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a missing value.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    fn expect(mut self, expected: bool, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        self.checks.push(Box::new(move |&v| {
            if v == expected {
                Ok(())
            } else {
                Err(invalid_value("boolean", &msg).param("expected", expected))
            }
        }));
        self
    }

    /// Require the checkbox to be checked.
    pub fn checked(self, msg: impl Into<String>) -> Self {
        self.expect(true, msg)
    }

    /// Require the checkbox to be unchecked.
    pub fn unchecked(self, msg: impl Into<String>) -> Self {
        self.expect(false, msg)
    }
}

#[async_trait]
impl FieldRule for BoolRule {
    async fn parse(&self, value: Value) -> Result<Value, RuleError> {
        let flag = match value {
            Value::Bool(flag) => flag,
            Value::Null if self.optional => return Ok(Value::Null),
            other => return Err(invalid_type("boolean", &other).into()),
        };

        let issues: Vec<Issue> = self
            .checks
            .iter()
            .filter_map(|check| check(&flag).err())
            .collect();
        if issues.is_empty() {
            Ok(Value::Bool(flag))
        } else {
            Err(issues.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_checked() {
        let rule = BoolRule::new().checked("You must accept the terms");
        assert_eq!(rule.parse(json!(true)).await.unwrap(), json!(true));

        match rule.parse(json!(false)).await {
            Err(RuleError::Issues(issues)) => {
                assert_eq!(issues[0].code, "invalid_value");
                assert_eq!(issues[0].params["expected"], json!(true));
            }
            other => panic!("expected issues, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unchecked_and_type() {
        let rule = BoolRule::new().unchecked("Must stay off");
        assert!(rule.parse(json!(false)).await.is_ok());
        assert!(rule.parse(json!("false")).await.is_err());
    }
}
