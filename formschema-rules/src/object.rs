//! Nested object rules

use std::sync::Arc;

use async_trait::async_trait;
use formschema::RuleError;
use formschema::rule::FieldRule;
use formschema::rule::Issue;
use formschema::rule::SharedRule;
use futures::future::join_all;
use serde_json::Map;
use serde_json::Value;

use crate::issue::invalid_type;

/// Rule for a nested object with its own fields.
///
/// Issues from a child are reported under the child's key, so a failing
/// `street` inside `address` surfaces at `address.street` on the form.
/// Keys without a rule are dropped from the output.
#[derive(Default)]
pub struct ObjectRule {
    fields: Vec<(String, SharedRule)>,
    optional: bool,
}

impl ObjectRule {
    /// Creates a rule for an object with no declared fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field. Redeclaring a name replaces its rule.
    pub fn field(mut self, name: impl Into<String>, rule: impl FieldRule + 'static) -> Self {
        let name = name.into();
        let rule: SharedRule = Arc::new(rule);
        match self.fields.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = rule,
            None => self.fields.push((name, rule)),
        }
        self
    }

    /// Accept a missing value.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

#[async_trait]
impl FieldRule for ObjectRule {
    async fn parse(&self, value: Value) -> Result<Value, RuleError> {
        let mut input = match value {
            Value::Object(input) => input,
            Value::Null if self.optional => return Ok(Value::Null),
            other => return Err(invalid_type("object", &other).into()),
        };

        let results = join_all(self.fields.iter().map(|(key, rule)| {
            let child = input.remove(key).unwrap_or(Value::Null);
            async move { (key, rule.parse(child).await) }
        }))
        .await;

        let mut output = Map::new();
        let mut issues: Vec<Issue> = Vec::new();
        for (key, result) in results {
            match result {
                Ok(parsed) => {
                    output.insert(key.clone(), parsed);
                }
                Err(RuleError::Issues(found)) => {
                    issues.extend(found.into_iter().map(|issue| issue.at(key.as_str())));
                }
                Err(unexpected) => return Err(unexpected),
            }
        }

        if issues.is_empty() {
            Ok(Value::Object(output))
        } else {
            Err(issues.into())
        }
    }
}
