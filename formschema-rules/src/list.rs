//! List rules

use async_trait::async_trait;
use formschema::RuleError;
use formschema::rule::FieldRule;
use formschema::rule::Issue;
use futures::future::join_all;
use serde_json::Value;

use crate::issue::SyncCheck;
use crate::issue::invalid_type;
use crate::issue::too_big;
use crate::issue::too_small;

/// Rule for a list whose items all follow one rule.
///
/// Item issues are reported under the item's index.
pub struct ListRule<R> {
    item: R,
    optional: bool,
    checks: Vec<SyncCheck<Vec<Value>>>,
}

impl<R: FieldRule> ListRule<R> {
    /// Creates a rule applying `item` to every element.
    pub fn new(item: R) -> Self {
        Self {
            item,
            optional: false,
            checks: Vec::new(),
        }
    }

    /// Accept a missing value.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Require at least `min` items.
    pub fn min_items(mut self, min: usize, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        self.checks.push(Box::new(move |items| {
            if items.len() >= min {
                Ok(())
            } else {
                Err(too_small("array", min, &msg))
            }
        }));
        self
    }

    /// Allow at most `max` items.
    pub fn max_items(mut self, max: usize, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        self.checks.push(Box::new(move |items| {
            if items.len() <= max {
                Ok(())
            } else {
                Err(too_big("array", max, &msg))
            }
        }));
        self
    }
}

#[async_trait]
impl<R: FieldRule> FieldRule for ListRule<R> {
    async fn parse(&self, value: Value) -> Result<Value, RuleError> {
        let items = match value {
            Value::Array(items) => items,
            Value::Null if self.optional => return Ok(Value::Null),
            other => return Err(invalid_type("array", &other).into()),
        };

        let mut issues: Vec<Issue> = self
            .checks
            .iter()
            .filter_map(|check| check(&items).err())
            .collect();

        let results = join_all(items.into_iter().map(|item| self.item.parse(item))).await;

        let mut output = Vec::with_capacity(results.len());
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(parsed) => output.push(parsed),
                Err(RuleError::Issues(found)) => {
                    issues.extend(found.into_iter().map(|issue| issue.at(index)));
                }
                Err(unexpected) => return Err(unexpected),
            }
        }

        if issues.is_empty() {
            Ok(Value::Array(output))
        } else {
            Err(issues.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::string::StringRule;

    fn tags() -> ListRule<StringRule> {
        ListRule::new(StringRule::new().trim().required("Tag cannot be blank"))
            .min_items(1, "Add at least one tag")
            .max_items(3, "At most three tags")
    }

    #[tokio::test]
    async fn test_item_paths_use_index() {
        match tags().parse(json!(["rust", " ", "forms"])).await {
            Err(RuleError::Issues(issues)) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].path_string(), "1");
            }
            other => panic!("expected issues, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_length_bounds() {
        match tags().parse(json!([])).await {
            Err(RuleError::Issues(issues)) => {
                assert_eq!(issues[0].code, "too_small");
                assert_eq!(issues[0].origin.as_deref(), Some("array"));
                assert!(issues[0].path.is_empty());
            }
            other => panic!("expected issues, got {other:?}"),
        }
        assert!(tags().parse(json!(["a", "b", "c", "d"])).await.is_err());
    }

    #[tokio::test]
    async fn test_outputs_parsed_items() {
        assert_eq!(
            tags().parse(json!([" a ", "b"])).await.unwrap(),
            json!(["a", "b"])
        );
    }
}
