//! Date rules
//!
//! Date inputs hand over strings; the rule parses them and outputs the date
//! normalized to ISO 8601 (`YYYY-MM-DD`).

use async_trait::async_trait;
use chrono::NaiveDate;
use formschema::RuleError;
use formschema::rule::FieldRule;
use formschema::rule::Issue;
use serde_json::Value;

use crate::issue::SyncCheck;
use crate::issue::invalid_format;
use crate::issue::invalid_type;
use crate::issue::too_big;
use crate::issue::too_small;

const ISO_DATE: &str = "%Y-%m-%d";

/// Rule for date fields.
pub struct DateRule {
    format: String,
    invalid_message: String,
    optional: bool,
    checks: Vec<SyncCheck<NaiveDate>>,
}

impl Default for DateRule {
    fn default() -> Self {
        Self {
            format: ISO_DATE.to_string(),
            invalid_message: "Invalid date".to_string(),
            optional: false,
            checks: Vec::new(),
        }
    }
}

impl DateRule {
    /// Creates a rule accepting `YYYY-MM-DD` dates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chrono format used to parse input.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Sets the message reported for unparseable input.
    pub fn invalid_message(mut self, msg: impl Into<String>) -> Self {
        self.invalid_message = msg.into();
        self
    }

    /// Accept a missing or empty value.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Require the date to be on or after `min`.
    pub fn not_before(mut self, min: NaiveDate, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        self.checks.push(Box::new(move |date| {
            if *date >= min {
                Ok(())
            } else {
                Err(too_small("date", min.format(ISO_DATE).to_string(), &msg))
            }
        }));
        self
    }

    /// Require the date to be on or before `max`.
    pub fn not_after(mut self, max: NaiveDate, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        self.checks.push(Box::new(move |date| {
            if *date <= max {
                Ok(())
            } else {
                Err(too_big("date", max.format(ISO_DATE).to_string(), &msg))
            }
        }));
        self
    }
}

#[async_trait]
impl FieldRule for DateRule {
    async fn parse(&self, value: Value) -> Result<Value, RuleError> {
        let text = match &value {
            Value::String(text) if text.trim().is_empty() && self.optional => {
                return Ok(Value::Null);
            }
            Value::String(text) => text.trim(),
            Value::Null if self.optional => return Ok(Value::Null),
            other => return Err(invalid_type("string", other).into()),
        };

        let Ok(date) = NaiveDate::parse_from_str(text, &self.format) else {
            return Err(invalid_format("string", "date", &self.invalid_message).into());
        };

        let issues: Vec<Issue> = self
            .checks
            .iter()
            .filter_map(|check| check(&date).err())
            .collect();
        if issues.is_empty() {
            Ok(Value::String(date.format(ISO_DATE).to_string()))
        } else {
            Err(issues.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_parses_and_normalizes() {
        let rule = DateRule::new().format("%d/%m/%Y");
        assert_eq!(rule.parse(json!("29/02/2024")).await.unwrap(), json!("2024-02-29"));
        assert!(rule.parse(json!("30/02/2024")).await.is_err());
    }

    #[tokio::test]
    async fn test_bounds() {
        let rule = DateRule::new()
            .not_before(date(2000, 1, 1), "Too early")
            .not_after(date(2030, 12, 31), "Too late");
        assert!(rule.parse(json!("2024-06-01")).await.is_ok());

        match rule.parse(json!("1999-12-31")).await {
            Err(RuleError::Issues(issues)) => {
                assert_eq!(issues[0].code, "too_small");
                assert_eq!(issues[0].params["minimum"], json!("2000-01-01"));
            }
            other => panic!("expected issues, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_optional_accepts_blank() {
        let rule = DateRule::new().optional();
        assert_eq!(rule.parse(json!("")).await.unwrap(), Value::Null);
        assert!(DateRule::new().parse(json!("")).await.is_err());
    }
}
