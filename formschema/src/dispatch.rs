//! Validation dispatch.
//!
//! Each request picks one of four strategies: the whole stored form, one
//! stored field, an external input checked as a whole, or a candidate value
//! for one field. Field requests further split on whether the field is
//! refined: refined fields are validated in whole-form context and keep
//! only the issues under their own path.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::join_all;
use serde_json::Map;
use serde_json::Value;

use crate::error::FieldError;
use crate::error::RuleError;
use crate::error::ValidationError;
use crate::error::is_within;
use crate::error::panic_message;
use crate::rule::SharedRule;
use crate::schema::Inner;
use crate::schema::read;
use crate::schema::write;
use crate::store::RawInput;

/// What to validate.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationRequest {
    /// The stored input as a whole. Replaces the error store.
    All,
    /// One field of the stored input. Replaces that field's errors.
    Field(String),
    /// An external input as a whole. Leaves both stores untouched.
    Values(RawInput),
    /// A candidate value for one field, checked against the stored input
    /// without storing the value. Replaces that field's errors.
    FieldValue(String, Value),
}

impl ValidationRequest {
    /// The field this request targets, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Field(field) | Self::FieldValue(field, _) => Some(field),
            Self::All | Self::Values(_) => None,
        }
    }
}

impl std::fmt::Display for ValidationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "whole form"),
            Self::Field(field) => write!(f, "field '{field}'"),
            Self::Values(_) => write!(f, "external input"),
            Self::FieldValue(field, _) => write!(f, "candidate value for '{field}'"),
        }
    }
}

impl Inner {
    /// Runs one validation request and notifies listeners exactly once.
    ///
    /// Returns the validated value: the whole form for whole-form requests,
    /// the field's value for field requests.
    pub(crate) async fn dispatch(&self, request: ValidationRequest) -> Result<Value, ValidationError> {
        let name = &self.config.name;
        let outcome = match request {
            ValidationRequest::All => {
                log::debug!("[{name}] Validating whole form");
                self.validate_stored_form().await
            }
            ValidationRequest::Field(field) => {
                let input = read(&self.raw).get_all();
                self.validate_one(&field, input).await
            }
            ValidationRequest::Values(values) => {
                log::debug!("[{name}] Checking external input");
                self.run_form(values)
                    .await
                    .map_err(|error| self.to_validation_error(error, None))
            }
            ValidationRequest::FieldValue(field, value) => {
                let input = read(&self.raw).with_field(&field, value);
                self.validate_one(&field, input).await
            }
        };
        self.notifier.notify();
        outcome
    }

    async fn validate_stored_form(&self) -> Result<Value, ValidationError> {
        write(&self.errors).clear_all();
        let input = read(&self.raw).get_all();

        match self.run_form(input).await {
            Ok(value) => {
                write(&self.errors).clear_all();
                Ok(value)
            }
            Err(error) => {
                let error = self.to_validation_error(error, None);
                write(&self.errors).set_all(error.errors.clone());
                Err(error)
            }
        }
    }

    async fn validate_one(&self, field: &str, input: RawInput) -> Result<Value, ValidationError> {
        let name = &self.config.name;
        write(&self.errors).clear_field(field);

        let outcome = match self.rules.get(field).map(Arc::clone) {
            None => {
                log::debug!("[{name}] Unknown field '{field}'");
                Err(ValidationError::new(vec![FieldError::unknown_field(field)]))
            }
            Some(rule) => {
                let refined = read(&self.cross).is_refined(field);
                if refined {
                    log::debug!("[{name}] Validating refined field '{field}' against the whole form");
                    self.validate_in_context(field, input).await
                } else {
                    log::debug!("[{name}] Validating field '{field}'");
                    self.validate_isolated(field, &rule, input).await
                }
            }
        };

        if let Err(error) = &outcome {
            let mut errors = write(&self.errors);
            for field_error in &error.errors {
                errors.add(field_error.clone());
            }
        }
        outcome
    }

    async fn validate_isolated(
        &self,
        field: &str,
        rule: &SharedRule,
        input: RawInput,
    ) -> Result<Value, ValidationError> {
        let value = input.get(field).cloned().unwrap_or(Value::Null);
        parse_guarded(rule, value)
            .await
            .map_err(|error| self.to_validation_error(error.at(field), Some(field)))
    }

    async fn validate_in_context(&self, field: &str, input: RawInput) -> Result<Value, ValidationError> {
        let value = input.get(field).cloned().unwrap_or(Value::Null);

        match self.run_form(input).await {
            Ok(form) => Ok(form.get(field).cloned().unwrap_or(Value::Null)),
            Err(RuleError::Issues(issues)) => {
                let related: Vec<FieldError> = issues
                    .into_iter()
                    .map(FieldError::from_issue)
                    .filter(|error| error.belongs_to(field))
                    .collect();
                // Failures elsewhere in the form do not concern this field.
                if related.is_empty() {
                    Ok(value)
                } else {
                    Err(ValidationError::new(related))
                }
            }
            Err(error) => Err(self.to_validation_error(error, Some(field))),
        }
    }

    /// Validates `input` against every field rule and then every cross-field
    /// rule whose fields all passed.
    ///
    /// On success the value holds the declared fields only.
    pub(crate) async fn run_form(&self, input: RawInput) -> Result<Value, RuleError> {
        let parses = self.rules.iter().map(|(field, rule)| {
            let value = input.get(field).cloned().unwrap_or(Value::Null);
            parse_guarded(rule, value)
        });
        let results = join_all(parses).await;

        let mut output = Map::new();
        let mut issues = Vec::new();
        let mut failed: Vec<&str> = Vec::new();
        for ((field, _), result) in self.rules.iter().zip(results) {
            match result {
                Ok(value) => {
                    output.insert(field.to_string(), value);
                }
                Err(RuleError::Issues(found)) => {
                    failed.push(field);
                    issues.extend(found.into_iter().map(|issue| issue.at(field)));
                }
                Err(unexpected) => return Err(unexpected),
            }
        }

        let cross_rules = read(&self.cross).rules().to_vec();
        if !cross_rules.is_empty() {
            let mut form = output.clone();
            for field in &failed {
                let raw = input.get(*field).cloned().unwrap_or(Value::Null);
                form.insert(field.to_string(), raw);
            }
            let form = Value::Object(form);

            for rule in cross_rules {
                let blocked = rule
                    .paths()
                    .iter()
                    .any(|path| failed.iter().any(|field| is_within(path, field)));
                if blocked {
                    continue;
                }
                if !catch_panics(rule.passes(form.clone())).await? {
                    issues.extend(rule.issues());
                }
            }
        }

        if issues.is_empty() {
            Ok(Value::Object(output))
        } else {
            Err(RuleError::Issues(issues))
        }
    }

    fn to_validation_error(&self, error: RuleError, field: Option<&str>) -> ValidationError {
        match error {
            RuleError::Issues(issues) => {
                ValidationError::new(issues.into_iter().map(FieldError::from_issue).collect())
            }
            RuleError::Unexpected(cause) => {
                let path = field.unwrap_or_default();
                log::warn!(
                    "[{}] Unexpected failure validating '{path}': {cause}",
                    self.config.name
                );
                ValidationError::unexpected(path, cause)
            }
        }
    }
}

/// Runs a field rule, turning panics and empty rejections into unexpected
/// failures.
async fn parse_guarded(rule: &SharedRule, value: Value) -> Result<Value, RuleError> {
    match catch_panics(rule.parse(value)).await? {
        Err(RuleError::Issues(issues)) if issues.is_empty() => Err(RuleError::unexpected(
            "Rule rejected the value without reporting any issue",
        )),
        outcome => outcome,
    }
}

async fn catch_panics<F: Future>(future: F) -> Result<F::Output, RuleError> {
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| RuleError::unexpected(format!("Rule panicked: {}", panic_message(&panic))))
}
