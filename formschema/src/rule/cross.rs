//! Cross-field ("refined") rules.
//!
//! A cross-field rule is a predicate over the whole validated form. Every
//! field it lists becomes refined: validating such a field runs the whole
//! form and keeps only the issues that concern it.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Map;
use serde_json::Value;

use super::Issue;
use super::PathSegment;
use crate::error::SchemaError;
use crate::error::is_within;

/// Type alias for cross-field predicate closures.
type Check = Arc<dyn Fn(Value) -> BoxFuture<'static, bool> + Send + Sync>;

/// A predicate over the whole form, attributed to field paths on failure.
///
/// # Example
///
/// ```
/// use formschema::rule::CrossFieldRule;
///
/// let rule = CrossFieldRule::new(
///     ["password", "confirmPassword"],
///     "passwords_mismatch",
///     |form| form["password"] == form["confirmPassword"],
/// )
/// .message("Passwords do not match")
/// .report_on(["confirmPassword"]);
/// # let _ = rule;
/// ```
#[derive(Clone)]
pub struct CrossFieldRule {
    paths: Vec<String>,
    report_on: Vec<String>,
    code: String,
    message: Option<String>,
    params: Map<String, Value>,
    check: Check,
}

impl CrossFieldRule {
    /// Creates a rule with a synchronous predicate.
    pub fn new<I, S, F>(paths: I, code: impl Into<String>, check: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let check: Check = Arc::new(move |form: Value| futures::future::ready(check(&form)).boxed());
        Self::with_check(paths, code, check)
    }

    /// Creates a rule with an asynchronous predicate.
    pub fn new_async<I, S, F, Fut>(paths: I, code: impl Into<String>, check: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let check: Check = Arc::new(move |form: Value| check(form).boxed());
        Self::with_check(paths, code, check)
    }

    fn with_check<I, S>(paths: I, code: impl Into<String>, check: Check) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: dedup(paths),
            report_on: Vec::new(),
            code: code.into(),
            message: None,
            params: Map::new(),
            check,
        }
    }

    /// Sets the message reported on failure.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a parameter reported on failure.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Restricts which paths a failure is reported on.
    ///
    /// By default a failure is reported on every listed path.
    pub fn report_on<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.report_on = dedup(paths);
        self
    }

    /// The fields this rule reads.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// The paths a failure is reported on.
    pub fn reported_paths(&self) -> &[String] {
        if self.report_on.is_empty() {
            &self.paths
        } else {
            &self.report_on
        }
    }

    /// The code reported on failure.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Runs the predicate against the whole form value.
    pub fn passes(&self, form: Value) -> BoxFuture<'static, bool> {
        (self.check)(form)
    }

    /// The issues reported when the predicate fails.
    pub fn issues(&self) -> Vec<Issue> {
        self.reported_paths()
            .iter()
            .map(|path| Issue {
                path: path.split('.').map(PathSegment::from).collect(),
                code: self.code.clone(),
                message: self.message.clone(),
                origin: None,
                params: self.params.clone(),
            })
            .collect()
    }
}

impl std::fmt::Debug for CrossFieldRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossFieldRule")
            .field("paths", &self.paths)
            .field("report_on", &self.report_on)
            .field("code", &self.code)
            .finish_non_exhaustive()
    }
}

fn dedup<I, S>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut unique: Vec<String> = Vec::new();
    for path in paths {
        let path = path.into();
        if !unique.contains(&path) {
            unique.push(path);
        }
    }
    unique
}

/// Registered cross-field rules and the set of fields they refine.
///
/// Registration is permanent: there is no way to remove a rule, so the set
/// of refined fields only grows and whole-form validation only gets stricter.
#[derive(Debug, Clone, Default)]
pub struct CrossFieldRegistry {
    refined: HashSet<String>,
    rules: Vec<Arc<CrossFieldRule>>,
}

impl CrossFieldRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rule, marking all of its paths as refined.
    pub fn register(&mut self, rule: CrossFieldRule) -> Result<(), SchemaError> {
        if rule.paths.is_empty() {
            return Err(SchemaError::EmptyCrossFieldRule { code: rule.code });
        }
        self.refined.extend(rule.paths.iter().cloned());
        self.refined.extend(rule.report_on.iter().cloned());
        self.rules.push(Arc::new(rule));
        Ok(())
    }

    /// Returns `true` if `field`, or a path nested under it, is refined.
    pub fn is_refined(&self, field: &str) -> bool {
        self.refined.iter().any(|path| is_within(path, field))
    }

    /// Iterates over the refined paths, in no particular order.
    pub fn refined_paths(&self) -> impl Iterator<Item = &str> {
        self.refined.iter().map(String::as_str)
    }

    /// The registered rules, in registration order.
    pub fn rules(&self) -> &[Arc<CrossFieldRule>] {
        &self.rules
    }

    /// Returns the number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn matching_passwords() -> CrossFieldRule {
        CrossFieldRule::new(
            ["password", "confirmPassword"],
            "passwords_mismatch",
            |form| form["password"] == form["confirmPassword"],
        )
    }

    #[test]
    fn test_register_marks_paths_refined() {
        let mut registry = CrossFieldRegistry::new();
        assert!(!registry.is_refined("password"));

        registry.register(matching_passwords()).unwrap();
        assert!(registry.is_refined("password"));
        assert!(registry.is_refined("confirmPassword"));
        assert!(!registry.is_refined("email"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_nested_path_refines_parent_field() {
        let mut registry = CrossFieldRegistry::new();
        registry
            .register(CrossFieldRule::new(["address.zip", "country"], "zip_format", |_| true))
            .unwrap();
        assert!(registry.is_refined("address"));
        assert!(!registry.is_refined("addr"));
    }

    #[test]
    fn test_register_rejects_empty_paths() {
        let mut registry = CrossFieldRegistry::new();
        let rule = CrossFieldRule::new(Vec::<String>::new(), "nothing", |_| true);
        assert_eq!(
            registry.register(rule),
            Err(SchemaError::EmptyCrossFieldRule {
                code: "nothing".to_string()
            })
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_issues_default_to_every_path() {
        let rule = matching_passwords().message("Passwords do not match");
        let paths: Vec<String> = rule.issues().iter().map(Issue::path_string).collect();
        assert_eq!(paths, vec!["password", "confirmPassword"]);

        let narrowed = rule.report_on(["confirmPassword"]);
        let issues = narrowed.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path_string(), "confirmPassword");
        assert_eq!(issues[0].message.as_deref(), Some("Passwords do not match"));
    }

    #[tokio::test]
    async fn test_sync_and_async_predicates() {
        let form = json!({ "password": "x", "confirmPassword": "y" });
        assert!(!matching_passwords().passes(form.clone()).await);

        let rule = CrossFieldRule::new_async(["password"], "long_enough", |form: Value| async move {
            form["password"].as_str().is_some_and(|p| !p.is_empty())
        });
        assert!(rule.passes(form).await);
    }
}
