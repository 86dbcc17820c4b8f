//! Validation dispatch through the public `FormSchema` surface.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use formschema::prelude::*;
use formschema::{FIELD_UNKNOWN, UNEXPECTED};
use serde_json::{Value, json};

// ============================================================================
// Helpers
// ============================================================================

fn min_length(min: usize, message: &'static str) -> impl FieldRule {
    rule_fn(move |value: Value| async move {
        let text = value.as_str().unwrap_or_default().trim().to_string();
        if text.chars().count() >= min {
            Ok(Value::String(text))
        } else {
            Err(RuleError::issue(
                Issue::new("too_small")
                    .origin("string")
                    .message(message)
                    .param("minimum", min),
            ))
        }
    })
}

fn at_least(min: i64, message: &'static str) -> impl FieldRule {
    rule_fn(move |value: Value| async move {
        match value.as_i64() {
            Some(n) if n >= min => Ok(value),
            Some(_) => Err(RuleError::issue(
                Issue::new("too_small").origin("number").message(message),
            )),
            None => Err(RuleError::issue(
                Issue::new("invalid_type").message("Expected a number"),
            )),
        }
    })
}

fn person_form() -> FormSchema {
    FormSchema::builder()
        .field("name", min_length(1, "Name is required"))
        .field("age", at_least(18, "Must be 18 or older"))
        .initial_values(raw_input(json!({ "name": "", "age": 17 })))
        .build()
        .unwrap()
}

fn password_form() -> FormSchema {
    FormSchema::builder()
        .field("name", min_length(1, "Name is required"))
        .field("password", min_length(1, "Password is required"))
        .field("confirmPassword", min_length(1, "Confirm your password"))
        .refine(
            CrossFieldRule::new(
                ["password", "confirmPassword"],
                "passwords_mismatch",
                |form| form["password"] == form["confirmPassword"],
            )
            .message("Passwords do not match"),
        )
        .build()
        .unwrap()
}

/// Waits for the next change notification.
async fn settle(changes: &mut ChangeReceiver) {
    tokio::time::timeout(Duration::from_secs(1), changes.recv())
        .await
        .expect("validation did not finish")
        .expect("form dropped");
}

// ============================================================================
// Whole form
// ============================================================================

#[tokio::test]
async fn test_validate_all_reports_every_failing_field() {
    let form = person_form();

    let error = form.validate_all().await.unwrap_err();
    assert_eq!(error.paths(), vec!["name", "age"]);
    assert_eq!(error.kind(), ErrorKind::UserInput);
    assert_eq!(error.to_string(), "name: Name is required, age: Must be 18 or older");

    assert!(!form.is_valid());
    assert_eq!(form.error("name").as_deref(), Some("Name is required"));
    assert_eq!(form.errors_for("age")[0].code, "number.too_small");
}

#[tokio::test]
async fn test_setters_fix_errors_field_by_field() {
    let form = person_form();
    let _ = form.validate_all().await;
    let mut changes = form.changes();

    let set_name = form.setter("name");
    set_name(json!("Ann"));
    settle(&mut changes).await;
    assert!(!form.has_error("name"));
    assert!(form.has_error("age"));

    let set_age = form.setter("age");
    set_age(json!(25));
    settle(&mut changes).await;

    assert!(form.is_valid());
    assert!(form.errors().is_empty());
    assert_eq!(form.values(), raw_input(json!({ "name": "Ann", "age": 25 })));
}

#[tokio::test]
async fn test_validated_value_returns_transformed_data() {
    let form = person_form();
    form.set_field("name", json!("  Ann  "));
    form.set_field("age", json!(30));

    let data = form.validated_value().await.unwrap();
    assert_eq!(data, json!({ "name": "Ann", "age": 30 }));
    assert!(form.is_valid());
    // Raw input keeps what was typed.
    assert_eq!(form.value("name"), Some(json!("  Ann  ")));
}

#[tokio::test]
async fn test_validated_value_rejects_with_every_issue() {
    let form = person_form();

    let error = form.validated_value().await.unwrap_err();
    assert_eq!(error.errors.len(), 2);
    assert_eq!(error.errors, form.errors());
}

#[tokio::test]
async fn test_validated_value_strips_undeclared_keys() {
    let form = person_form();
    form.set_values(raw_input(json!({ "name": "Ann", "age": 40, "extra": true })));

    let data = form.validated_value().await.unwrap();
    assert_eq!(data, json!({ "name": "Ann", "age": 40 }));
}

#[tokio::test]
async fn test_validated_as_deserializes() {
    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Person {
        name: String,
        age: u32,
    }

    let form = person_form();
    form.set_values(raw_input(json!({ "name": "Ann", "age": 40 })));

    let person: Person = form.validated_as().await.unwrap();
    assert_eq!(
        person,
        Person {
            name: "Ann".to_string(),
            age: 40
        }
    );
}

// ============================================================================
// Single field
// ============================================================================

#[tokio::test]
async fn test_isolated_field_leaves_other_errors_untouched() {
    let form = person_form();
    let _ = form.validate_all().await;
    let age_errors = form.errors_for("age");

    form.set_field("name", json!("Ann"));
    let error = form.check_field_value("name", json!("")).await.unwrap_err();

    assert_eq!(error.errors.len(), 1);
    assert_eq!(form.errors_for("name").len(), 1);
    assert_eq!(form.errors_for("age"), age_errors);
}

#[tokio::test]
async fn test_unknown_field_is_reported_without_touching_others() {
    let form = person_form();
    let _ = form.validate_all().await;
    let before = form.errors();

    let error = form.validate_field("notAField").await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Programmer);
    assert_eq!(error.errors[0].code, FIELD_UNKNOWN);
    assert_eq!(error.errors[0].message.as_deref(), Some("Unknown Field: notAField"));

    let mut expected = before;
    expected.push(FieldError::unknown_field("notAField"));
    assert_eq!(form.errors(), expected);
}

#[tokio::test]
async fn test_missing_field_is_validated_as_null() {
    let form = FormSchema::builder()
        .field("age", at_least(18, "Must be 18 or older"))
        .build()
        .unwrap();

    let error = form.validate_field("age").await.unwrap_err();
    assert_eq!(error.errors[0].path, "age");
    assert_eq!(error.errors[0].code, "invalid_type");
}

// ============================================================================
// Refined fields
// ============================================================================

#[tokio::test]
async fn test_refined_field_reports_cross_field_failure() {
    let form = password_form();
    let mut changes = form.changes();
    assert!(form.is_refined("password"));
    assert!(!form.is_refined("name"));

    form.set_field("password", json!("x"));
    settle(&mut changes).await;
    // confirmPassword fails its own rule, which only concerns that field.
    assert!(form.is_valid());

    form.set_field("confirmPassword", json!("y"));
    settle(&mut changes).await;
    assert_eq!(
        form.error("confirmPassword").as_deref(),
        Some("Passwords do not match")
    );
    assert_eq!(form.errors_for("confirmPassword")[0].code, "passwords_mismatch");
    // The name field fails too, but not within this field's path.
    assert!(!form.has_error("name"));

    form.set_field("confirmPassword", json!("x"));
    settle(&mut changes).await;
    assert!(!form.has_error("confirmPassword"));
}

#[tokio::test]
async fn test_refined_field_succeeds_despite_unrelated_failures() {
    let form = password_form();
    form.set_values(raw_input(json!({ "password": "same", "confirmPassword": "same" })));

    assert!(form.validate_field("confirmPassword").await.is_ok());
    assert!(form.validate_all().await.is_err());
    assert_eq!(form.error_map().keys().collect::<Vec<_>>(), vec!["name"]);
}

#[tokio::test]
async fn test_refine_at_runtime_only_tightens() {
    let form = person_form();
    form.set_values(raw_input(json!({ "name": "Ann", "age": 30 })));
    assert!(form.validate_all().await.is_ok());

    form.refine(CrossFieldRule::new(["name", "age"], "too_young_for_name", |form| {
        form["age"].as_i64().unwrap_or_default() > 40
    }))
    .unwrap();

    assert!(form.is_refined("age"));
    let error = form.validate_all().await.unwrap_err();
    assert_eq!(error.paths(), vec!["name", "age"]);
}

#[tokio::test]
async fn test_async_cross_field_rule() {
    let form = FormSchema::builder()
        .field("username", min_length(3, "Too short"))
        .refine(
            CrossFieldRule::new_async(["username"], "taken", |form: Value| async move {
                tokio::task::yield_now().await;
                form["username"] != json!("admin")
            })
            .message("Username is taken"),
        )
        .build()
        .unwrap();

    let error = form
        .check_field_value("username", json!("admin"))
        .await
        .unwrap_err();
    assert_eq!(error.errors[0].message.as_deref(), Some("Username is taken"));
    assert!(form.check_field_value("username", json!("alice")).await.is_ok());
    assert!(form.is_valid());
}

// ============================================================================
// External checks
// ============================================================================

#[tokio::test]
async fn test_check_values_leaves_state_untouched() {
    let form = person_form();
    let _ = form.validate_all().await;
    let errors = form.errors();
    let values = form.values();

    assert!(
        form.check_values(raw_input(json!({ "name": "Bob", "age": 50 })))
            .await
            .is_ok()
    );
    let error = form
        .check_values(raw_input(json!({ "name": "", "age": 50 })))
        .await
        .unwrap_err();
    assert_eq!(error.paths(), vec!["name"]);

    assert_eq!(form.errors(), errors);
    assert_eq!(form.values(), values);
}

#[tokio::test]
async fn test_check_field_value_updates_errors_not_values() {
    let form = person_form();

    let error = form.check_field_value("age", json!(3)).await.unwrap_err();
    assert_eq!(error.paths(), vec!["age"]);
    assert!(form.has_error("age"));
    assert_eq!(form.value("age"), Some(json!(17)));

    assert!(form.check_field_value("age", json!(21)).await.is_ok());
    assert!(!form.has_error("age"));
    assert_eq!(form.value("age"), Some(json!(17)));
}

// ============================================================================
// Failures outside the issue format
// ============================================================================

#[tokio::test]
async fn test_panicking_rule_becomes_unexpected() {
    let form = FormSchema::builder()
        .field(
            "email",
            rule_fn(|_: Value| async move {
                if true {
                    panic!("engine exploded");
                }
                Ok::<Value, RuleError>(Value::Null)
            }),
        )
        .build()
        .unwrap();

    let error = form.validate_field("email").await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Unexpected);
    assert_eq!(error.errors[0].path, "email");
    assert_eq!(error.errors[0].code, UNEXPECTED);
    assert!(error.cause().is_some());

    let error = form.validate_all().await.unwrap_err();
    assert_eq!(error.errors.len(), 1);
    assert_eq!(error.errors[0].path, "");
    assert!(error.errors[0].message.as_deref().unwrap().contains("engine exploded"));
}

#[tokio::test]
async fn test_rule_error_without_issues_is_unexpected() {
    let form = FormSchema::builder()
        .field(
            "code",
            rule_fn(|_: Value| async move { Err::<Value, _>(RuleError::Issues(Vec::new())) }),
        )
        .build()
        .unwrap();

    let error = form.validate_field("code").await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Unexpected);
    assert!(!form.is_valid());
}

#[tokio::test]
async fn test_unexpected_rule_error_keeps_cause() {
    let form = FormSchema::builder()
        .field(
            "email",
            rule_fn(|_: Value| async move {
                Err::<Value, _>(RuleError::unexpected("lookup service unavailable"))
            }),
        )
        .build()
        .unwrap();

    let error = form.validate_all().await.unwrap_err();
    assert_eq!(
        error.cause().map(ToString::to_string).as_deref(),
        Some("lookup service unavailable")
    );
}

// ============================================================================
// Notifications
// ============================================================================

#[tokio::test]
async fn test_every_request_notifies_once() {
    let form = person_form();
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let on_change = listener(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert!(form.subscribe(&on_change));
    assert!(!form.subscribe(&on_change));

    let _ = form.validate_all().await;
    let _ = form.validate_field("name").await;
    let _ = form.check_values(raw_input(json!({}))).await;
    let _ = form.check_field_value("age", json!(99)).await;
    let _ = form.validate_field("nope").await;
    assert_eq!(count.load(Ordering::SeqCst), 5);

    assert!(form.unsubscribe(&on_change));
    let _ = form.validate_all().await;
    assert_eq!(count.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_dropping_change_receiver_unsubscribes() {
    let form = person_form();
    let changes = form.changes();
    drop(changes);

    let mut changes = form.changes();
    let _ = form.validate_all().await;
    assert_eq!(changes.try_recv(), Some(()));
    assert_eq!(changes.try_recv(), None);
}

#[tokio::test]
async fn test_change_channel_closes_when_form_drops() {
    let form = person_form();
    let mut changes = form.changes();

    let _ = form.validate_all().await;
    drop(form);

    assert_eq!(changes.recv().await, Some(()));
    let closed = tokio::time::timeout(Duration::from_millis(500), changes.recv())
        .await
        .expect("channel stayed open after the form dropped");
    assert_eq!(closed, None);
}

// ============================================================================
// Raw input
// ============================================================================

#[tokio::test]
async fn test_set_values_replaces_and_merge_merges() {
    let form = person_form();

    form.set_values(raw_input(json!({ "a": 1, "b": 2 })));
    assert_eq!(form.values(), raw_input(json!({ "a": 1, "b": 2 })));

    form.merge_values(raw_input(json!({ "b": 3 })));
    assert_eq!(form.values(), raw_input(json!({ "a": 1, "b": 3 })));
}

#[tokio::test]
async fn test_set_values_validates_whole_form() {
    let form = person_form();
    let mut changes = form.changes();

    form.set_values(raw_input(json!({ "name": "", "age": 30 })));
    settle(&mut changes).await;
    assert_eq!(form.error_map().keys().collect::<Vec<_>>(), vec!["name"]);
    assert_eq!(form.errors_for("name")[0].code, "string.too_small");

    form.merge_values(raw_input(json!({ "name": "Ann" })));
    settle(&mut changes).await;
    assert!(form.is_valid());
}

#[tokio::test]
async fn test_merge_values_validates_whole_form() {
    let form = person_form();
    let mut changes = form.changes();

    form.merge_values(raw_input(json!({ "name": "Ann" })));
    settle(&mut changes).await;
    assert_eq!(form.errors().len(), 1);
    assert!(form.has_error("age"));

    form.merge_values(raw_input(json!({ "age": 18 })));
    settle(&mut changes).await;
    assert!(form.errors().is_empty());
}

#[tokio::test]
async fn test_setter_is_stable_per_field() {
    let form = person_form();
    let first = form.setter("name");
    let second = form.setter("name");
    let other = form.setter("age");

    assert!(Arc::ptr_eq(&first, &second));
    assert!(!Arc::ptr_eq(&first, &other));
}

#[tokio::test]
async fn test_reset_restores_initial_values() {
    let form = person_form();
    let mut changes = form.changes();

    form.set_field("name", json!("Ann"));
    settle(&mut changes).await;

    form.reset();
    assert_eq!(form.values(), raw_input(json!({ "name": "", "age": 17 })));
    settle(&mut changes).await;
    assert_eq!(form.error_map().len(), 2);
}

#[tokio::test]
async fn test_validate_on_build() {
    let form = FormSchema::builder()
        .field("name", min_length(1, "Name is required"))
        .config(FormConfig::new("eager").validate_on_build(true))
        .build()
        .unwrap();
    let mut changes = form.changes();

    settle(&mut changes).await;
    assert!(form.has_error("name"));
}

#[test]
fn test_setter_outside_runtime_still_stores_value() {
    let form = person_form();
    form.set_field("name", json!("Ann"));
    assert_eq!(form.value("name"), Some(json!("Ann")));
    assert!(form.is_valid());
}

#[test]
fn test_mutators_outside_runtime_still_notify() {
    let form = person_form();
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let on_change = listener(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    form.subscribe(&on_change);

    form.set_field("name", json!("Ann"));
    form.set_values(raw_input(json!({ "name": "Bo" })));
    form.merge_values(raw_input(json!({ "age": 20 })));
    form.reset();
    assert_eq!(count.load(Ordering::SeqCst), 4);
}

#[test]
fn test_setter_outlives_form_quietly() {
    let form = person_form();
    let set_name = form.setter("name");
    drop(form);
    set_name(json!("Ann"));
}

#[test]
fn test_build_rejects_empty_field_name() {
    let result = FormSchema::builder()
        .field("", min_length(1, "Required"))
        .build();
    assert_eq!(result.unwrap_err(), SchemaError::EmptyFieldName);
}

#[test]
fn test_build_rejects_cross_field_rule_without_paths() {
    let result = FormSchema::builder()
        .field("a", min_length(1, "Required"))
        .refine(CrossFieldRule::new(Vec::<String>::new(), "empty", |_| true))
        .build();
    assert!(matches!(result, Err(SchemaError::EmptyCrossFieldRule { .. })));
}
