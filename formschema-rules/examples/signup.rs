use std::fs::File;

use formschema_rules::prelude::*;
use serde_json::json;
use simplelog::{Config, LevelFilter, WriteLogger};

fn signup_form() -> Result<FormSchema, SchemaError> {
    schema()
        .field_with("username", |r| {
            r.string()
                .trim()
                .min_length(3, "Username must be at least 3 characters")
                .check_async(|name| async move { name != "admin" }, "Username is taken")
        })
        .field_with("email", |r| {
            r.string()
                .trim()
                .required("Email is required")
                .email("Enter a valid email")
        })
        .field_with("age", |r| r.number().coerce().min(18.0, "You must be 18 or older"))
        .field_with("password", |r| {
            r.string().min_length(8, "Password must be at least 8 characters")
        })
        .field_with("confirmPassword", |r| r.string())
        .field_with("terms", |r| r.boolean().checked("Accept the terms to continue"))
        .refine(
            CrossFieldRule::new(
                ["password", "confirmPassword"],
                "passwords_mismatch",
                |form| form["password"] == form["confirmPassword"],
            )
            .message("Passwords do not match")
            .report_on(["confirmPassword"]),
        )
        .initial_values(raw_input(json!({
            "username": "",
            "email": "",
            "age": "",
            "password": "",
            "confirmPassword": "",
            "terms": false,
        })))
        .config(FormConfig::new("signup"))
        .build()
}

fn print_errors(form: &FormSchema) {
    if form.is_valid() {
        println!("  (no errors)");
    }
    for (path, message) in form.error_map() {
        println!("  {path}: {message}");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log_file = File::create("signup.log")?;
    WriteLogger::init(LevelFilter::Trace, Config::default(), log_file)?;

    let form = signup_form()?;
    let mut changes = form.changes();

    println!("Submitting the empty form:");
    if let Err(error) = form.validate_all().await {
        log::info!("Submit rejected: {error}");
    }
    changes.recv().await;
    print_errors(&form);

    let typed = [
        ("username", input_value(InputKind::Text, "admin", false)),
        ("username", input_value(InputKind::Text, "ann", false)),
        ("email", input_value(InputKind::Text, "ann@", false)),
        ("email", input_value(InputKind::Text, "ann@example.com", false)),
        ("age", input_value(InputKind::Number, "42", false)),
        ("password", input_value(InputKind::Text, "correct horse", false)),
        ("confirmPassword", input_value(InputKind::Text, "correct hose", false)),
        ("confirmPassword", input_value(InputKind::Text, "correct horse", false)),
        ("terms", input_value(InputKind::Checkbox, "", true)),
    ];

    for (field, value) in typed {
        println!("\n{field} <- {value}");
        form.setter(field)(value);
        changes.recv().await;
        print_errors(&form);
    }

    let data = form.validated_value().await?;
    println!("\nSubmitted: {data}");
    Ok(())
}
