//! Schema-driven form state.
//!
//! A [`FormSchema`] tracks the raw input of a form, validates it against a
//! per-field rule set (plus cross-field rules over the whole form), stores
//! the resulting field errors and notifies listeners on every change so a
//! UI layer can re-render.
//!
//! The rules themselves come from an engine adapter implementing
//! [`rule::FieldRule`]; this crate only decides when to validate, what
//! subset to validate, and where the results go.
//!
//! # Example
//!
//! ```ignore
//! use formschema::prelude::*;
//!
//! let form = FormSchema::builder()
//!     .field("password", password_rule)
//!     .field("confirmPassword", password_rule)
//!     .refine(
//!         CrossFieldRule::new(["password", "confirmPassword"], "mismatch", |form| {
//!             form["password"] == form["confirmPassword"]
//!         })
//!         .report_on(["confirmPassword"]),
//!     )
//!     .build()?;
//!
//! let mut changes = form.changes();
//! form.set_field("password", json!("hunter2"));
//! changes.recv().await;
//! ```

pub mod coerce;
pub mod config;
pub mod error;
pub mod notify;
pub mod rule;
pub mod store;

mod dispatch;
mod schema;

pub use config::FormConfig;
pub use dispatch::ValidationRequest;
pub use error::*;
pub use schema::{FieldSetter, FormSchema, FormSchemaBuilder};

pub mod prelude {
    pub use crate::FormConfig;
    pub use crate::coerce::{InputKind, input_value};
    pub use crate::dispatch::ValidationRequest;
    pub use crate::error::{ErrorKind, FieldError, RuleError, SchemaError, ValidationError};
    pub use crate::notify::{ChangeReceiver, Listener, listener};
    pub use crate::rule::{CrossFieldRule, FieldRule, Issue, PathSegment, rule_fn};
    pub use crate::schema::{FieldSetter, FormSchema, FormSchemaBuilder};
    pub use crate::store::{RawInput, raw_input};
}
