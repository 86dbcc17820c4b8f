//! Built-in field rules for `formschema`.
//!
//! Each rule implements [`FieldRule`](formschema::rule::FieldRule) and
//! reports failures as issues with stable codes (`invalid_type`,
//! `too_small`, `too_big`, `invalid_format`, `invalid_value`, `custom`),
//! which the form turns into `origin.code` error codes.
//!
//! # Example
//!
//! ```
//! use formschema_rules::prelude::*;
//!
//! let form = schema()
//!     .field_with("name", |r| r.string().trim().min_length(1, "Name is required"))
//!     .field_with("age", |r| r.number().min(18.0, "Must be an adult"))
//!     .build()
//!     .unwrap();
//! assert_eq!(form.fields(), vec!["name", "age"]);
//! ```

mod boolean;
mod builder;
mod date;
pub mod issue;
mod list;
mod number;
mod object;
mod string;

pub use boolean::BoolRule;
pub use builder::Rules;
pub use date::DateRule;
pub use formschema;
pub use list::ListRule;
pub use number::NumberRule;
pub use object::ObjectRule;
pub use string::StringRule;

use formschema::FormSchemaBuilder;

/// Starts a form whose field factories receive [`Rules`].
pub fn schema() -> FormSchemaBuilder<Rules> {
    FormSchemaBuilder::new(Rules)
}

pub mod prelude {
    pub use crate::{BoolRule, DateRule, ListRule, NumberRule, ObjectRule, Rules, StringRule, schema};
    pub use formschema::prelude::*;
}
