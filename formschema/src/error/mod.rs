//! Error types

mod field;
mod rule;
mod schema;
mod validation;

pub use field::*;
pub use rule::*;
pub use schema::*;
pub use validation::*;
