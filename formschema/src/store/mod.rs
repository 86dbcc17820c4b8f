//! In-memory stores owned by a form.

mod errors;
mod raw;

pub use errors::*;
pub use raw::*;
