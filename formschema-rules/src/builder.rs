//! The rule builder handed to field factories.

use formschema::rule::FieldRule;

use crate::boolean::BoolRule;
use crate::date::DateRule;
use crate::list::ListRule;
use crate::number::NumberRule;
use crate::object::ObjectRule;
use crate::string::StringRule;

/// Entry point for the built-in rules.
///
/// A schema built with [`schema`](crate::schema) passes this to every
/// `field_with` factory, so fields can be declared as
/// `.field_with("age", |r| r.number().min(18.0, "Too young"))`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rules;

impl Rules {
    pub fn string(&self) -> StringRule {
        StringRule::new()
    }

    pub fn number(&self) -> NumberRule {
        NumberRule::new()
    }

    pub fn boolean(&self) -> BoolRule {
        BoolRule::new()
    }

    pub fn date(&self) -> DateRule {
        DateRule::new()
    }

    pub fn object(&self) -> ObjectRule {
        ObjectRule::new()
    }

    pub fn list<R: FieldRule>(&self, item: R) -> ListRule<R> {
        ListRule::new(item)
    }
}
