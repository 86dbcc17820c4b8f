//! Field rule resolution.
//!
//! A field is declared either with a ready rule or with a factory that
//! receives the engine's rule builder. Factories run exactly once, when the
//! schema is built, so every validation within one form's lifetime sees the
//! same rule instances.

use std::collections::HashMap;
use std::sync::Arc;

use super::FieldRule;
use super::SharedRule;

/// Factory producing a rule from the engine's builder capability.
pub type RuleFactory<B> = Box<dyn FnOnce(&B) -> SharedRule>;

/// Declaration of a single field's rule, before resolution.
pub enum RuleDef<B> {
    /// A ready rule.
    Rule(SharedRule),
    /// A factory called once with the rule builder.
    Factory(RuleFactory<B>),
}

impl<B> RuleDef<B> {
    /// Declares a ready rule.
    pub fn rule(rule: impl FieldRule + 'static) -> Self {
        Self::Rule(Arc::new(rule))
    }

    /// Declares a rule built from the engine's builder.
    pub fn factory<F, R>(factory: F) -> Self
    where
        B: 'static,
        F: FnOnce(&B) -> R + 'static,
        R: FieldRule + 'static,
    {
        Self::Factory(Box::new(move |builder: &B| Arc::new(factory(builder)) as SharedRule))
    }

    /// Produces the concrete rule.
    pub fn resolve(self, builder: &B) -> SharedRule {
        match self {
            Self::Rule(rule) => rule,
            Self::Factory(factory) => factory(builder),
        }
    }
}

impl<B> std::fmt::Debug for RuleDef<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rule(_) => f.write_str("RuleDef::Rule"),
            Self::Factory(_) => f.write_str("RuleDef::Factory"),
        }
    }
}

/// The resolved rule of every declared field, in declaration order.
#[derive(Clone, Default)]
pub struct FieldRules {
    rules: Vec<(String, SharedRule)>,
    index: HashMap<String, usize>,
}

impl FieldRules {
    /// Resolves every declaration against `builder`.
    ///
    /// A name declared twice keeps its first position but takes the later
    /// rule.
    pub fn resolve<B>(defs: Vec<(String, RuleDef<B>)>, builder: &B) -> Self {
        let mut resolved = Self::default();
        for (name, def) in defs {
            resolved.insert(name, def.resolve(builder));
        }
        resolved
    }

    fn insert(&mut self, name: String, rule: SharedRule) {
        match self.index.get(&name) {
            Some(&position) => self.rules[position].1 = rule,
            None => {
                self.index.insert(name.clone(), self.rules.len());
                self.rules.push((name, rule));
            }
        }
    }

    /// Returns the rule declared for `name`.
    pub fn get(&self, name: &str) -> Option<&SharedRule> {
        self.index.get(name).map(|&position| &self.rules[position].1)
    }

    /// Returns `true` if `name` is a declared field.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterates over declared field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates over `(name, rule)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SharedRule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    /// Returns the number of declared fields.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if no field is declared.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for FieldRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::Value;

    use super::*;
    use crate::rule::rule_fn;

    struct Builder {
        calls: AtomicUsize,
    }

    fn passthrough() -> impl FieldRule {
        rule_fn(|value: Value| async move { Ok::<_, crate::RuleError>(value) })
    }

    #[test]
    fn test_factories_run_once_at_resolution() {
        let builder = Builder {
            calls: AtomicUsize::new(0),
        };
        let defs = vec![
            (
                "name".to_string(),
                RuleDef::factory(|b: &Builder| {
                    b.calls.fetch_add(1, Ordering::SeqCst);
                    passthrough()
                }),
            ),
            ("age".to_string(), RuleDef::rule(passthrough())),
        ];

        let rules = FieldRules::resolve(defs, &builder);
        assert_eq!(builder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(rules.names().collect::<Vec<_>>(), vec!["name", "age"]);

        let first = Arc::clone(rules.get("name").unwrap());
        let second = Arc::clone(rules.get("name").unwrap());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_redeclared_field_keeps_position() {
        let first: SharedRule = Arc::new(passthrough());
        let second: SharedRule = Arc::new(passthrough());
        let defs: Vec<(String, RuleDef<()>)> = vec![
            ("a".to_string(), RuleDef::Rule(Arc::clone(&first))),
            ("b".to_string(), RuleDef::rule(passthrough())),
            ("a".to_string(), RuleDef::Rule(Arc::clone(&second))),
        ];

        let rules = FieldRules::resolve(defs, &());
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(Arc::ptr_eq(rules.get("a").unwrap(), &second));
        assert!(!rules.contains("c"));
    }
}
