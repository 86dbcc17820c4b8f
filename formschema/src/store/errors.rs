//! Error store

use std::collections::BTreeMap;

use crate::error::FieldError;
use crate::error::is_within;

/// Ordered list of field errors; the single source of truth for validity.
///
/// Queries never mutate. All mutation goes through [`set_all`](Self::set_all),
/// [`add`](Self::add), [`clear_all`](Self::clear_all) and
/// [`clear_field`](Self::clear_field).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorStore {
    errors: Vec<FieldError>,
}

impl ErrorStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every stored error.
    pub fn set_all(&mut self, errors: Vec<FieldError>) {
        self.errors = errors;
    }

    /// Appends an error.
    pub fn add(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    /// Removes every error.
    pub fn clear_all(&mut self) {
        self.errors.clear();
    }

    /// Removes the errors of `path` and of every path nested under it.
    pub fn clear_field(&mut self, path: &str) {
        self.errors.retain(|error| !is_within(&error.path, path));
    }

    /// Returns `true` if an error exists for `path`, or any error at all
    /// when `path` is `None`.
    pub fn has(&self, path: Option<&str>) -> bool {
        match path {
            Some(path) => self.errors.iter().any(|error| error.path == path),
            None => !self.errors.is_empty(),
        }
    }

    /// The message of the first error for `path`.
    pub fn first_message(&self, path: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|error| error.path == path)
            .and_then(|error| error.message.as_deref())
    }

    /// Every error for `path`, in order.
    pub fn all_for(&self, path: &str) -> Vec<FieldError> {
        self.errors
            .iter()
            .filter(|error| error.path == path)
            .cloned()
            .collect()
    }

    /// Snapshot of every stored error.
    pub fn all(&self) -> Vec<FieldError> {
        self.errors.clone()
    }

    /// First message per path. Paths without a message are omitted.
    pub fn error_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for error in &self.errors {
            if let Some(message) = &error.message {
                map.entry(error.path.clone())
                    .or_insert_with(|| message.clone());
            }
        }
        map
    }

    /// Every error grouped by path.
    pub fn grouped(&self) -> BTreeMap<String, Vec<FieldError>> {
        let mut map: BTreeMap<String, Vec<FieldError>> = BTreeMap::new();
        for error in &self.errors {
            map.entry(error.path.clone()).or_default().push(error.clone());
        }
        map
    }

    /// Returns `true` if no error is stored.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of stored errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(path: &str, message: &str) -> FieldError {
        FieldError::with_message(path, "custom", message)
    }

    fn sample() -> ErrorStore {
        let mut store = ErrorStore::new();
        store.set_all(vec![
            error("name", "Name is required"),
            error("name", "Name is too short"),
            error("address.street", "Street is required"),
            error("", "Form is incomplete"),
        ]);
        store
    }

    #[test]
    fn test_queries() {
        let store = sample();
        assert!(store.has(None));
        assert!(store.has(Some("name")));
        assert!(!store.has(Some("address")));
        assert_eq!(store.first_message("name"), Some("Name is required"));
        assert_eq!(store.first_message("age"), None);
        assert_eq!(store.all_for("name").len(), 2);
        assert_eq!(store.len(), 4);
        assert!(!store.is_valid());
    }

    #[test]
    fn test_clear_field_removes_descendants_only() {
        let mut store = sample();
        store.add(error("addressLine", "Too long"));

        store.clear_field("address");
        assert!(!store.has(Some("address.street")));
        assert!(store.has(Some("addressLine")));
        assert!(store.has(Some("name")));

        store.clear_field("name");
        assert_eq!(store.all_for("name"), Vec::<FieldError>::new());
    }

    #[test]
    fn test_clear_all() {
        let mut store = sample();
        store.clear_all();
        assert!(store.is_valid());
        assert!(!store.has(None));
    }

    #[test]
    fn test_error_map_keeps_first_message() {
        let map = sample().error_map();
        assert_eq!(map.get("name").map(String::as_str), Some("Name is required"));
        assert_eq!(map.get("").map(String::as_str), Some("Form is incomplete"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_grouped() {
        let grouped = sample().grouped();
        assert_eq!(grouped["name"].len(), 2);
        assert_eq!(grouped["address.street"].len(), 1);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut store = sample();
        let snapshot = store.all();
        store.clear_all();
        assert_eq!(snapshot.len(), 4);
    }
}
