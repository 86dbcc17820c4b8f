//! The form state engine.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;
use std::sync::Weak;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::FormConfig;
use crate::dispatch::ValidationRequest;
use crate::error::BoxError;
use crate::error::ErrorKind;
use crate::error::FieldError;
use crate::error::SchemaError;
use crate::error::ValidationError;
use crate::notify::ChangeNotifier;
use crate::notify::ChangeReceiver;
use crate::notify::Listener;
use crate::rule::CrossFieldRegistry;
use crate::rule::CrossFieldRule;
use crate::rule::FieldRule;
use crate::rule::FieldRules;
use crate::rule::RuleDef;
use crate::store::ErrorStore;
use crate::store::RawInput;
use crate::store::RawInputStore;

/// Setter for one field, as returned by [`FormSchema::setter`].
///
/// Calling it stores the value and schedules validation of that field in
/// the background. It never blocks and never fails.
pub type FieldSetter = Arc<dyn Fn(Value) + Send + Sync>;

pub(crate) struct Inner {
    pub(crate) config: FormConfig,
    pub(crate) rules: FieldRules,
    pub(crate) cross: RwLock<CrossFieldRegistry>,
    pub(crate) raw: RwLock<RawInputStore>,
    pub(crate) errors: RwLock<ErrorStore>,
    pub(crate) notifier: ChangeNotifier,
    initial: RawInput,
    setters: DashMap<String, FieldSetter>,
}

/// Schema-driven form state.
///
/// `FormSchema` owns the raw input of a form and the errors found in it.
/// Every mutator schedules a validation pass; every validation pass ends in
/// a change notification. It is cheap to clone: all clones share the same
/// state.
///
/// Validation passes are not serialized. When two overlap, the one that
/// finishes last writes the error store last, even if its input is older.
/// Callers that need strict ordering should await [`validate`](Self::validate)
/// instead of relying on the background passes of the setters.
///
/// # Example
///
/// ```ignore
/// let form = FormSchema::builder()
///     .field("name", name_rule)
///     .field("age", age_rule)
///     .initial_value("name", "")
///     .build()?;
///
/// let set_name = form.setter("name");
/// set_name(json!("Ann"));
///
/// match form.validated_value().await {
///     Ok(data) => submit(data).await,
///     Err(error) => show(form.error_map()),
/// }
/// ```
#[derive(Clone)]
pub struct FormSchema {
    inner: Arc<Inner>,
}

impl FormSchema {
    /// Starts a schema whose rule factories receive no builder.
    pub fn builder() -> FormSchemaBuilder<()> {
        FormSchemaBuilder::new(())
    }

    /// Starts a schema whose rule factories receive `builder`.
    pub fn builder_with<B>(builder: B) -> FormSchemaBuilder<B> {
        FormSchemaBuilder::new(builder)
    }

    // =========================================================================
    // Raw input
    // =========================================================================

    /// Snapshot of every raw value.
    pub fn values(&self) -> RawInput {
        read(&self.inner.raw).get_all()
    }

    /// Raw value of one field.
    pub fn value(&self, field: &str) -> Option<Value> {
        read(&self.inner.raw).get(field)
    }

    /// Replaces every raw value and schedules a whole-form validation.
    pub fn set_values(&self, values: RawInput) {
        write(&self.inner.raw).set_all(values);
        spawn_validation(&self.inner, ValidationRequest::All);
    }

    /// Shallow-merges `partial` into the raw values and schedules a
    /// whole-form validation.
    pub fn merge_values(&self, partial: RawInput) {
        write(&self.inner.raw).merge(partial);
        spawn_validation(&self.inner, ValidationRequest::All);
    }

    /// Returns the setter for `field`.
    ///
    /// Repeated calls with the same name return the same setter.
    pub fn setter(&self, field: &str) -> FieldSetter {
        let entry = self
            .inner
            .setters
            .entry(field.to_string())
            .or_insert_with(|| field_setter(&self.inner, field.to_string()));
        Arc::clone(entry.value())
    }

    /// Sets one field through its setter.
    pub fn set_field(&self, field: &str, value: Value) {
        let setter = self.setter(field);
        setter(value);
    }

    /// Restores the initial raw values, clears every error and schedules a
    /// whole-form validation.
    pub fn reset(&self) {
        write(&self.inner.raw).set_all(self.inner.initial.clone());
        write(&self.inner.errors).clear_all();
        spawn_validation(&self.inner, ValidationRequest::All);
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Runs a validation request.
    ///
    /// Failures are written to the error store (except for
    /// [`ValidationRequest::Values`]) and also returned.
    pub async fn validate(&self, request: ValidationRequest) -> Result<(), ValidationError> {
        self.inner.dispatch(request).await.map(|_| ())
    }

    /// Validates the stored input as a whole.
    pub async fn validate_all(&self) -> Result<(), ValidationError> {
        self.validate(ValidationRequest::All).await
    }

    /// Validates one stored field.
    pub async fn validate_field(&self, field: &str) -> Result<(), ValidationError> {
        self.validate(ValidationRequest::Field(field.to_string())).await
    }

    /// Checks an external input without touching the stores.
    pub async fn check_values(&self, values: RawInput) -> Result<(), ValidationError> {
        self.validate(ValidationRequest::Values(values)).await
    }

    /// Checks a candidate value for `field` without storing it.
    pub async fn check_field_value(&self, field: &str, value: Value) -> Result<(), ValidationError> {
        self.validate(ValidationRequest::FieldValue(field.to_string(), value))
            .await
    }

    /// Validates the stored input and returns the transformed form value.
    pub async fn validated_value(&self) -> Result<Value, ValidationError> {
        self.inner.dispatch(ValidationRequest::All).await
    }

    /// Validates the stored input and deserializes the transformed value.
    pub async fn validated_as<T: DeserializeOwned>(&self) -> Result<T, ValidationError> {
        let value = self.validated_value().await?;
        serde_json::from_value(value)
            .map_err(|error| ValidationError::unexpected("", BoxError::from(error)))
    }

    // =========================================================================
    // Errors
    // =========================================================================

    /// Snapshot of every stored error.
    pub fn errors(&self) -> Vec<FieldError> {
        read(&self.inner.errors).all()
    }

    /// First error message for `path`.
    pub fn error(&self, path: &str) -> Option<String> {
        read(&self.inner.errors).first_message(path).map(str::to_string)
    }

    /// Every error for `path`.
    pub fn errors_for(&self, path: &str) -> Vec<FieldError> {
        read(&self.inner.errors).all_for(path)
    }

    /// Returns `true` if any error is stored.
    pub fn has_errors(&self) -> bool {
        read(&self.inner.errors).has(None)
    }

    /// Returns `true` if an error is stored for `path`.
    pub fn has_error(&self, path: &str) -> bool {
        read(&self.inner.errors).has(Some(path))
    }

    /// First error message per path.
    pub fn error_map(&self) -> BTreeMap<String, String> {
        read(&self.inner.errors).error_map()
    }

    /// Snapshot of the error store.
    pub fn error_store(&self) -> ErrorStore {
        read(&self.inner.errors).clone()
    }

    /// Returns `true` if no error is stored.
    pub fn is_valid(&self) -> bool {
        read(&self.inner.errors).is_valid()
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Subscribes a change listener. Returns `false` if already subscribed.
    pub fn subscribe(&self, listener: &Listener) -> bool {
        self.inner.notifier.subscribe(listener)
    }

    /// Unsubscribes a change listener. Returns `false` if not subscribed.
    pub fn unsubscribe(&self, listener: &Listener) -> bool {
        self.inner.notifier.unsubscribe(listener)
    }

    /// Subscribes a channel receiving one signal per change.
    pub fn changes(&self) -> ChangeReceiver {
        self.inner.notifier.channel(self.inner.config.channel_capacity)
    }

    // =========================================================================
    // Schema
    // =========================================================================

    /// Registers a cross-field rule. Registration cannot be undone.
    pub fn refine(&self, rule: CrossFieldRule) -> Result<(), SchemaError> {
        log::debug!(
            "[{}] Registering cross-field rule '{}' on {:?}",
            self.inner.config.name,
            rule.code(),
            rule.paths()
        );
        write(&self.inner.cross).register(rule)
    }

    /// Returns `true` if `field` takes part in a cross-field rule.
    pub fn is_refined(&self, field: &str) -> bool {
        read(&self.inner.cross).is_refined(field)
    }

    /// Declared field names, in declaration order.
    pub fn fields(&self) -> Vec<String> {
        self.inner.rules.names().map(str::to_string).collect()
    }

    /// The form's configuration.
    pub fn config(&self) -> &FormConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for FormSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSchema")
            .field("name", &self.inner.config.name)
            .field("fields", &self.inner.rules)
            .field("errors", &read(&self.inner.errors).len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`FormSchema`].
///
/// `B` is the rule builder handed to factories registered with
/// [`field_with`](Self::field_with). Factories run once, in [`build`](Self::build).
pub struct FormSchemaBuilder<B = ()> {
    builder: B,
    fields: Vec<(String, RuleDef<B>)>,
    cross: Vec<CrossFieldRule>,
    initial: RawInput,
    config: FormConfig,
}

impl<B> FormSchemaBuilder<B> {
    /// Creates a builder handing `builder` to rule factories.
    pub fn new(builder: B) -> Self {
        Self {
            builder,
            fields: Vec::new(),
            cross: Vec::new(),
            initial: RawInput::new(),
            config: FormConfig::default(),
        }
    }

    /// Declares a field with a ready rule.
    pub fn field(mut self, name: impl Into<String>, rule: impl FieldRule + 'static) -> Self {
        self.fields.push((name.into(), RuleDef::rule(rule)));
        self
    }

    /// Declares a field whose rule is built from the rule builder.
    pub fn field_with<F, R>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        B: 'static,
        F: FnOnce(&B) -> R + 'static,
        R: FieldRule + 'static,
    {
        self.fields.push((name.into(), RuleDef::factory(factory)));
        self
    }

    /// Registers a cross-field rule.
    pub fn refine(mut self, rule: CrossFieldRule) -> Self {
        self.cross.push(rule);
        self
    }

    /// Sets every initial raw value.
    pub fn initial_values(mut self, values: RawInput) -> Self {
        self.initial = values;
        self
    }

    /// Sets one initial raw value.
    pub fn initial_value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.initial.insert(field.into(), value.into());
        self
    }

    /// Sets the configuration.
    pub fn config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolves every rule and creates the form.
    pub fn build(self) -> Result<FormSchema, SchemaError> {
        if self.fields.iter().any(|(name, _)| name.is_empty()) {
            return Err(SchemaError::EmptyFieldName);
        }

        let rules = FieldRules::resolve(self.fields, &self.builder);
        let mut cross = CrossFieldRegistry::new();
        for rule in self.cross {
            cross.register(rule)?;
        }

        log::debug!(
            "[{}] Built form with {} field(s) and {} cross-field rule(s)",
            self.config.name,
            rules.len(),
            cross.len()
        );

        let validate_on_build = self.config.validate_on_build;
        let notifier = ChangeNotifier::named(self.config.name.clone());
        let inner = Arc::new(Inner {
            config: self.config,
            rules,
            cross: RwLock::new(cross),
            raw: RwLock::new(RawInputStore::new(self.initial.clone())),
            errors: RwLock::new(ErrorStore::new()),
            notifier,
            initial: self.initial,
            setters: DashMap::new(),
        });

        if validate_on_build {
            spawn_validation(&inner, ValidationRequest::All);
        }
        Ok(FormSchema { inner })
    }
}

fn field_setter(inner: &Arc<Inner>, field: String) -> FieldSetter {
    let name = inner.config.name.clone();
    let form: Weak<Inner> = Arc::downgrade(inner);
    Arc::new(move |value: Value| {
        let Some(inner) = form.upgrade() else {
            log::warn!("[{name}] Setter for '{field}' called after its form was dropped");
            return;
        };
        write(&inner.raw).set(field.clone(), value);
        spawn_validation(&inner, ValidationRequest::Field(field.clone()));
    })
}

/// Runs `request` on the current async runtime without waiting for it.
///
/// Rejections are logged, never returned. Without a runtime the request is
/// skipped, but listeners still learn that the stores changed.
fn spawn_validation(inner: &Arc<Inner>, request: ValidationRequest) {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        log::warn!(
            "[{}] No async runtime; skipping validation of {request}",
            inner.config.name
        );
        inner.notifier.notify();
        return;
    };

    let inner = Arc::clone(inner);
    handle.spawn(async move {
        let target = request.to_string();
        if let Err(error) = inner.dispatch(request).await {
            match error.kind() {
                ErrorKind::Unexpected => log::warn!(
                    "[{}] Background validation of {target} failed: {error}",
                    inner.config.name
                ),
                ErrorKind::UserInput | ErrorKind::Programmer => log::debug!(
                    "[{}] Background validation of {target} rejected: {error}",
                    inner.config.name
                ),
            }
        }
    });
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
