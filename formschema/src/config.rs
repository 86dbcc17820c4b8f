//! Form configuration

/// Per-form configuration.
///
/// # Example
///
/// ```
/// use formschema::FormConfig;
///
/// let config = FormConfig::new("signup")
///     .validate_on_build(true)
///     .with_channel_capacity(32);
/// ```
#[derive(Debug, Clone)]
pub struct FormConfig {
    /// Label prefixed to every log record of this form.
    ///
    /// Default: `"form"`
    pub name: String,

    /// Run a background validation of the whole form as soon as it is built.
    ///
    /// Default: `false`
    pub validate_on_build: bool,

    /// Buffer size of channels returned by `FormSchema::changes`.
    ///
    /// Default: 16
    pub channel_capacity: usize,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            name: "form".to_string(),
            validate_on_build: false,
            channel_capacity: 16,
        }
    }
}

impl FormConfig {
    /// Creates a new config with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets whether the form validates itself right after being built.
    pub fn validate_on_build(mut self, enabled: bool) -> Self {
        self.validate_on_build = enabled;
        self
    }

    /// Sets the change channel capacity.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}
