use snafu::Snafu;

/// A component configuration error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum ComponentConfigError {
    /// The persisted document could not be decoded.
    #[snafu(display("Failed to decode '{}' configuration: {}", key, source))]
    Decode {
        /// Configuration key of the component.
        key: &'static str,

        /// Error source.
        source: serde_json::Error,
    },

    /// The configuration could not be encoded.
    #[snafu(display("Failed to encode '{}' configuration: {}", key, source))]
    Encode {
        /// Configuration key of the component.
        key: &'static str,

        /// Error source.
        source: serde_json::Error,
    },

    /// A field holds a value the component cannot work with.
    #[snafu(display("{}.{} is invalid: {}", key, field, reason))]
    InvalidConfig {
        /// Configuration key of the component.
        key: &'static str,

        /// Name of the offending field, as it appears in the persisted document.
        field: &'static str,

        /// Why the value was rejected.
        reason: String,
    },
}

impl ComponentConfigError {
    /// Returns `true` if the persisted document itself could not be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Returns `true` if the configuration was decoded but holds an unusable value.
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }

    /// Returns the name of the offending field, if the error relates to a specific field.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidConfig { field, .. } => Some(*field),
            _ => None,
        }
    }
}

/// The configuration of a pluggable component.
///
/// Each component owns one section of the overall configuration document, identified by
/// [`config_key`][Self::config_key]. A component configuration is initialized either with
/// [`set_default`][Self::set_default] or with [`load_json`][Self::load_json], and must pass
/// [`validate`][Self::validate] before it is used to build the component.
pub trait ComponentConfiguration {
    /// Returns the key identifying this component's section.
    fn config_key(&self) -> &'static str;

    /// Resets every field to its built-in default.
    fn set_default(&mut self) -> Result<(), ComponentConfigError>;

    /// Checks that every field holds a usable value.
    fn validate(&self) -> Result<(), ComponentConfigError>;

    /// Populates the configuration from its persisted JSON form, then validates it.
    ///
    /// On error, the configuration may be partially updated and must not be used.
    fn load_json(&mut self, raw: &[u8]) -> Result<(), ComponentConfigError>;

    /// Renders the configuration to its persisted JSON form.
    fn to_json(&self) -> Result<Vec<u8>, ComponentConfigError>;
}
