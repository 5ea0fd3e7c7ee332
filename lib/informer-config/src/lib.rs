//! Primitives for loading layered configuration and routing it to pluggable components.
#![deny(warnings)]
#![deny(missing_docs)]

use std::{path::Path, sync::Arc};

use figment::{
    error::Kind,
    providers::{Env, Serialized},
    value::{Dict, Map},
    Figment, Metadata, Profile, Provider,
};
use serde::Deserialize;
use snafu::{ResultExt as _, Snafu};
use tracing::debug;

mod component;
pub use self::component::{ComponentConfigError, ComponentConfiguration};

mod manager;
pub use self::manager::ConfigurationManager;

mod provider;
use self::provider::FileProvider;

/// Separator between nesting levels in environment variable names.
///
/// `PFX_INFORMER__DISK__METRIC_TTL` addresses the key `informer.disk.metric_ttl` when loaded with the prefix `pfx`.
pub const ENV_NESTING_SEPARATOR: &str = "__";

/// A configuration error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum ConfigurationError {
    /// Environment variable prefix was empty.
    #[snafu(display("Environment variable prefix must not be empty."))]
    EmptyPrefix,

    /// Requested field's data type was not the expected data type.
    #[snafu(display(
        "Expected value for field '{}' to be '{}', got '{}' instead.",
        field,
        expected_ty,
        actual_ty
    ))]
    InvalidFieldType {
        /// Name of the invalid field.
        ///
        /// This is a period-separated path to the field.
        field: String,

        /// Expected data type.
        expected_ty: String,

        /// Actual data type.
        actual_ty: String,
    },

    /// A configuration source could not be read or parsed.
    #[snafu(display("Failed to load configuration source: {}", source))]
    Load {
        /// Error source.
        source: figment::Error,
    },

    /// A component rejected its section of the configuration.
    #[snafu(display("Component configuration error: {}", source))]
    Component {
        /// Error source.
        source: ComponentConfigError,
    },

    /// The combined configuration document could not be rendered.
    #[snafu(display("Failed to render configuration document: {}", source))]
    Render {
        /// Error source.
        source: serde_json::Error,
    },

    /// Generic configuration error.
    #[snafu(display("Failed to query configuration: {}", source))]
    Generic {
        /// Error source.
        source: figment::Error,
    },
}

impl From<figment::Error> for ConfigurationError {
    fn from(e: figment::Error) -> Self {
        match e.kind {
            Kind::InvalidType(actual_ty, expected_ty) => Self::InvalidFieldType {
                field: e.path.join("."),
                expected_ty,
                actual_ty: actual_ty.to_string(),
            },
            _ => Self::Generic { source: e },
        }
    }
}

struct BoxedProvider(Box<dyn Provider + Send + Sync>);

impl Provider for BoxedProvider {
    fn metadata(&self) -> Metadata {
        self.0.metadata()
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        self.0.data()
    }
}

/// A configuration loader that can pull from various sources.
///
/// Sources have an implicit priority based on the order in which they are added: sources added later take precedence
/// over sources added earlier. Objects present in more than one source are merged key by key. Once all sources are
/// added, [`into_generic`][Self::into_generic] produces the merged configuration.
///
/// # Supported sources
///
/// - YAML file
/// - JSON file
/// - environment variables (must be prefixed; see [`from_environment`][Self::from_environment])
#[derive(Default)]
pub struct ConfigurationLoader {
    providers: Vec<BoxedProvider>,
}

impl ConfigurationLoader {
    /// Loads the given YAML configuration file.
    ///
    /// # Errors
    ///
    /// If the file could not be read, or if the file is not valid YAML, an error will be returned.
    pub fn from_yaml<P>(self, path: P) -> Result<Self, ConfigurationError>
    where
        P: AsRef<Path>,
    {
        let provider = FileProvider::from_yaml(&path).context(Load)?;
        Ok(self.with_provider(provider))
    }

    /// Loads the given JSON configuration file.
    ///
    /// # Errors
    ///
    /// If the file could not be read, or if the file is not valid JSON, an error will be returned.
    pub fn from_json<P>(self, path: P) -> Result<Self, ConfigurationError>
    where
        P: AsRef<Path>,
    {
        let provider = FileProvider::from_json(&path).context(Load)?;
        Ok(self.with_provider(provider))
    }

    /// Loads configuration from environment variables.
    ///
    /// The prefix given will have an underscore appended to it if it does not already end with one, and is matched
    /// case-insensitively. The rest of the variable name is the lowercased key, with nesting levels separated by
    /// [`ENV_NESTING_SEPARATOR`]. For example, with a prefix of `pfx`, `PFX_INFORMER__DISK__METRIC_TYPE=reposize` sets
    /// `informer.disk.metric_type`.
    ///
    /// # Errors
    ///
    /// If the prefix is empty, or the environment could not be read, an error will be returned.
    pub fn from_environment(self, prefix: &str) -> Result<Self, ConfigurationError> {
        if prefix.is_empty() {
            return Err(ConfigurationError::EmptyPrefix);
        }

        let prefix = if prefix.ends_with('_') {
            prefix.to_uppercase()
        } else {
            format!("{}_", prefix.to_uppercase())
        };

        // `Env` isn't `Send + Sync`, so snapshot its values into a serialized provider.
        let values = Env::prefixed(&prefix)
            .split(ENV_NESTING_SEPARATOR)
            .data()
            .context(Load)?;
        match values.get(&Profile::Default) {
            Some(dict) => Ok(self.with_provider(Serialized::defaults(dict.clone()))),
            None => {
                debug!(prefix = %prefix, "No environment variables matched the configuration prefix.");
                Ok(self)
            }
        }
    }

    fn with_provider<P>(mut self, provider: P) -> Self
    where
        P: Provider + Send + Sync + 'static,
    {
        self.providers.push(BoxedProvider(Box::new(provider)));
        self
    }

    /// Consumes the configuration loader and wraps it in a generic wrapper.
    pub fn into_generic(self) -> GenericConfiguration {
        let figment = self
            .providers
            .iter()
            .fold(Figment::new(), |figment, provider| figment.admerge(provider));
        GenericConfiguration {
            figment: Arc::new(figment),
        }
    }
}

/// A generic configuration object.
///
/// This represents the merged configuration derived from [`ConfigurationLoader`] in its raw form. Values are queried by
/// key, where keys are in the form of `a.b.c` and periods (`.`) indicate a nested value.
///
/// Using an example JSON configuration:
///
/// ```json
/// {
///   "informer": {
///     "disk": {
///       "metric_ttl": "30s"
///     }
///   }
/// }
/// ```
///
/// Querying for the value of `informer.disk.metric_ttl` would return `"30s"`, and querying for `informer.disk` would
/// return the nested object `{ "metric_ttl": "30s" }`.
#[derive(Clone, Debug)]
pub struct GenericConfiguration {
    figment: Arc<Figment>,
}

impl GenericConfiguration {
    /// Gets a configuration value by key, if it exists.
    ///
    /// If the key exists in the configuration, and can be deserialized, `Ok(Some(value))` is returned. If the key does
    /// not exist, `Ok(None)` is returned.
    ///
    /// ## Errors
    ///
    /// If the value could not be deserialized into `T`, an error will be returned.
    pub fn try_get_typed<'a, T>(&self, key: &str) -> Result<Option<T>, ConfigurationError>
    where
        T: Deserialize<'a>,
    {
        match self.figment.extract_inner(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if matches!(e.kind, Kind::MissingField(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
