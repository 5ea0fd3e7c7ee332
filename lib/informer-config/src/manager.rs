use serde_json::{Map, Value};
use snafu::ResultExt as _;
use tracing::{debug, info};

use crate::{Component, ComponentConfigError, ComponentConfiguration, ConfigurationError, GenericConfiguration, Render};

/// Routes sections of a configuration document to the components that own them.
///
/// Component configurations live under a common section, keyed by each component's
/// [`config_key`][ComponentConfiguration::config_key]:
///
/// ```yaml
/// informer:
///   disk:
///     metric_ttl: 30s
///     metric_type: freespace
/// ```
#[derive(Clone, Debug)]
pub struct ConfigurationManager {
    config: GenericConfiguration,
    section: String,
}

impl ConfigurationManager {
    /// Creates a new `ConfigurationManager` over `config`, looking up components under `section`.
    pub fn new<S>(config: GenericConfiguration, section: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            config,
            section: section.into(),
        }
    }

    /// Returns the section under which component configurations are looked up.
    pub fn section(&self) -> &str {
        &self.section
    }

    fn component_path(&self, key: &str) -> String {
        format!("{}.{}", self.section, key)
    }

    /// Loads the configuration of a single component.
    ///
    /// If the component's section is present, its contents are handed to
    /// [`load_json`][ComponentConfiguration::load_json]. Otherwise, the component is reset to its defaults and
    /// validated.
    ///
    /// # Errors
    ///
    /// If the section could not be read, or if the component rejects it, an error will be returned.
    pub fn load(&self, component: &mut dyn ComponentConfiguration) -> Result<(), ConfigurationError> {
        let key = component.config_key();
        let path = self.component_path(key);

        match self.config.try_get_typed::<Value>(&path)? {
            Some(section) => {
                debug!(component = key, path = %path, "Loading component configuration.");
                let raw = serde_json::to_vec(&section).context(Render)?;
                component.load_json(&raw).context(Component)?;
            }
            None => {
                info!(component = key, path = %path, "No configuration found for component. Using defaults.");
                component.set_default().context(Component)?;
                component.validate().context(Component)?;
            }
        }

        Ok(())
    }

    /// Renders the configuration of the given components into a single document.
    ///
    /// Each component is validated before it is rendered. The document is pretty-printed JSON, with every component
    /// nested under the manager's section.
    ///
    /// # Errors
    ///
    /// If any component is invalid or fails to encode, an error will be returned.
    pub fn render(&self, components: &[&dyn ComponentConfiguration]) -> Result<Vec<u8>, ConfigurationError> {
        let mut sections = Map::new();
        for component in components {
            let key = component.config_key();
            component.validate().context(Component)?;

            let raw = component.to_json().context(Component)?;
            let value: Value = serde_json::from_slice(&raw)
                .map_err(|source| ComponentConfigError::Decode { key, source })
                .context(Component)?;
            sections.insert(key.to_string(), value);
        }

        let mut document = Map::new();
        document.insert(self.section.clone(), Value::Object(sections));
        serde_json::to_vec_pretty(&Value::Object(document)).context(Render)
    }
}
