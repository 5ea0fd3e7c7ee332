use std::{borrow::Cow, collections::HashMap};

use informer_config::{ComponentConfigError, ComponentConfiguration as _};

use crate::{MetricConfig, MetricType, CONFIG_KEY};

/// Remote procedure that reports repository statistics, from which both disk metrics are derived.
pub const REPO_STAT_METHOD: &str = "Connector.RepoStat";

/// Maps each metric type to the remote procedure that samples it.
///
/// The table is owned by whoever issues the remote calls; [`MetricConfig`] only names the metric it wants.
#[derive(Clone, Debug)]
pub struct MetricRpcTable {
    methods: HashMap<MetricType, Cow<'static, str>>,
}

impl MetricRpcTable {
    /// Creates an empty table.
    pub fn empty() -> Self {
        Self { methods: HashMap::new() }
    }

    /// Registers `method` as the remote procedure for `metric_type`, replacing any previous entry.
    pub fn with_method<M>(mut self, metric_type: MetricType, method: M) -> Self
    where
        M: Into<Cow<'static, str>>,
    {
        self.methods.insert(metric_type, method.into());
        self
    }

    /// Returns the remote procedure registered for `metric_type`, if any.
    pub fn method_for(&self, metric_type: MetricType) -> Option<&str> {
        self.methods.get(&metric_type).map(|method| method.as_ref())
    }

    /// Validates `config` and returns the remote procedure for its metric type.
    ///
    /// # Errors
    ///
    /// If the configuration is invalid, or no procedure is registered for its metric type, an error will be returned.
    pub fn resolve(&self, config: &MetricConfig) -> Result<&str, ComponentConfigError> {
        config.validate()?;
        self.method_for(config.metric_type())
            .ok_or_else(|| ComponentConfigError::InvalidConfig {
                key: CONFIG_KEY,
                field: "metric_type",
                reason: format!("no remote procedure registered for '{}'", config.metric_type()),
            })
    }
}

impl Default for MetricRpcTable {
    fn default() -> Self {
        MetricType::ALL
            .into_iter()
            .fold(Self::empty(), |table, metric_type| table.with_method(metric_type, REPO_STAT_METHOD))
    }
}
