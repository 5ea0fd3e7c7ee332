use std::time::Duration;

use informer_config::{ComponentConfigError, ComponentConfiguration};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{DiagnosticSink, MetricType, TimeSpan, TracingSink, UnknownMetricType};

/// Key identifying the disk informer's section of the configuration.
pub const CONFIG_KEY: &str = "disk";

/// Default time for which a disk metric stays valid.
pub const DEFAULT_METRIC_TTL: TimeSpan = TimeSpan::from_secs(30);

/// Default metric reported by the disk informer.
pub const DEFAULT_METRIC_TYPE: MetricType = MetricType::FreeSpace;

/// Persisted form of [`MetricConfig`].
///
/// Both fields are kept as plain strings so that a bad value in either can be handled field by field, rather than
/// failing the whole document.
#[derive(Default, Serialize)]
struct RawMetricConfig {
    metric_ttl: String,
    metric_type: String,
}

impl RawMetricConfig {
    /// Decodes the persisted form.
    ///
    /// A `null` document, or a `null` or absent field, leaves the corresponding fields empty. Field names are matched
    /// ignoring ASCII case, with an exact match taking precedence. Unknown fields are ignored.
    fn from_slice(raw: &[u8]) -> Result<Self, serde_json::Error> {
        let mut document: Map<String, Value> = serde_json::from_slice::<Option<_>>(raw)?.unwrap_or_default();

        Ok(Self {
            metric_ttl: decode_field(&mut document, "metric_ttl")?,
            metric_type: decode_field(&mut document, "metric_type")?,
        })
    }
}

fn decode_field(document: &mut Map<String, Value>, name: &str) -> Result<String, serde_json::Error> {
    let value = match document.remove(name) {
        Some(value) => Some(value),
        None => {
            let folded = document.keys().find(|key| key.eq_ignore_ascii_case(name)).cloned();
            folded.and_then(|key| document.remove(&key))
        }
    };

    match value {
        Some(value) => serde_json::from_value::<Option<String>>(value).map(Option::unwrap_or_default),
        None => Ok(String::new()),
    }
}

/// Disk informer configuration.
///
/// Controls which disk metric the informer produces, and how long each produced value remains valid before the
/// informer samples it again.
///
/// ## Persisted form
///
/// ```json
/// {
///   "metric_ttl": "30s",
///   "metric_type": "freespace"
/// }
/// ```
///
/// `metric_ttl` is a duration literal (see [`TimeSpan`]), and `metric_type` is either `freespace` or `reposize`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MetricConfig {
    metric_ttl: TimeSpan,
    metric_type: MetricType,
}

impl MetricConfig {
    /// Returns the time for which a produced metric stays valid.
    pub fn metric_ttl(&self) -> TimeSpan {
        self.metric_ttl
    }

    /// Returns the metric the informer produces.
    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    /// Sets the time for which a produced metric stays valid.
    pub fn with_metric_ttl(mut self, metric_ttl: TimeSpan) -> Self {
        self.metric_ttl = metric_ttl;
        self
    }

    /// Sets the metric the informer produces.
    pub fn with_metric_type(mut self, metric_type: MetricType) -> Self {
        self.metric_type = metric_type;
        self
    }

    /// Returns how often the informer should sample the metric, or `None` if the TTL is not positive.
    pub fn refresh_interval(&self) -> Option<Duration> {
        self.metric_ttl.to_std()
    }

    /// Populates the configuration from its persisted JSON form, reporting decode failures to `sink`.
    ///
    /// An unparseable `metric_ttl` is not an error at this stage: the TTL becomes zero, which validation then rejects.
    ///
    /// # Errors
    ///
    /// If the document is neither a JSON object nor `null`, or a known field holds something other than a string or
    /// `null`, a decode error is returned after being reported to
    /// `sink`. If `metric_type` is not recognized, or the resulting configuration fails validation, an invalid
    /// configuration error is returned.
    pub fn load_json_with_sink(&mut self, raw: &[u8], sink: &dyn DiagnosticSink) -> Result<(), ComponentConfigError> {
        let raw_config = match RawMetricConfig::from_slice(raw) {
            Ok(raw_config) => raw_config,
            Err(source) => {
                sink.decode_failed(CONFIG_KEY, &source);
                return Err(ComponentConfigError::Decode { key: CONFIG_KEY, source });
            }
        };

        self.metric_ttl = TimeSpan::parse_lenient(&raw_config.metric_ttl);
        self.metric_type = raw_config
            .metric_type
            .parse()
            .map_err(|e: UnknownMetricType| invalid("metric_type", e.to_string()))?;

        debug!(metric_ttl = %self.metric_ttl, metric_type = %self.metric_type, "Loaded disk informer configuration.");

        self.validate()
    }
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            metric_ttl: DEFAULT_METRIC_TTL,
            metric_type: DEFAULT_METRIC_TYPE,
        }
    }
}

fn invalid(field: &'static str, reason: String) -> ComponentConfigError {
    ComponentConfigError::InvalidConfig {
        key: CONFIG_KEY,
        field,
        reason,
    }
}

impl ComponentConfiguration for MetricConfig {
    fn config_key(&self) -> &'static str {
        CONFIG_KEY
    }

    fn set_default(&mut self) -> Result<(), ComponentConfigError> {
        *self = Self::default();
        Ok(())
    }

    fn validate(&self) -> Result<(), ComponentConfigError> {
        if !self.metric_ttl.is_positive() {
            return Err(invalid(
                "metric_ttl",
                format!("must be greater than zero, got '{}'", self.metric_ttl),
            ));
        }

        if !self.metric_type.is_recognized() {
            return Err(invalid(
                "metric_type",
                format!("unrecognized metric type '{}'", self.metric_type),
            ));
        }

        Ok(())
    }

    fn load_json(&mut self, raw: &[u8]) -> Result<(), ComponentConfigError> {
        self.load_json_with_sink(raw, &TracingSink)
    }

    fn to_json(&self) -> Result<Vec<u8>, ComponentConfigError> {
        let raw_config = RawMetricConfig {
            metric_ttl: self.metric_ttl.to_string(),
            metric_type: self.metric_type.to_string(),
        };

        serde_json::to_vec(&raw_config).map_err(|source| ComponentConfigError::Encode { key: CONFIG_KEY, source })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use proptest::prelude::*;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        reports: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn reports(&self) -> Vec<String> {
            self.reports.lock().unwrap().clone()
        }
    }

    impl DiagnosticSink for RecordingSink {
        fn decode_failed(&self, config_key: &'static str, error: &serde_json::Error) {
            self.reports.lock().unwrap().push(format!("{}: {}", config_key, error));
        }
    }

    fn load(raw: &str) -> Result<MetricConfig, ComponentConfigError> {
        let mut config = MetricConfig::default();
        config.load_json(raw.as_bytes()).map(|()| config)
    }

    fn arb_config() -> impl Strategy<Value = MetricConfig> {
        (
            1..=i64::MAX,
            prop_oneof![Just(MetricType::FreeSpace), Just(MetricType::RepoSize)],
        )
            .prop_map(|(nanos, metric_type)| {
                MetricConfig::default()
                    .with_metric_ttl(TimeSpan::from_nanos(nanos))
                    .with_metric_type(metric_type)
            })
    }

    #[test]
    fn config_key() {
        assert_eq!(MetricConfig::default().config_key(), "disk");
    }

    #[test]
    fn defaults_are_valid() {
        let mut config = MetricConfig::default()
            .with_metric_ttl(TimeSpan::from_secs(-5))
            .with_metric_type(MetricType::RepoSize);
        config.set_default().unwrap();

        assert_eq!(config.metric_ttl(), TimeSpan::from_secs(30));
        assert_eq!(config.metric_type(), MetricType::FreeSpace);
        assert_eq!(config.refresh_interval(), Some(Duration::from_secs(30)));
        config.validate().unwrap();
    }

    #[test]
    fn rejects_non_positive_ttl() {
        for ttl in [TimeSpan::ZERO, TimeSpan::from_nanos(-1), TimeSpan::from_secs(-30)] {
            let config = MetricConfig::default().with_metric_ttl(ttl);
            let err = config.validate().unwrap_err();
            assert!(err.is_invalid());
            assert_eq!(err.field(), Some("metric_ttl"));
            assert_eq!(config.refresh_interval(), None);
        }
    }

    #[test]
    fn load_scenario() {
        let config = load(r#"{"metric_ttl":"1m","metric_type":"reposize"}"#).unwrap();
        assert_eq!(config.metric_ttl(), TimeSpan::from_secs(60));
        assert_eq!(config.metric_type(), MetricType::RepoSize);

        let rendered = config.to_json().unwrap();
        assert_eq!(
            String::from_utf8(rendered).unwrap(),
            r#"{"metric_ttl":"1m0s","metric_type":"reposize"}"#
        );
    }

    #[test]
    fn default_renders() {
        let rendered = MetricConfig::default().to_json().unwrap();
        assert_eq!(
            String::from_utf8(rendered).unwrap(),
            r#"{"metric_ttl":"30s","metric_type":"freespace"}"#
        );
    }

    #[test]
    fn rejects_unknown_metric_type() {
        let err = load(r#"{"metric_ttl":"30s","metric_type":"bogus"}"#).unwrap_err();
        assert!(err.is_invalid());
        assert_eq!(err.field(), Some("metric_type"));
    }

    #[test]
    fn empty_document_is_invalid() {
        let err = load("{}").unwrap_err();
        assert!(err.is_invalid());
        assert_eq!(err.field(), Some("metric_type"));
    }

    #[test]
    fn missing_ttl_is_invalid() {
        let err = load(r#"{"metric_type":"freespace"}"#).unwrap_err();
        assert!(err.is_invalid());
        assert_eq!(err.field(), Some("metric_ttl"));
    }

    #[test]
    fn malformed_ttl_is_rejected_by_validation() {
        let sink = RecordingSink::default();
        let mut config = MetricConfig::default();
        let err = config
            .load_json_with_sink(br#"{"metric_ttl":"not-a-duration","metric_type":"freespace"}"#, &sink)
            .unwrap_err();

        assert!(err.is_invalid());
        assert!(!err.is_decode());
        assert_eq!(err.field(), Some("metric_ttl"));
        assert_eq!(config.metric_ttl(), TimeSpan::ZERO);
        assert!(sink.reports().is_empty());
    }

    #[test]
    fn malformed_document_is_reported() {
        let inputs: [&[u8]; 3] = [b"{", b"not json", br#"{"metric_ttl": 30, "metric_type": "freespace"}"#];
        for raw in inputs {
            let sink = RecordingSink::default();
            let mut config = MetricConfig::default();
            let err = config.load_json_with_sink(raw, &sink).unwrap_err();

            assert!(err.is_decode());
            let reports = sink.reports();
            assert_eq!(reports.len(), 1);
            assert!(reports[0].starts_with("disk: "));

            // Nothing was applied.
            assert_eq!(config, MetricConfig::default());
        }
    }

    #[test]
    fn null_document_is_invalid() {
        let sink = RecordingSink::default();
        let mut config = MetricConfig::default();
        let err = config.load_json_with_sink(b"null", &sink).unwrap_err();

        assert!(err.is_invalid());
        assert_eq!(err.field(), Some("metric_type"));
        assert!(sink.reports().is_empty());
    }

    #[test]
    fn null_fields_are_treated_as_empty() {
        let sink = RecordingSink::default();
        let mut config = MetricConfig::default();
        let err = config
            .load_json_with_sink(br#"{"metric_ttl":null,"metric_type":"freespace"}"#, &sink)
            .unwrap_err();

        assert!(err.is_invalid());
        assert_eq!(err.field(), Some("metric_ttl"));
        assert!(sink.reports().is_empty());

        let err = load(r#"{"metric_ttl":"5s","metric_type":null}"#).unwrap_err();
        assert_eq!(err.field(), Some("metric_type"));
    }

    #[test]
    fn field_names_ignore_case() {
        let config = load(r#"{"METRIC_TYPE":"reposize","metric_ttl":"5s"}"#).unwrap();
        assert_eq!(config.metric_type(), MetricType::RepoSize);
        assert_eq!(config.metric_ttl(), TimeSpan::from_secs(5));

        let config = load(r#"{"Metric_Type":"reposize","metric_type":"freespace","Metric_TTL":"2s"}"#).unwrap();
        assert_eq!(config.metric_type(), MetricType::FreeSpace);
        assert_eq!(config.metric_ttl(), TimeSpan::from_secs(2));

        // Only the field name is case-insensitive.
        let err = load(r#"{"metric_type":"RepoSize","metric_ttl":"5s"}"#).unwrap_err();
        assert_eq!(err.field(), Some("metric_type"));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let config = load(r#"{"metric_ttl":"45s","metric_type":"freespace","sampling":"fast"}"#).unwrap();
        assert_eq!(config.metric_ttl(), TimeSpan::from_secs(45));
    }

    proptest! {
        #[test]
        fn property_test_json_round_trip(config in arb_config()) {
            config.validate().unwrap();

            let raw = config.to_json().unwrap();
            let mut loaded = MetricConfig::default();
            loaded.load_json(&raw).unwrap();

            prop_assert_eq!(loaded, config);
        }
    }
}
