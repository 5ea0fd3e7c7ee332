//! Configuration for the disk informer.
//!
//! The disk informer reports a single disk metric, either the free space left in the repository or the repository's
//! size, and publishes it with a time-to-live after which it is sampled again. This crate holds the configuration that
//! drives it: [`MetricConfig`], its persisted JSON form, and the lookup of the remote procedure used to sample each
//! [`MetricType`].
#![deny(warnings)]
#![deny(missing_docs)]

mod config;
pub use self::config::{MetricConfig, CONFIG_KEY, DEFAULT_METRIC_TTL, DEFAULT_METRIC_TYPE};

mod diagnostics;
pub use self::diagnostics::{DiagnosticSink, TracingSink};

mod metric;
pub use self::metric::{MetricType, UnknownMetricType};

mod rpc;
pub use self::rpc::{MetricRpcTable, REPO_STAT_METHOD};

mod time_span;
pub use self::time_span::{ParseTimeSpanError, TimeSpan};
