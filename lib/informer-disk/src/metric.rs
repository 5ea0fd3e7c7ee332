use std::{fmt, str::FromStr};

use snafu::Snafu;

/// Error returned when a metric type name is not recognized.
#[derive(Debug, Eq, PartialEq, Snafu)]
#[snafu(display("unknown metric type '{}' (expected one of: freespace, reposize)", name))]
pub struct UnknownMetricType {
    /// The name that was not recognized.
    pub name: String,
}

/// The disk quantity reported by the disk informer.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum MetricType {
    /// Free space left in the repository.
    #[default]
    FreeSpace,

    /// Space currently used by the repository.
    RepoSize,
}

impl MetricType {
    /// Every recognized metric type.
    pub const ALL: [MetricType; 2] = [MetricType::FreeSpace, MetricType::RepoSize];

    /// Returns the canonical name of this metric type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FreeSpace => "freespace",
            Self::RepoSize => "reposize",
        }
    }

    /// Returns `true` if this is a metric type the disk informer knows how to produce.
    pub fn is_recognized(&self) -> bool {
        Self::ALL.contains(self)
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = UnknownMetricType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "freespace" => Ok(Self::FreeSpace),
            "reposize" => Ok(Self::RepoSize),
            _ => UnknownMetricTypeSnafu { name: s }.fail(),
        }
    }
}
