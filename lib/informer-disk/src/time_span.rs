use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use snafu::Snafu;

const NANOS_PER_MICRO: u64 = 1_000;
const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SEC: u64 = 1_000_000_000;
const NANOS_PER_MIN: u64 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: u64 = 60 * NANOS_PER_MIN;

// Largest magnitude a span can have: `i64::MIN` in nanoseconds.
const MAX_MAGNITUDE: u64 = 1 << 63;

/// Error returned when a duration literal cannot be parsed.
#[derive(Debug, Eq, PartialEq, Snafu)]
#[snafu(context(suffix(false)))]
pub enum ParseTimeSpanError {
    /// The literal is not shaped like a duration.
    #[snafu(display("invalid duration '{}'", input))]
    Invalid {
        /// Original input.
        input: String,
    },

    /// A number was not followed by a unit.
    #[snafu(display("missing unit in duration '{}'", input))]
    MissingUnit {
        /// Original input.
        input: String,
    },

    /// A number was followed by an unrecognized unit.
    #[snafu(display("unknown unit '{}' in duration '{}'", unit, input))]
    UnknownUnit {
        /// The unrecognized unit.
        unit: String,

        /// Original input.
        input: String,
    },

    /// The literal describes a span larger than can be represented.
    #[snafu(display("duration '{}' is out of range", input))]
    Overflow {
        /// Original input.
        input: String,
    },
}

/// A signed span of time, with nanosecond precision.
///
/// Unlike [`Duration`], a `TimeSpan` can be zero or negative, which lets configuration carry such values until they are
/// rejected by validation.
///
/// # Textual form
///
/// A span is written as an optional sign followed by one or more `<number><unit>` groups, such as `30s`, `1m30s`,
/// `1.5h` or `-250ms`. Numbers may have a decimal fraction. Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and
/// `h`. The lone literal `0` is accepted as zero.
///
/// Spans display in the same form: whole hours, minutes and (possibly fractional) seconds for spans of at least one
/// second (`1m0s`, `1h2m3.5s`), and a single fractional sub-second unit otherwise (`1.5ms`, `100ns`).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TimeSpan(i64);

impl TimeSpan {
    /// A span of zero length.
    pub const ZERO: TimeSpan = TimeSpan(0);

    /// Creates a span from a number of nanoseconds.
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Creates a span from a number of milliseconds, saturating on overflow.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(NANOS_PER_MILLI as i64))
    }

    /// Creates a span from a number of seconds, saturating on overflow.
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs.saturating_mul(NANOS_PER_SEC as i64))
    }

    /// Returns the span as a number of nanoseconds.
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Returns `true` if the span is strictly greater than zero.
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Converts the span to a [`Duration`], if it is strictly positive.
    pub fn to_std(self) -> Option<Duration> {
        u64::try_from(self.0)
            .ok()
            .filter(|nanos| *nanos > 0)
            .map(Duration::from_nanos)
    }

    /// Parses a duration literal, yielding a zero span if it is not valid.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl From<Duration> for TimeSpan {
    fn from(duration: Duration) -> Self {
        Self(i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX))
    }
}

fn unit_nanos(unit: &str) -> Option<u64> {
    match unit {
        "ns" => Some(1),
        // U+00B5 (micro sign) and U+03BC (Greek small letter mu).
        "us" | "\u{b5}s" | "\u{3bc}s" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(NANOS_PER_MIN),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

impl FromStr for TimeSpan {
    type Err = ParseTimeSpanError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut s = input;
        let mut negative = false;
        if let Some(rest) = s.strip_prefix('-') {
            negative = true;
            s = rest;
        } else if let Some(rest) = s.strip_prefix('+') {
            s = rest;
        }

        if s == "0" {
            return Ok(Self::ZERO);
        }
        if s.is_empty() {
            return Invalid { input }.fail();
        }

        let mut total: u64 = 0;
        while !s.is_empty() {
            if !s.starts_with(|c: char| c == '.' || c.is_ascii_digit()) {
                return Invalid { input }.fail();
            }

            let (whole, rest) = split_digits(s);
            s = rest;
            let mut value = whole.bytes().try_fold(0u64, |acc, digit| {
                acc.checked_mul(10)
                    .and_then(|acc| acc.checked_add(u64::from(digit - b'0')))
                    .filter(|acc| *acc <= MAX_MAGNITUDE)
            });
            if value.is_none() {
                return Overflow { input }.fail();
            }

            // Fractional digits past what fits in the accumulator are dropped.
            let mut fraction = 0u64;
            let mut scale = 1.0f64;
            let mut has_fraction = false;
            if let Some(rest) = s.strip_prefix('.') {
                let (digits, rest) = split_digits(rest);
                s = rest;
                has_fraction = !digits.is_empty();
                for digit in digits.bytes() {
                    if fraction > (MAX_MAGNITUDE - 1) / 10 {
                        break;
                    }
                    fraction = fraction * 10 + u64::from(digit - b'0');
                    scale *= 10.0;
                }
            }
            if whole.is_empty() && !has_fraction {
                return Invalid { input }.fail();
            }

            let unit_end = s.find(|c: char| c == '.' || c.is_ascii_digit()).unwrap_or(s.len());
            let (unit, rest) = s.split_at(unit_end);
            s = rest;
            if unit.is_empty() {
                return MissingUnit { input }.fail();
            }
            let Some(per_unit) = unit_nanos(unit) else {
                return UnknownUnit { unit, input }.fail();
            };

            value = value.and_then(|v| v.checked_mul(per_unit));
            if fraction > 0 {
                let partial = (fraction as f64 * (per_unit as f64 / scale)) as u64;
                value = value.and_then(|v| v.checked_add(partial));
            }

            match value.and_then(|v| total.checked_add(v)) {
                Some(sum) if sum <= MAX_MAGNITUDE => total = sum,
                _ => return Overflow { input }.fail(),
            }
        }

        if negative {
            // `MAX_MAGNITUDE as i64` is `i64::MIN`, which is its own negation.
            Ok(Self((total as i64).wrapping_neg()))
        } else {
            i64::try_from(total).map(Self).map_err(|_| ParseTimeSpanError::Overflow {
                input: input.to_string(),
            })
        }
    }
}

/// Writes `value / 10^precision`, omitting the fraction when it is zero and trimming trailing zeros otherwise.
fn write_scaled(f: &mut fmt::Formatter<'_>, value: u64, precision: u32) -> fmt::Result {
    let scale = 10u64.pow(precision);
    let (whole, fraction) = (value / scale, value % scale);
    write!(f, "{}", whole)?;
    if fraction != 0 {
        let digits = format!("{:0width$}", fraction, width = precision as usize);
        write!(f, ".{}", digits.trim_end_matches('0'))?;
    }
    Ok(())
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("0s");
        }
        if self.0 < 0 {
            f.write_str("-")?;
        }

        let nanos = self.0.unsigned_abs();
        if nanos < NANOS_PER_SEC {
            let (precision, unit) = if nanos < NANOS_PER_MICRO {
                (0, "ns")
            } else if nanos < NANOS_PER_MILLI {
                (3, "\u{b5}s")
            } else {
                (6, "ms")
            };
            write_scaled(f, nanos, precision)?;
            return f.write_str(unit);
        }

        let hours = nanos / NANOS_PER_HOUR;
        let minutes = (nanos % NANOS_PER_HOUR) / NANOS_PER_MIN;
        if hours > 0 {
            write!(f, "{}h", hours)?;
        }
        if hours > 0 || minutes > 0 {
            write!(f, "{}m", minutes)?;
        }
        write_scaled(f, nanos % NANOS_PER_MIN, 9)?;
        f.write_str("s")
    }
}

impl Serialize for TimeSpan {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeSpan {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
