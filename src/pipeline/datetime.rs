//! Calendar-time view of a frame index.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use netdata_types::{Frame, RowKey};

use crate::ProcessError;

/// Suffix to nanoseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("µs", 1_000.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("min", 60_000_000_000.0),
    ("s", 1_000_000_000.0),
    ("h", 3_600_000_000_000.0),
    ("d", 86_400_000_000_000.0),
];

/// Parse frequency strings like "1s", "5s", "1min", "500ms" or "h".
///
/// A bare unit means one of it.
pub fn parse_frequency(s: &str) -> Result<Duration, ProcessError> {
    let s = s.trim();
    let invalid = || ProcessError::InvalidFrequency(s.to_string());

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = match val_str.trim() {
                "" => 1.0,
                n => n.parse().map_err(|_| invalid())?,
            };
            if !val.is_finite() || val <= 0.0 {
                return Err(invalid());
            }
            return Ok(Duration::from_nanos((val * multiplier) as u64));
        }
    }

    Err(invalid())
}

/// How the index frequency is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Frequency {
    /// Use the common step when the rows are evenly spaced.
    #[default]
    Infer,
    /// Require every step to equal this duration.
    Fixed(Duration),
}

impl FromStr for Frequency {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("infer") {
            return Ok(Self::Infer);
        }
        parse_frequency(s).map(Self::Fixed)
    }
}

/// Index timestamps as UTC calendar time.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DatetimeIndex {
    pub values: Vec<DateTime<Utc>>,
    /// Step between consecutive rows of a host, if known.
    pub freq: Option<Duration>,
}

impl DatetimeIndex {
    /// Convert the index of `frame`, checking or inferring its frequency.
    pub fn from_frame(frame: &Frame, freq: &Frequency) -> Result<Self, ProcessError> {
        let values = frame
            .index()
            .iter()
            .map(|key| DateTime::from_timestamp(key.time, 0).ok_or(ProcessError::TimestampOutOfRange(key.time)))
            .collect::<Result<Vec<_>, _>>()?;

        let freq = match freq {
            Frequency::Infer => infer_step(frame.index()),
            Frequency::Fixed(expected) => {
                check_step(frame.index(), *expected)?;
                Some(*expected)
            }
        };

        Ok(Self { values, freq })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Steps between consecutive rows of the same host, with the later row's time.
fn steps(index: &[RowKey]) -> impl Iterator<Item = (i64, i64)> + '_ {
    index
        .windows(2)
        .filter(|pair| pair[0].host == pair[1].host)
        .map(|pair| (pair[1].time - pair[0].time, pair[1].time))
}

fn infer_step(index: &[RowKey]) -> Option<Duration> {
    if index.len() < 3 {
        return None;
    }
    let mut steps = steps(index).map(|(step, _)| step);
    let first = steps.next()?;
    if first <= 0 || steps.any(|step| step != first) {
        return None;
    }
    Some(Duration::from_secs(first as u64))
}

fn check_step(index: &[RowKey], expected: Duration) -> Result<(), ProcessError> {
    let secs = expected.as_secs_f64();
    for (step, at) in steps(index) {
        if (step as f64 - secs).abs() > f64::EPSILON {
            return Err(ProcessError::FrequencyMismatch {
                expected: secs,
                found: step,
                at,
            });
        }
    }
    Ok(())
}
