//! Synchronization watermarks.
//!
//! A watermark keeps the zone information its source column carried. Values
//! read from zone-less columns stay naive and are compared against local
//! wall-clock time; they are never promoted to UTC.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Watermark {
    /// Timestamp with an explicit offset.
    Zoned(DateTime<FixedOffset>),
    /// Timestamp without zone information (local wall-clock).
    Naive(NaiveDateTime),
}

impl Watermark {
    /// Build a zoned (UTC) watermark from microseconds since the Unix epoch.
    #[must_use]
    pub fn from_utc_micros(micros: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp_micros(micros).map(|dt| Self::Zoned(dt.fixed_offset()))
    }

    /// Build a naive watermark from wall-clock microseconds since the epoch.
    #[must_use]
    pub fn from_naive_micros(micros: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp_micros(micros).map(|dt| Self::Naive(dt.naive_utc()))
    }

    #[must_use]
    pub const fn is_zoned(&self) -> bool {
        matches!(self, Self::Zoned(_))
    }

    /// Elapsed time between the watermark and `now`.
    ///
    /// Zoned values compare in absolute time; naive values compare against
    /// `now`'s local wall-clock reading.
    #[must_use]
    pub fn age_at(&self, now: DateTime<Local>) -> TimeDelta {
        match self {
            Self::Zoned(ts) => now.signed_duration_since(*ts),
            Self::Naive(ts) => now.naive_local().signed_duration_since(*ts),
        }
    }

    /// Format with a `strftime` pattern in the watermark's own zone.
    #[must_use]
    pub fn format(&self, pattern: &str) -> String {
        match self {
            Self::Zoned(ts) => ts.format(pattern).to_string(),
            Self::Naive(ts) => ts.format(pattern).to_string(),
        }
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zoned(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Naive(ts) => write!(f, "{}", ts.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

impl FromStr for Watermark {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self::Zoned(ts));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|pattern| NaiveDateTime::parse_from_str(trimmed, pattern).ok())
            .map(Self::Naive)
            .ok_or_else(|| CoreError::InvalidWatermark(s.to_string()))
    }
}

impl From<DateTime<Utc>> for Watermark {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Zoned(value.fixed_offset())
    }
}
