//! Freshness buckets for display.

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::watermark::Watermark;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessBucket {
    /// Synced within the last day.
    Fresh,
    /// One to seven days old.
    Aging,
    /// More than seven whole days old.
    Stale,
    /// No watermark available.
    NoData,
}

impl FreshnessBucket {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Aging => "aging",
            Self::Stale => "stale",
            Self::NoData => "no_data",
        }
    }
}

impl fmt::Display for FreshnessBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a watermark by its age in whole days at `now`.
#[must_use]
pub fn classify(watermark: Option<&Watermark>, now: DateTime<Local>) -> FreshnessBucket {
    let Some(watermark) = watermark else {
        return FreshnessBucket::NoData;
    };

    let days = watermark.age_at(now).num_days();
    if days > 7 {
        FreshnessBucket::Stale
    } else if days > 1 {
        FreshnessBucket::Aging
    } else {
        FreshnessBucket::Fresh
    }
}
