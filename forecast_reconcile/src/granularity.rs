//! Cadence classification of historical observations
//!
//! Both classes are derived from a series' span and point count every time
//! they are needed; nothing here is stored alongside the series.

use crate::config::{AdequacyConfig, GranularityConfig};
use crate::data::ObservationSeries;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Native reporting granularity of an entity's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GranularityClass {
    /// Daily (or denser than monthly) observations
    Daily,
    /// One observation per month
    Monthly,
}

impl Default for GranularityClass {
    fn default() -> Self {
        GranularityClass::Daily
    }
}

impl GranularityClass {
    /// Classify a series.
    ///
    /// A series is monthly when its average gap exceeds
    /// `monthly_min_gap` days and it has at most `monthly_max_points`
    /// observations. Series with fewer than two points are daily.
    pub fn of(series: &ObservationSeries, config: &GranularityConfig) -> Self {
        match series.average_gap_days() {
            Some(gap)
                if gap > config.monthly_min_gap && series.len() <= config.monthly_max_points =>
            {
                GranularityClass::Monthly
            }
            _ => GranularityClass::Daily,
        }
    }

    pub fn is_monthly(self) -> bool {
        self == GranularityClass::Monthly
    }
}

impl fmt::Display for GranularityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GranularityClass::Daily => write!(f, "daily"),
            GranularityClass::Monthly => write!(f, "monthly"),
        }
    }
}

/// Observation cadence as seen by the seasonal-model gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyClass {
    /// Average gap within the daily threshold
    DenseDaily,
    /// Average gap within the weekly threshold
    DenseWeekly,
    /// Anything coarser
    Sparse,
    /// Monthly reporting granularity
    Monthly,
    /// No observations
    Unknown,
}

impl FrequencyClass {
    /// Classify by average gap alone
    pub fn from_gap(average_gap: f64, config: &AdequacyConfig) -> Self {
        if average_gap <= config.daily_max_gap {
            FrequencyClass::DenseDaily
        } else if average_gap <= config.weekly_max_gap {
            FrequencyClass::DenseWeekly
        } else {
            FrequencyClass::Sparse
        }
    }

    /// Whether the cadence is dense enough for seasonal decomposition
    pub fn is_dense(self) -> bool {
        matches!(self, FrequencyClass::DenseDaily | FrequencyClass::DenseWeekly)
    }
}

impl fmt::Display for FrequencyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FrequencyClass::DenseDaily => "dense/daily",
            FrequencyClass::DenseWeekly => "dense/weekly",
            FrequencyClass::Sparse => "sparse",
            FrequencyClass::Monthly => "monthly",
            FrequencyClass::Unknown => "unknown",
        };
        f.write_str(label)
    }
}
