//! Gate deciding whether the seasonal model should run for an entity

use crate::config::{AdequacyConfig, GranularityConfig};
use crate::data::ObservationSeries;
use crate::granularity::{FrequencyClass, GranularityClass};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of the data adequacy check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdequacyDecision {
    pub use_seasonal_model: bool,
    pub reason: String,
    pub frequency_class: FrequencyClass,
    pub point_count: usize,
}

/// Frequency and volume gate for the seasonal model
#[derive(Debug, Clone, Default)]
pub struct DataAdequacyClassifier {
    adequacy: AdequacyConfig,
    granularity: GranularityConfig,
}

impl DataAdequacyClassifier {
    pub fn new(adequacy: AdequacyConfig, granularity: GranularityConfig) -> Self {
        Self {
            adequacy,
            granularity,
        }
    }

    /// Decide whether seasonal decomposition is worth running.
    ///
    /// Monthly-granularity history never qualifies. Otherwise the series
    /// needs at least `min_points` observations at daily or weekly cadence.
    pub fn classify(&self, series: &ObservationSeries) -> AdequacyDecision {
        let point_count = series.len();
        if point_count == 0 {
            return AdequacyDecision {
                use_seasonal_model: false,
                reason: "no data".to_string(),
                frequency_class: FrequencyClass::Unknown,
                point_count,
            };
        }

        if GranularityClass::of(series, &self.granularity).is_monthly() {
            return AdequacyDecision {
                use_seasonal_model: false,
                reason: format!(
                    "monthly data ({} points); seasonal model needs daily or weekly cadence",
                    point_count
                ),
                frequency_class: FrequencyClass::Monthly,
                point_count,
            };
        }

        let gap = series.average_gap_days().unwrap_or(0.0);
        let frequency_class = FrequencyClass::from_gap(gap, &self.adequacy);
        let min_points = self.adequacy.min_points;
        let use_seasonal_model = point_count >= min_points && frequency_class.is_dense();

        let reason = if use_seasonal_model {
            format!(
                "adequate data for the seasonal model ({} points, {})",
                point_count, frequency_class
            )
        } else {
            format!(
                "insufficient data for the seasonal model ({} points, {}; needs {} dense points)",
                point_count, frequency_class, min_points
            )
        };

        debug!(
            points = point_count,
            average_gap = gap,
            frequency = %frequency_class,
            use_seasonal_model,
            "classified history"
        );

        AdequacyDecision {
            use_seasonal_model,
            reason,
            frequency_class,
            point_count,
        }
    }
}
