//! Last-resort check against degenerate near-zero forecasts

use crate::config::ZeroFloorConfig;
use crate::forecast::ForecastSeries;
use tracing::warn;

/// Result of running the zero-floor check
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroFloorOutcome {
    pub series: ForecastSeries,
    /// Whether the alternate series replaced the chosen one
    pub substituted: bool,
}

/// Replaces a near-zero reconciled series with the alternate source.
///
/// The seasonal model can emit near-zero predictions on sparse history
/// without failing. When the chosen series' mean falls below
/// `min_ratio × historical mean`, the alternate is used instead, provided it
/// is both larger and itself clears the same threshold.
#[derive(Debug, Clone, Default)]
pub struct ZeroFloorValidator {
    config: ZeroFloorConfig,
}

impl ZeroFloorValidator {
    pub fn new(config: ZeroFloorConfig) -> Self {
        Self { config }
    }

    /// Whether `chosen` should be replaced by `alternate`
    pub fn should_substitute(
        &self,
        chosen: &ForecastSeries,
        alternate: &ForecastSeries,
        historical_mean: f64,
    ) -> bool {
        if alternate.is_empty() {
            return false;
        }
        if chosen.is_empty() {
            return true;
        }
        if historical_mean <= 0.0 {
            return false;
        }

        let floor = historical_mean * self.config.min_ratio;
        let chosen_mean = chosen.mean();
        let alternate_mean = alternate.mean();
        chosen_mean < floor && alternate_mean > chosen_mean && alternate_mean >= floor
    }

    pub fn validate(
        &self,
        entity_id: &str,
        chosen: ForecastSeries,
        alternate: Option<&ForecastSeries>,
        historical_mean: f64,
    ) -> ZeroFloorOutcome {
        match alternate {
            Some(alt) if self.should_substitute(&chosen, alt, historical_mean) => {
                warn!(
                    entity = entity_id,
                    chosen_mean = chosen.mean(),
                    alternate_mean = alt.mean(),
                    historical_mean,
                    "degenerate forecast replaced by alternate source"
                );
                ZeroFloorOutcome {
                    series: alt.clone(),
                    substituted: true,
                }
            }
            _ => ZeroFloorOutcome {
                series: chosen,
                substituted: false,
            },
        }
    }
}
