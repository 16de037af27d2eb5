//! Tunable constants for the reconciliation engine
//!
//! Every threshold and multiplier used by the pipeline lives here so that the
//! empirically chosen values can be recalibrated without code changes. The
//! defaults are the production calibration.

use crate::error::{ReconcileError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Gate deciding whether the seasonal model is worth running
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdequacyConfig {
    /// Minimum number of observations for the seasonal model
    pub min_points: usize,
    /// Largest average gap (days) still considered daily cadence
    pub daily_max_gap: f64,
    /// Largest average gap (days) still considered weekly cadence
    pub weekly_max_gap: f64,
}

impl Default for AdequacyConfig {
    fn default() -> Self {
        Self {
            min_points: 90,
            daily_max_gap: 2.0,
            weekly_max_gap: 10.0,
        }
    }
}

/// Rule for recognising monthly-granularity history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GranularityConfig {
    /// Average gap (days) above which a series may be monthly
    pub monthly_min_gap: f64,
    /// Monthly series never have more points than this
    pub monthly_max_points: usize,
}

impl Default for GranularityConfig {
    fn default() -> Self {
        Self {
            monthly_min_gap: 25.0,
            monthly_max_points: 36,
        }
    }
}

/// MAPE thresholds used by the accuracy router
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Regression MAPE (%) below which the regression model is usable
    pub regression_good_mape: f64,
    /// Seasonal MAPE (%) at or above which the seasonal model is unusable
    pub seasonal_unusable_mape: f64,
    /// Regression is clearly superior when its MAPE is below this share of the seasonal MAPE
    pub superiority_ratio: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            regression_good_mape: 60.0,
            seasonal_unusable_mape: 500.0,
            superiority_ratio: 0.5,
        }
    }
}

/// Divergence bands for adaptive ensemble re-weighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Seasonal/regression ratio below which the seasonal model has diverged
    pub strong_low: f64,
    /// Seasonal/regression ratio above which the seasonal model has diverged
    pub strong_high: f64,
    /// Seasonal weight applied under strong divergence
    pub strong_seasonal_weight: f64,
    /// Seasonal/regression ratio below which divergence is moderate
    pub moderate_low: f64,
    /// Seasonal/regression ratio above which divergence is moderate
    pub moderate_high: f64,
    /// Seasonal weight applied under moderate divergence
    pub moderate_seasonal_weight: f64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            strong_low: 0.1,
            strong_high: 10.0,
            strong_seasonal_weight: 0.1,
            moderate_low: 0.3,
            moderate_high: 3.0,
            moderate_seasonal_weight: 0.25,
        }
    }
}

/// Plausibility caps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClampConfig {
    /// Daily cap as a multiple of the historical daily maximum
    pub daily_multiplier: f64,
    /// Monthly cap as a multiple of the historical monthly maximum
    pub monthly_multiplier: f64,
    /// Lower bound on the historical daily maximum used for the cap
    pub daily_floor: f64,
    /// Days assumed per month when deriving a daily-equivalent maximum
    pub days_per_month: f64,
}

impl Default for ClampConfig {
    fn default() -> Self {
        Self {
            daily_multiplier: 3.0,
            monthly_multiplier: 2.5,
            daily_floor: 0.5,
            days_per_month: 30.0,
        }
    }
}

/// Degenerate-output detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZeroFloorConfig {
    /// A series whose mean is below this share of the historical mean is degenerate
    pub min_ratio: f64,
    /// Number of trailing observations used for the historical mean
    pub history_window: usize,
}

impl Default for ZeroFloorConfig {
    fn default() -> Self {
        Self {
            min_ratio: 0.01,
            history_window: 30,
        }
    }
}

/// Worker pool and batch admission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Upper bound on worker threads
    pub max_workers: usize,
    /// Entities with fewer observations are skipped before any model runs
    pub min_history_points: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_workers: 8,
            min_history_points: 12,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub adequacy: AdequacyConfig,
    pub granularity: GranularityConfig,
    pub router: RouterConfig,
    pub ensemble: EnsembleConfig,
    pub clamp: ClampConfig,
    pub zero_floor: ZeroFloorConfig,
    pub batch: BatchConfig,
}

impl ReconcileConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check that the configuration is internally consistent
    pub fn validate(&self) -> Result<()> {
        if self.adequacy.daily_max_gap <= 0.0
            || self.adequacy.weekly_max_gap < self.adequacy.daily_max_gap
        {
            return Err(ReconcileError::InvalidParameter(format!(
                "frequency gaps must satisfy 0 < daily ({}) <= weekly ({})",
                self.adequacy.daily_max_gap, self.adequacy.weekly_max_gap
            )));
        }

        if self.granularity.monthly_min_gap <= 0.0 {
            return Err(ReconcileError::InvalidParameter(
                "monthly_min_gap must be positive".to_string(),
            ));
        }

        let router = &self.router;
        if router.regression_good_mape <= 0.0
            || router.seasonal_unusable_mape <= 0.0
            || router.superiority_ratio <= 0.0
        {
            return Err(ReconcileError::InvalidParameter(
                "router thresholds must be positive".to_string(),
            ));
        }

        let e = &self.ensemble;
        if !(0.0 < e.strong_low
            && e.strong_low <= e.moderate_low
            && e.moderate_low <= 1.0
            && 1.0 <= e.moderate_high
            && e.moderate_high <= e.strong_high)
        {
            return Err(ReconcileError::InvalidParameter(format!(
                "ensemble bands must nest around 1.0: {} <= {} <= 1 <= {} <= {}",
                e.strong_low, e.moderate_low, e.moderate_high, e.strong_high
            )));
        }
        for w in [e.strong_seasonal_weight, e.moderate_seasonal_weight] {
            if !(0.0..=1.0).contains(&w) {
                return Err(ReconcileError::InvalidParameter(format!(
                    "ensemble weight {} must be within [0, 1]",
                    w
                )));
            }
        }

        let c = &self.clamp;
        if c.daily_multiplier <= 0.0 || c.monthly_multiplier <= 0.0 {
            return Err(ReconcileError::InvalidParameter(
                "clamp multipliers must be positive".to_string(),
            ));
        }
        if c.daily_floor < 0.0 || c.days_per_month <= 0.0 {
            return Err(ReconcileError::InvalidParameter(
                "daily_floor must be >= 0 and days_per_month > 0".to_string(),
            ));
        }

        if !(0.0..1.0).contains(&self.zero_floor.min_ratio) || self.zero_floor.history_window == 0 {
            return Err(ReconcileError::InvalidParameter(
                "zero_floor.min_ratio must be in [0, 1) and history_window > 0".to_string(),
            ));
        }

        if self.batch.max_workers == 0 {
            return Err(ReconcileError::InvalidParameter(
                "batch.max_workers must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ReconcileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.clamp.daily_multiplier, 3.0);
        assert_eq!(config.clamp.monthly_multiplier, 2.5);
        assert_eq!(config.adequacy.min_points, 90);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            ReconcileConfig::from_json_str(r#"{"clamp": {"daily_multiplier": 4.0}}"#).unwrap();
        assert_eq!(config.clamp.daily_multiplier, 4.0);
        assert_eq!(config.clamp.monthly_multiplier, 2.5);
        assert_eq!(config.router, RouterConfig::default());
    }

    #[test]
    fn rejects_inverted_bands() {
        let json = r#"{"ensemble": {"strong_low": 0.5, "moderate_low": 0.3}}"#;
        assert!(matches!(
            ReconcileConfig::from_json_str(json),
            Err(ReconcileError::InvalidParameter(_))
        ));
    }

    #[test]
    fn rejects_zero_workers() {
        let json = r#"{"batch": {"max_workers": 0}}"#;
        assert!(ReconcileConfig::from_json_str(json).is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            ReconcileConfig::from_json_str("{not json"),
            Err(ReconcileError::JsonError(_))
        ));
    }
}
