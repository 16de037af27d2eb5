//! Backtest accuracy scoring
//!
//! Scores a holdout window of actual quantities against what a model
//! predicted for the same periods.

use crate::stats::round_to;
use serde::{Deserialize, Serialize};

/// Minimum number of aligned points needed to score a backtest
pub const MIN_BACKTEST_POINTS: usize = 2;

/// Qualitative accuracy band derived from MAPE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyLevel {
    /// MAPE below 20%
    Excellent,
    /// MAPE below 50%
    Good,
    /// MAPE of 50% or more
    NeedsImprovement,
    /// Fewer than two aligned points
    InsufficientData,
    /// No actual value above zero, so MAPE is undefined
    ContainsZeros,
}

impl AccuracyLevel {
    /// Band for a MAPE expressed in percent
    pub fn from_mape(mape: f64) -> Self {
        if mape < 20.0 {
            AccuracyLevel::Excellent
        } else if mape < 50.0 {
            AccuracyLevel::Good
        } else {
            AccuracyLevel::NeedsImprovement
        }
    }
}

/// Result of scoring one backtest window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    /// Mean absolute percentage error in percent, `None` when undefined
    pub mape: Option<f64>,
    /// Mean absolute error, `None` when undefined
    pub mae: Option<f64>,
    /// Qualitative band
    pub level: AccuracyLevel,
    /// Number of aligned points that were scored
    pub sample_size: usize,
}

/// Score predicted values against actual values.
///
/// Only the overlapping prefix of the two slices is scored. MAPE is computed
/// over periods whose actual value is positive and reported in percent;
/// both metrics are rounded to two decimals.
pub fn score_backtest(actual: &[f64], predicted: &[f64]) -> AccuracyReport {
    let n = actual.len().min(predicted.len());
    if n < MIN_BACKTEST_POINTS {
        return AccuracyReport {
            mape: None,
            mae: None,
            level: AccuracyLevel::InsufficientData,
            sample_size: n,
        };
    }

    let pairs = actual[..n].iter().zip(&predicted[..n]);
    let mae = pairs.clone().map(|(a, p)| (a - p).abs()).sum::<f64>() / n as f64;

    let positive: Vec<f64> = pairs
        .filter(|(a, _)| **a > 0.0)
        .map(|(a, p)| (a - p).abs() / a)
        .collect();

    if positive.is_empty() {
        return AccuracyReport {
            mape: None,
            mae: Some(round_to(mae, 2)),
            level: AccuracyLevel::ContainsZeros,
            sample_size: n,
        };
    }

    let mape = positive.iter().sum::<f64>() / positive.len() as f64 * 100.0;

    AccuracyReport {
        mape: Some(round_to(mape, 2)),
        mae: Some(round_to(mae, 2)),
        level: AccuracyLevel::from_mape(mape),
        sample_size: n,
    }
}
