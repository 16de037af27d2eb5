//! Point-wise weighted blending of seasonal and regression series

use crate::config::EnsembleConfig;
use crate::forecast::{ForecastPoint, ForecastSeries};
use crate::router::EnsembleWeights;
use tracing::{debug, warn};

/// Weights to use for one point given the seasonal/regression ratio.
///
/// A seasonal estimate far from the regression estimate is assumed to have
/// diverged into an implausible regime and loses most of its weight.
pub fn effective_weights(
    seasonal: f64,
    regression: f64,
    base: EnsembleWeights,
    config: &EnsembleConfig,
) -> EnsembleWeights {
    if regression <= 0.0 {
        return base;
    }

    let ratio = seasonal / regression;
    if ratio < config.strong_low || ratio > config.strong_high {
        EnsembleWeights::new(
            config.strong_seasonal_weight,
            1.0 - config.strong_seasonal_weight,
        )
    } else if ratio < config.moderate_low || ratio > config.moderate_high {
        EnsembleWeights::new(
            config.moderate_seasonal_weight,
            1.0 - config.moderate_seasonal_weight,
        )
    } else {
        base
    }
}

/// Blend two daily series point by point.
///
/// Bounds use the same effective weights as the estimate and every field is
/// floored at zero. Series of different lengths are combined over their
/// common prefix only.
pub fn combine(
    seasonal: &ForecastSeries,
    regression: &ForecastSeries,
    base: EnsembleWeights,
    config: &EnsembleConfig,
) -> ForecastSeries {
    let base = EnsembleWeights::new(base.seasonal, base.regression);

    if seasonal.len() != regression.len() {
        warn!(
            seasonal_len = seasonal.len(),
            regression_len = regression.len(),
            "ensemble inputs differ in length, truncating to the shorter series"
        );
    }

    let points = seasonal
        .points
        .iter()
        .zip(&regression.points)
        .enumerate()
        .map(|(i, (a, b))| {
            let w = effective_weights(a.predicted_quantity, b.predicted_quantity, base, config);
            if w != base {
                debug!(
                    point = i,
                    seasonal = a.predicted_quantity,
                    regression = b.predicted_quantity,
                    seasonal_weight = w.seasonal,
                    "seasonal estimate diverged, re-weighting"
                );
            }
            ForecastPoint::normalized(
                a.date,
                a.predicted_quantity * w.seasonal + b.predicted_quantity * w.regression,
                a.lower_bound * w.seasonal + b.lower_bound * w.regression,
                a.upper_bound * w.seasonal + b.upper_bound * w.regression,
            )
        })
        .collect();

    ForecastSeries::daily(points)
}
