//! Accuracy-based source selection
//!
//! Routing is a pure function of the two models' backtested MAPE, the
//! horizon and the usage context. Decisions are recomputed on every call
//! because MAPE changes between runs.
//!
//! The regression model leans on recent lags and is trusted most at short
//! horizons. The seasonal model earns weight as the horizon grows, but only
//! inside a blend: standalone seasonal output is frequently degenerate on
//! sparse history.

use crate::config::RouterConfig;
use crate::forecast::Horizon;
use crate::models::{AccuracyMetric, ModelKind};
use demand_math::stats::round_to;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the routed forecast will be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingContext {
    /// Regular demand forecast
    #[default]
    Forecast,
    /// Restocking or discount decisions that need the most accurate model
    UrgentAction,
    /// Seasonality inspection, which only the seasonal model supports
    SeasonalityOnly,
}

/// Source chosen for an entity and horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Seasonal decomposition model alone
    Seasonal,
    /// Regression model alone
    Regression,
    /// Weighted blend of both
    Ensemble,
}

impl From<ModelKind> for Source {
    fn from(kind: ModelKind) -> Self {
        match kind {
            ModelKind::Seasonal => Source::Seasonal,
            ModelKind::Regression => Source::Regression,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Seasonal => write!(f, "seasonal"),
            Source::Regression => write!(f, "regression"),
            Source::Ensemble => write!(f, "ensemble"),
        }
    }
}

/// Base blend weights, always normalized to sum to one
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleWeights {
    pub seasonal: f64,
    pub regression: f64,
}

impl EnsembleWeights {
    /// Normalize a weight pair; a degenerate pair falls back to an even split
    pub fn new(seasonal: f64, regression: f64) -> Self {
        let seasonal = seasonal.max(0.0);
        let regression = regression.max(0.0);
        let total = seasonal + regression;
        if !total.is_finite() || total <= 0.0 {
            return Self::even();
        }
        Self {
            seasonal: seasonal / total,
            regression: regression / total,
        }
    }

    pub fn even() -> Self {
        Self {
            seasonal: 0.5,
            regression: 0.5,
        }
    }
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self::even()
    }
}

/// Routing outcome for one entity and horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub source: Source,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    /// Human-readable justification
    pub reason: String,
    /// Present only for ensemble decisions
    pub weights: Option<EnsembleWeights>,
}

impl RoutingDecision {
    fn single(source: Source, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            source,
            confidence,
            reason: reason.into(),
            weights: None,
        }
    }

    fn ensemble(
        confidence: f64,
        reason: impl Into<String>,
        seasonal: f64,
        regression: f64,
    ) -> Self {
        Self {
            source: Source::Ensemble,
            confidence,
            reason: reason.into(),
            weights: Some(EnsembleWeights::new(seasonal, regression)),
        }
    }

    /// Decision used when only one model produced output
    pub fn only_available(kind: ModelKind) -> Self {
        match kind {
            ModelKind::Seasonal => Self::single(
                Source::Seasonal,
                0.6,
                "only the seasonal model produced output",
            ),
            ModelKind::Regression => Self::single(
                Source::Regression,
                0.8,
                "only the regression model produced output",
            ),
        }
    }
}

/// Choose a source from the two models' MAPE (percent; `None` = unknown)
pub fn route(
    seasonal_mape: Option<f64>,
    regression_mape: Option<f64>,
    horizon: Horizon,
    context: RoutingContext,
    config: &RouterConfig,
) -> RoutingDecision {
    if context == RoutingContext::SeasonalityOnly {
        return RoutingDecision::single(
            Source::Seasonal,
            0.90,
            "seasonal model is the only source with explicit seasonal decomposition",
        );
    }

    let (seasonal, regression) = match (seasonal_mape, regression_mape) {
        (None, None) => {
            return RoutingDecision::single(
                Source::Regression,
                0.5,
                "no backtest accuracy for either model, defaulting to regression",
            )
        }
        (None, Some(_)) => {
            return RoutingDecision::single(
                Source::Regression,
                0.8,
                "only regression accuracy available",
            )
        }
        (Some(_), None) => {
            return RoutingDecision::single(
                Source::Seasonal,
                0.6,
                "only seasonal accuracy available",
            )
        }
        (Some(a), Some(b)) => (a, b),
    };

    match context {
        RoutingContext::UrgentAction => route_for_action(seasonal, regression, config),
        _ => route_for_forecast(seasonal, regression, horizon, config),
    }
}

fn route_for_forecast(
    seasonal: f64,
    regression: f64,
    horizon: Horizon,
    config: &RouterConfig,
) -> RoutingDecision {
    let regression_good = regression < config.regression_good_mape;
    let seasonal_usable = seasonal < config.seasonal_unusable_mape;

    if regression_good && regression < seasonal * config.superiority_ratio {
        let improvement = if regression > 0.0 { seasonal / regression } else { f64::INFINITY };
        return match horizon {
            Horizon::Days30 => RoutingDecision::single(
                Source::Regression,
                0.95,
                format!("regression {:.0}x more accurate (short horizon)", improvement),
            ),
            Horizon::Days60 => RoutingDecision::ensemble(
                0.85,
                format!(
                    "regression {:.0}x more accurate, blended for the medium horizon",
                    improvement
                ),
                0.3,
                0.7,
            ),
            Horizon::Days90 => RoutingDecision::ensemble(
                0.75,
                "accurate regression blended with seasonal structure",
                0.5,
                0.5,
            ),
        };
    }

    match horizon {
        Horizon::Days30 if regression_good => RoutingDecision::single(
            Source::Regression,
            0.85,
            "recent lags dominate at short horizons",
        ),
        Horizon::Days30 => RoutingDecision::single(
            Source::Regression,
            0.65,
            format!("regression for the short horizon (MAPE {:.1}%)", regression),
        ),
        Horizon::Days90 if seasonal_usable => RoutingDecision::ensemble(
            0.75,
            "seasonality matters at long horizons",
            0.5,
            0.5,
        ),
        Horizon::Days90 => RoutingDecision::single(
            Source::Regression,
            0.70,
            format!("seasonal model unusable (MAPE {:.1}%), using regression", seasonal),
        ),
        Horizon::Days60 if regression_good && seasonal_usable => RoutingDecision::ensemble(
            0.80,
            "balancing recent lags and seasonality",
            0.3,
            0.7,
        ),
        Horizon::Days60 if regression_good => RoutingDecision::single(
            Source::Regression,
            0.75,
            "regression reliable, seasonal model unusable",
        ),
        Horizon::Days60 => RoutingDecision::single(
            Source::Regression,
            0.65,
            format!("regression for the medium horizon (MAPE {:.1}%)", regression),
        ),
    }
}

fn route_for_action(seasonal: f64, regression: f64, config: &RouterConfig) -> RoutingDecision {
    if regression < config.regression_good_mape {
        RoutingDecision::single(
            Source::Regression,
            0.95,
            "urgent decisions need the most accurate short-term model",
        )
    } else {
        lowest_mape(seasonal, regression)
    }
}

fn lowest_mape(seasonal: f64, regression: f64) -> RoutingDecision {
    if regression < seasonal {
        RoutingDecision::single(
            Source::Regression,
            0.80,
            format!("lowest MAPE: regression {:.1}%", regression),
        )
    } else {
        RoutingDecision::single(
            Source::Seasonal,
            0.75,
            format!("lowest MAPE: seasonal {:.1}%", seasonal),
        )
    }
}

/// Accuracy to report for a decision.
///
/// A single source reports its own metrics; an ensemble reports the
/// weight-blended MAPE (two decimals) and no MAE.
pub fn effective_accuracy(
    decision: &RoutingDecision,
    seasonal: &AccuracyMetric,
    regression: &AccuracyMetric,
) -> AccuracyMetric {
    match decision.source {
        Source::Seasonal => *seasonal,
        Source::Regression => *regression,
        Source::Ensemble => {
            let weights = decision.weights.unwrap_or_default();
            match (seasonal.mape, regression.mape) {
                (Some(a), Some(b)) => AccuracyMetric::new(
                    Some(round_to(a * weights.seasonal + b * weights.regression, 2)),
                    None,
                ),
                _ => *regression,
            }
        }
    }
}
