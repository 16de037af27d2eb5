//! # Demand Forecast Workspace
//!
//! Umbrella crate for the demand forecast reconciliation workspace.
//!
//! - [`forecast_reconcile`]: the reconciliation engine, batch runner and loaders
//! - [`demand_math`]: summary statistics and backtest accuracy scoring
//!
//! ## Example
//!
//! ```
//! use demand_forecast_workspace::forecast_reconcile::{Horizon, RoutingContext, Source};
//! use demand_forecast_workspace::forecast_reconcile::config::RouterConfig;
//! use demand_forecast_workspace::forecast_reconcile::route;
//!
//! let config = RouterConfig::default();
//! let context = RoutingContext::Forecast;
//! let decision = route(Some(200.0), Some(20.0), Horizon::Days30, context, &config);
//! assert_eq!(decision.source, Source::Regression);
//! assert_eq!(decision.confidence, 0.95);
//! ```

pub use demand_math;
pub use forecast_reconcile;

/// Accuracy of a model given aligned actual and predicted quantities
pub fn backtest_accuracy(actual: &[f64], predicted: &[f64]) -> forecast_reconcile::AccuracyMetric {
    forecast_reconcile::AccuracyMetric::from_backtest(actual, predicted)
}
