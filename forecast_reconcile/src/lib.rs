//! # Forecast Reconcile
//!
//! Reconciles the output of two demand forecasting models into a single
//! trusted forecast per entity and horizon.
//!
//! ## Features
//!
//! - Seasonal model gating on history volume and cadence
//! - Expansion of three-bucket regression output onto a daily timeline
//! - Accuracy-based routing between the seasonal model, the regression model or a weighted ensemble
//! - Plausibility caps on daily and monthly values
//! - Monthly roll-up for entities whose history is recorded monthly
//! - A zero-floor check against degenerate near-zero forecasts
//! - Parallel batch processing with per-entity failure isolation
//!
//! ## Pipeline
//!
//! For each entity and each horizon (30, 60 or 90 days):
//!
//! 1. [`adequacy`] decides whether the seasonal model may be used at all
//! 2. [`expand`] spreads regression buckets over calendar days
//! 3. [`router`] picks a source from backtested MAPE
//! 4. [`ensemble`] blends both series when the router asks for it
//! 5. [`clamp`] caps daily values
//! 6. [`aggregate`] and [`clamp`] roll up and cap monthly values for monthly history
//! 7. [`validate`] swaps in the alternate source if the result is degenerate
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Days, NaiveDate};
//! use forecast_reconcile::{
//!     AccuracyMetric, BucketedOutput, EntityForecastInput, Horizon, ModelOutput, ModelRun,
//!     ObservationSeries, Reconciler, Source,
//! };
//!
//! # fn main() -> forecast_reconcile::Result<()> {
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let history = ObservationSeries::from_pairs((0..120).map(|i| (start + Days::new(i), 10.0)))?;
//!
//! let regression = ModelRun::new(
//!     ModelOutput::Bucketed(BucketedOutput::from_totals([300.0, 330.0, 360.0])?),
//!     AccuracyMetric::new(Some(18.0), None),
//! );
//! let input = EntityForecastInput::new("sku-42", "Snacks", history).with_regression(regression);
//!
//! let result = Reconciler::default().reconcile_entity(&input)?;
//! let thirty = result.forecast(Horizon::Days30).unwrap();
//! assert_eq!(thirty.decision.source, Source::Regression);
//! assert_eq!(thirty.series.len(), 30);
//! # Ok(())
//! # }
//! ```

pub mod adequacy;
pub mod aggregate;
pub mod batch;
pub mod category;
pub mod clamp;
pub mod config;
pub mod data;
pub mod demand;
pub mod ensemble;
pub mod error;
pub mod expand;
pub mod forecast;
pub mod granularity;
pub mod models;
pub mod pipeline;
pub mod router;
pub mod validate;

// Re-export commonly used types
pub use crate::adequacy::{AdequacyDecision, DataAdequacyClassifier};
pub use crate::batch::{BatchReconciler, BatchSummary, SkippedEntity};
pub use crate::category::{rollup_categories, CategoryReconciliation};
pub use crate::clamp::PlausibilityGuard;
pub use crate::config::ReconcileConfig;
pub use crate::data::{DataLoader, EntityHistory, ObservationSeries};
pub use crate::error::{ReconcileError, Result};
pub use crate::forecast::{Bucket, BucketedOutput, ForecastPoint, ForecastSeries, Horizon};
pub use crate::granularity::{FrequencyClass, GranularityClass};
pub use crate::models::{
    AccuracyMetric, ForecastModel, ModelKind, ModelOutput, ModelRun, PrecomputedModel,
};
pub use crate::pipeline::{
    EntityForecastInput, EntityReconciliation, ReconciledForecast, Reconciler, UnavailableHorizon,
};
pub use crate::router::{route, RoutingContext, RoutingDecision, Source};
pub use crate::validate::ZeroFloorValidator;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
