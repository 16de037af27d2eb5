//! Interfaces to the two external forecasting models
//!
//! Training and fitting happen elsewhere; the engine only sees each model's
//! native prediction output and its backtested accuracy.

use crate::data::ObservationSeries;
use crate::error::{ReconcileError, Result};
use crate::expand::expand_buckets;
use crate::forecast::{BucketedOutput, ForecastSeries, Horizon};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Which of the two forecasting models produced an output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Seasonal decomposition model ("Model A"), emits daily points
    Seasonal,
    /// Gradient-boosted regression model ("Model B"), emits three buckets
    Regression,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Seasonal => write!(f, "seasonal"),
            ModelKind::Regression => write!(f, "regression"),
        }
    }
}

/// Backtested accuracy of one model for one entity.
///
/// `None` means the backtest could not run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetric {
    pub mape: Option<f64>,
    pub mae: Option<f64>,
}

impl AccuracyMetric {
    pub fn new(mape: Option<f64>, mae: Option<f64>) -> Self {
        Self {
            mape: mape.filter(|v| v.is_finite()),
            mae: mae.filter(|v| v.is_finite()),
        }
    }

    /// Accuracy of a model whose backtest could not run
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Score a holdout window of actual against predicted quantities
    pub fn from_backtest(actual: &[f64], predicted: &[f64]) -> Self {
        let report = demand_math::score_backtest(actual, predicted);
        Self::new(report.mape, report.mae)
    }
}

/// A model's native prediction shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ModelOutput {
    /// One point per day
    Dense(ForecastSeries),
    /// Exactly three coarse totals
    Bucketed(BucketedOutput),
}

impl ModelOutput {
    /// Normalize onto the daily timeline that starts the day after `last_date`.
    ///
    /// Dense output keeps the points dated within `horizon` days after
    /// `last_date`; bucketed output is spread uniformly across its buckets.
    pub fn to_daily(&self, last_date: NaiveDate, horizon: Horizon) -> ForecastSeries {
        match self {
            ModelOutput::Dense(series) => {
                let end = last_date
                    .checked_add_days(Days::new(horizon.days() as u64))
                    .unwrap_or(NaiveDate::MAX);
                ForecastSeries::daily(
                    series
                        .points
                        .iter()
                        .filter(|p| p.date > last_date && p.date <= end)
                        .take(horizon.days())
                        .copied()
                        .collect(),
                )
            }
            ModelOutput::Bucketed(buckets) => expand_buckets(buckets, last_date, horizon),
        }
    }
}

/// Output and accuracy of one model run for one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRun {
    pub output: ModelOutput,
    pub accuracy: AccuracyMetric,
}

impl ModelRun {
    pub fn new(output: ModelOutput, accuracy: AccuracyMetric) -> Self {
        Self { output, accuracy }
    }
}

/// A pre-fit forecasting model that can be invoked per entity
pub trait ForecastModel: Send + Sync {
    /// Which model this is
    fn kind(&self) -> ModelKind;

    /// Name of the model
    fn name(&self) -> &str;

    /// Produce the model's native output for an entity
    fn predict(&self, entity_id: &str, history: &ObservationSeries) -> Result<ModelRun>;
}

/// A model whose outputs were computed ahead of time, keyed by entity id
#[derive(Debug, Clone)]
pub struct PrecomputedModel {
    kind: ModelKind,
    name: String,
    runs: HashMap<String, ModelRun>,
}

impl PrecomputedModel {
    pub fn new(kind: ModelKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            runs: HashMap::new(),
        }
    }

    /// Register the output for one entity
    pub fn insert(&mut self, entity_id: impl Into<String>, run: ModelRun) {
        self.runs.insert(entity_id.into(), run);
    }

    pub fn with_run(mut self, entity_id: impl Into<String>, run: ModelRun) -> Self {
        self.insert(entity_id, run);
        self
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

impl ForecastModel for PrecomputedModel {
    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, entity_id: &str, _history: &ObservationSeries) -> Result<ModelRun> {
        self.runs.get(entity_id).cloned().ok_or_else(|| {
            ReconcileError::model_failure(
                self.name.clone(),
                format!("no output for entity '{}'", entity_id),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::ForecastPoint;
    use chrono::Days;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    }

    #[test]
    fn dense_output_is_trimmed_to_future_horizon() {
        // In-sample fitted values precede the last observation and are dropped
        let points: Vec<ForecastPoint> = (0..120)
            .map(|i| {
                ForecastPoint::new(start() - Days::new(10) + Days::new(i), i as f64, 0.0, 200.0)
                    .unwrap()
            })
            .collect();
        let output = ModelOutput::Dense(ForecastSeries::daily(points));

        let daily = output.to_daily(start(), Horizon::Days30);
        assert_eq!(daily.len(), 30);
        assert_eq!(daily.first_date(), Some(start() + Days::new(1)));
        assert_eq!(daily.points[0].predicted_quantity, 11.0);
    }

    #[test]
    fn bucketed_output_is_expanded() {
        let output =
            ModelOutput::Bucketed(BucketedOutput::from_totals([30.0, 60.0, 90.0]).unwrap());
        let daily = output.to_daily(start(), Horizon::Days90);
        assert_eq!(daily.len(), 90);
        assert_eq!(daily.points[89].predicted_quantity, 3.0);
    }

    #[test]
    fn precomputed_model_reports_missing_entities() {
        let run = ModelRun::new(
            ModelOutput::Bucketed(BucketedOutput::from_totals([1.0, 2.0, 3.0]).unwrap()),
            AccuracyMetric::new(Some(12.0), Some(1.5)),
        );
        let model = PrecomputedModel::new(ModelKind::Regression, "gbm").with_run("sku-1", run);

        let history = ObservationSeries::default();
        assert!(model.predict("sku-1", &history).is_ok());
        assert!(matches!(
            model.predict("sku-2", &history),
            Err(ReconcileError::ExternalModelFailure { .. })
        ));
    }

    #[test]
    fn accuracy_from_backtest() {
        let metric = AccuracyMetric::from_backtest(&[10.0, 20.0], &[11.0, 18.0]);
        assert_eq!(metric.mape, Some(10.0));
        assert_eq!(metric.mae, Some(1.5));
        assert_eq!(AccuracyMetric::from_backtest(&[1.0], &[1.0]), AccuracyMetric::unknown());
    }
}
