//! Historical observations and CSV loading
//!
//! The engine only ever reads history; an [`ObservationSeries`] is validated
//! once on construction and immutable afterwards.

use crate::error::{ReconcileError, Result};
use crate::forecast::{Bucket, BucketedOutput, ForecastPoint, ForecastSeries};
use crate::models::AccuracyMetric;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Category assigned to entities that do not declare one
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// A single dated quantity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

/// Ordered history of one entity.
///
/// Dates are strictly increasing and values are finite and non-negative.
/// Cadence may be irregular.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObservationSeries {
    observations: Vec<Observation>,
}

impl ObservationSeries {
    /// Create a validated series
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        for (i, obs) in observations.iter().enumerate() {
            if !obs.value.is_finite() || obs.value < 0.0 {
                return Err(ReconcileError::ValidationError(format!(
                    "observation {} on {} has invalid value {}",
                    i, obs.date, obs.value
                )));
            }
        }

        if let Some(pair) = observations.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(ReconcileError::ValidationError(format!(
                "observation dates must be strictly increasing ({} is followed by {})",
                pair[0].date, pair[1].date
            )));
        }

        Ok(Self { observations })
    }

    /// Create a series from `(date, value)` pairs
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(date, value)| Observation { date, value })
                .collect(),
        )
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Observed values in date order
    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }

    /// Days between the first and last observation
    pub fn span_days(&self) -> i64 {
        match (self.first_date(), self.last_date()) {
            (Some(first), Some(last)) => (last - first).num_days(),
            _ => 0,
        }
    }

    /// Average gap between consecutive observations, `span / (n - 1)`.
    ///
    /// `None` for series with fewer than two observations.
    pub fn average_gap_days(&self) -> Option<f64> {
        if self.len() < 2 {
            return None;
        }
        Some(self.span_days() as f64 / (self.len() - 1) as f64)
    }

    /// Largest observed value
    pub fn max_value(&self) -> Option<f64> {
        self.observations.iter().map(|o| o.value).reduce(f64::max)
    }

    /// Totals per calendar month, keyed by `(year, month)`
    pub fn monthly_totals(&self) -> BTreeMap<(i32, u32), f64> {
        let mut totals = BTreeMap::new();
        for obs in &self.observations {
            *totals.entry((obs.date.year(), obs.date.month())).or_insert(0.0) += obs.value;
        }
        totals
    }

    /// The last `n` observations (or all of them)
    pub fn tail(&self, n: usize) -> &[Observation] {
        let start = self.observations.len().saturating_sub(n);
        &self.observations[start..]
    }

    /// Mean of the last `window` observations, 0.0 for an empty series
    pub fn trailing_mean(&self, window: usize) -> f64 {
        let values: Vec<f64> = self.tail(window).iter().map(|o| o.value).collect();
        demand_math::stats::mean_or_zero(&values)
    }
}

/// History of one entity together with its reporting category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityHistory {
    pub entity_id: String,
    pub category: String,
    pub series: ObservationSeries,
}

#[derive(Debug, Deserialize)]
struct HistoryRecord {
    entity_id: String,
    date: NaiveDate,
    quantity: f64,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailyForecastRecord {
    entity_id: String,
    date: NaiveDate,
    predicted_quantity: f64,
    #[serde(default)]
    lower_bound: Option<f64>,
    #[serde(default)]
    upper_bound: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct BucketRecord {
    entity_id: String,
    bucket: String,
    predicted_quantity: f64,
    #[serde(default)]
    lower_bound: Option<f64>,
    #[serde(default)]
    upper_bound: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AccuracyRecord {
    entity_id: String,
    model: String,
    #[serde(default)]
    mape: Option<f64>,
    #[serde(default)]
    mae: Option<f64>,
}

/// Backtested accuracy of both models for one entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityAccuracy {
    pub seasonal: AccuracyMetric,
    pub regression: AccuracyMetric,
}

/// Loader for the CSV tables exchanged with the model-training layer
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load histories from a CSV with columns `entity_id,date,quantity[,category]`.
    ///
    /// Rows may arrive in any order; quantities reported twice for the same
    /// entity and date are summed.
    pub fn histories_from_csv<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, EntityHistory>> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut rows: BTreeMap<String, (Option<String>, BTreeMap<NaiveDate, f64>)> =
            BTreeMap::new();

        for record in reader.deserialize() {
            let record: HistoryRecord = record?;
            let entry = rows.entry(record.entity_id).or_default();
            if entry.0.is_none() {
                entry.0 = record.category.filter(|c| !c.trim().is_empty());
            }
            *entry.1.entry(record.date).or_insert(0.0) += record.quantity;
        }

        rows.into_iter()
            .map(|(entity_id, (category, by_date))| {
                let series = ObservationSeries::from_pairs(by_date).map_err(|e| {
                    ReconcileError::DataError(format!("history of '{}': {}", entity_id, e))
                })?;
                let history = EntityHistory {
                    entity_id: entity_id.clone(),
                    category: category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
                    series,
                };
                Ok((entity_id, history))
            })
            .collect()
    }

    /// Load dense seasonal-model output with columns
    /// `entity_id,date,predicted_quantity,lower_bound,upper_bound`
    pub fn daily_forecasts_from_csv<P: AsRef<Path>>(
        path: P,
    ) -> Result<BTreeMap<String, ForecastSeries>> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut points: BTreeMap<String, Vec<ForecastPoint>> = BTreeMap::new();

        for record in reader.deserialize() {
            let record: DailyForecastRecord = record?;
            let point = ForecastPoint::with_optional_bounds(
                record.date,
                record.predicted_quantity,
                record.lower_bound,
                record.upper_bound,
            )?;
            points.entry(record.entity_id).or_default().push(point);
        }

        Ok(points
            .into_iter()
            .map(|(entity_id, mut pts)| {
                pts.sort_by_key(|p| p.date);
                (entity_id, ForecastSeries::daily(pts))
            })
            .collect())
    }

    /// Load bucketed regression-model output with columns
    /// `entity_id,bucket,predicted_quantity,lower_bound,upper_bound`.
    ///
    /// Buckets are taken in file order and each entity must have exactly three.
    pub fn bucketed_forecasts_from_csv<P: AsRef<Path>>(
        path: P,
    ) -> Result<BTreeMap<String, BucketedOutput>> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut buckets: BTreeMap<String, Vec<Bucket>> = BTreeMap::new();

        for record in reader.deserialize() {
            let record: BucketRecord = record?;
            let bucket = Bucket::with_optional_bounds(
                record.bucket,
                record.predicted_quantity,
                record.lower_bound,
                record.upper_bound,
            )?;
            buckets.entry(record.entity_id).or_default().push(bucket);
        }

        buckets
            .into_iter()
            .map(|(entity_id, b)| {
                let output = BucketedOutput::try_from(b).map_err(|e| {
                    ReconcileError::DataError(format!("buckets of '{}': {}", entity_id, e))
                })?;
                Ok((entity_id, output))
            })
            .collect()
    }

    /// Load backtest accuracy with columns `entity_id,model,mape,mae`.
    ///
    /// `model` is `seasonal` or `regression`; blank metrics mean the backtest
    /// could not run.
    pub fn accuracy_from_csv<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, EntityAccuracy>> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut accuracy: BTreeMap<String, EntityAccuracy> = BTreeMap::new();

        for record in reader.deserialize() {
            let record: AccuracyRecord = record?;
            let metric = AccuracyMetric::new(record.mape, record.mae);
            let entry = accuracy.entry(record.entity_id).or_default();
            match record.model.trim().to_lowercase().as_str() {
                "seasonal" => entry.seasonal = metric,
                "regression" => entry.regression = metric,
                other => {
                    return Err(ReconcileError::DataError(format!(
                        "unknown model '{}' in accuracy table",
                        other
                    )))
                }
            }
        }

        Ok(accuracy)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::Days;

    /// Last day of the month `offset` months after `year-month`
    pub fn month_end(year: i32, month: u32, offset: u32) -> NaiveDate {
        let index = (month - 1) + offset + 1;
        let (y, m) = (year + (index / 12) as i32, index % 12 + 1);
        NaiveDate::from_ymd_opt(y, m, 1).unwrap() - Days::new(1)
    }

    pub fn monthly_series(year: i32, month: u32, values: &[f64]) -> ObservationSeries {
        ObservationSeries::from_pairs(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (month_end(year, month, i as u32), *v)),
        )
        .unwrap()
    }

    pub fn daily_series(year: i32, month: u32, day: u32, values: &[f64]) -> ObservationSeries {
        let start = NaiveDate::from_ymd_opt(year, month, day).unwrap();
        ObservationSeries::from_pairs(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (start + Days::new(i as u64), *v)),
        )
        .unwrap()
    }
}
