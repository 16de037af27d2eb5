//! Forecast value types shared by every pipeline stage

use crate::error::{ReconcileError, Result};
use crate::granularity::GranularityClass;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default lower bound as a share of the point estimate when a model omits it
pub const DEFAULT_LOWER_RATIO: f64 = 0.8;
/// Default upper bound as a share of the point estimate when a model omits it
pub const DEFAULT_UPPER_RATIO: f64 = 1.2;
/// Number of buckets emitted by the regression model
pub const BUCKET_COUNT: usize = 3;

/// Forecast horizon in days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum Horizon {
    Days30,
    Days60,
    Days90,
}

impl Horizon {
    /// All horizons, shortest first
    pub const ALL: [Horizon; 3] = [Horizon::Days30, Horizon::Days60, Horizon::Days90];

    pub fn days(self) -> usize {
        match self {
            Horizon::Days30 => 30,
            Horizon::Days60 => 60,
            Horizon::Days90 => 90,
        }
    }

    /// Snap an arbitrary day count to the closest supported horizon
    pub fn nearest(days: usize) -> Self {
        if days <= 45 {
            Horizon::Days30
        } else if days <= 75 {
            Horizon::Days60
        } else {
            Horizon::Days90
        }
    }
}

impl TryFrom<usize> for Horizon {
    type Error = ReconcileError;

    fn try_from(days: usize) -> Result<Self> {
        match days {
            30 => Ok(Horizon::Days30),
            60 => Ok(Horizon::Days60),
            90 => Ok(Horizon::Days90),
            other => Err(ReconcileError::InvalidParameter(format!(
                "unsupported horizon {} (expected 30, 60 or 90)",
                other
            ))),
        }
    }
}

impl From<Horizon> for usize {
    fn from(h: Horizon) -> usize {
        h.days()
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.days())
    }
}

/// One dated forecast value with its interval.
///
/// Construction floors every field at zero and widens the interval so that
/// `lower_bound <= predicted_quantity <= upper_bound` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_quantity: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl ForecastPoint {
    pub fn new(date: NaiveDate, predicted: f64, lower: f64, upper: f64) -> Result<Self> {
        if !(predicted.is_finite() && lower.is_finite() && upper.is_finite()) {
            return Err(ReconcileError::ValidationError(format!(
                "non-finite forecast on {}: {} [{}, {}]",
                date, predicted, lower, upper
            )));
        }
        Ok(Self::normalized(date, predicted, lower, upper))
    }

    /// Build a point whose missing bounds default to 80%/120% of the estimate
    pub fn with_optional_bounds(
        date: NaiveDate,
        predicted: f64,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Result<Self> {
        Self::new(
            date,
            predicted,
            lower.unwrap_or(predicted * DEFAULT_LOWER_RATIO),
            upper.unwrap_or(predicted * DEFAULT_UPPER_RATIO),
        )
    }

    /// Floor at zero and order the interval around the estimate
    pub(crate) fn normalized(date: NaiveDate, predicted: f64, lower: f64, upper: f64) -> Self {
        let predicted = predicted.max(0.0);
        Self {
            date,
            predicted_quantity: predicted,
            lower_bound: lower.max(0.0).min(predicted),
            upper_bound: upper.max(predicted),
        }
    }

    /// Multiply estimate and bounds by the same non-negative ratio
    pub fn scaled(&self, ratio: f64) -> Self {
        Self {
            date: self.date,
            predicted_quantity: self.predicted_quantity * ratio,
            lower_bound: self.lower_bound * ratio,
            upper_bound: self.upper_bound * ratio,
        }
    }

    /// Whether the point satisfies the ordering and non-negativity invariant
    pub fn is_consistent(&self) -> bool {
        0.0 <= self.lower_bound
            && self.lower_bound <= self.predicted_quantity
            && self.predicted_quantity <= self.upper_bound
    }
}

/// Ordered forecast points at a single granularity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub granularity: GranularityClass,
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn new(granularity: GranularityClass, points: Vec<ForecastPoint>) -> Self {
        Self {
            granularity,
            points,
        }
    }

    /// Series with one point per day
    pub fn daily(points: Vec<ForecastPoint>) -> Self {
        Self::new(GranularityClass::Daily, points)
    }

    /// Series with one point per calendar month
    pub fn monthly(points: Vec<ForecastPoint>) -> Self {
        Self::new(GranularityClass::Monthly, points)
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sum of the point estimates
    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.predicted_quantity).sum()
    }

    /// Mean point estimate, 0.0 for an empty series
    pub fn mean(&self) -> f64 {
        let values: Vec<f64> = self.points.iter().map(|p| p.predicted_quantity).collect();
        demand_math::stats::mean_or_zero(&values)
    }

    /// Whether any point predicts a positive quantity
    pub fn has_positive(&self) -> bool {
        self.points.iter().any(|p| p.predicted_quantity > 0.0)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

/// One coarse regression-model total, not yet aligned to calendar days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub label: String,
    pub predicted_quantity: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl Bucket {
    pub fn new(label: impl Into<String>, predicted: f64, lower: f64, upper: f64) -> Result<Self> {
        let label = label.into();
        if !(predicted.is_finite() && lower.is_finite() && upper.is_finite()) {
            return Err(ReconcileError::ValidationError(format!(
                "non-finite bucket '{}': {} [{}, {}]",
                label, predicted, lower, upper
            )));
        }
        let predicted = predicted.max(0.0);
        Ok(Self {
            label,
            predicted_quantity: predicted,
            lower_bound: lower.max(0.0).min(predicted),
            upper_bound: upper.max(predicted),
        })
    }

    /// Build a bucket whose missing bounds default to 80%/120% of the estimate
    pub fn with_optional_bounds(
        label: impl Into<String>,
        predicted: f64,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Result<Self> {
        Self::new(
            label,
            predicted,
            lower.unwrap_or(predicted * DEFAULT_LOWER_RATIO),
            upper.unwrap_or(predicted * DEFAULT_UPPER_RATIO),
        )
    }
}

/// Regression-model output: exactly three ~30-day totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketedOutput {
    pub buckets: [Bucket; BUCKET_COUNT],
}

impl BucketedOutput {
    pub fn new(buckets: [Bucket; BUCKET_COUNT]) -> Self {
        Self { buckets }
    }

    /// Convenience constructor from three point estimates with default bounds
    pub fn from_totals(totals: [f64; BUCKET_COUNT]) -> Result<Self> {
        let [a, b, c] = totals;
        Ok(Self::new([
            Bucket::with_optional_bounds("1-30", a, None, None)?,
            Bucket::with_optional_bounds("31-60", b, None, None)?,
            Bucket::with_optional_bounds("61-90", c, None, None)?,
        ]))
    }

    pub fn total(&self) -> f64 {
        self.buckets.iter().map(|b| b.predicted_quantity).sum()
    }
}

impl TryFrom<Vec<Bucket>> for BucketedOutput {
    type Error = ReconcileError;

    fn try_from(buckets: Vec<Bucket>) -> Result<Self> {
        let found = buckets.len();
        let buckets: [Bucket; BUCKET_COUNT] = buckets.try_into().map_err(|_| {
            ReconcileError::ValidationError(format!(
                "expected {} buckets, found {}",
                BUCKET_COUNT, found
            ))
        })?;
        Ok(Self::new(buckets))
    }
}
