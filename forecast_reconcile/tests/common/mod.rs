#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use forecast_reconcile::{
    AccuracyMetric, BucketedOutput, ForecastPoint, ForecastSeries, ModelOutput, ModelRun,
    ObservationSeries,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Last day of the month `offset` months after `year-month`
pub fn month_end(year: i32, month: u32, offset: u32) -> NaiveDate {
    let index = (month - 1) + offset + 1;
    let (y, m) = (year + (index / 12) as i32, index % 12 + 1);
    date(y, m, 1) - Days::new(1)
}

/// Twenty month-end observations from January 2023 following a yearly
/// cycle between 100 and 240
pub fn seasonal_monthly_history() -> ObservationSeries {
    ObservationSeries::from_pairs(
        (0..20).map(|i| (month_end(2023, 1, i), 100.0 + 140.0 * (i % 12) as f64 / 11.0)),
    )
    .unwrap()
}

pub fn daily_history(start: NaiveDate, values: &[f64]) -> ObservationSeries {
    ObservationSeries::from_pairs(
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (start + Days::new(i as u64), *v)),
    )
    .unwrap()
}

pub fn bucket_run(totals: [f64; 3], mape: Option<f64>) -> ModelRun {
    ModelRun::new(
        ModelOutput::Bucketed(BucketedOutput::from_totals(totals).unwrap()),
        AccuracyMetric::new(mape, mape.map(|m| m / 10.0)),
    )
}

/// Seasonal output of `days` daily points starting the day after `last`
pub fn dense_run(last: NaiveDate, days: u64, value: f64, mape: Option<f64>) -> ModelRun {
    let points = (1..=days)
        .map(|i| ForecastPoint::new(last + Days::new(i), value, value * 0.9, value * 1.1).unwrap())
        .collect();
    ModelRun::new(
        ModelOutput::Dense(ForecastSeries::daily(points)),
        AccuracyMetric::new(mape, None),
    )
}
