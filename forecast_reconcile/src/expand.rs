//! Expansion of bucketed regression output onto a daily timeline

use crate::forecast::{BucketedOutput, ForecastPoint, ForecastSeries, Horizon, BUCKET_COUNT};
use chrono::{Days, NaiveDate};

/// Days represented by each regression bucket
pub const DAYS_PER_BUCKET: usize = 30;

/// Spread three bucket totals uniformly over `horizon` days.
///
/// Day `i` (starting the day after `last_date`) takes `1/30` of bucket
/// `min(i / 30, 2)`. Intra-bucket trend is not modelled, so the result is a
/// coarse approximation fit for clamping and aggregation only.
pub fn expand_buckets(
    output: &BucketedOutput,
    last_date: NaiveDate,
    horizon: Horizon,
) -> ForecastSeries {
    let divisor = DAYS_PER_BUCKET as f64;
    let points = (0..horizon.days())
        .map(|i| {
            let bucket = &output.buckets[(i / DAYS_PER_BUCKET).min(BUCKET_COUNT - 1)];
            ForecastPoint::normalized(
                last_date + Days::new(i as u64 + 1),
                bucket.predicted_quantity / divisor,
                bucket.lower_bound / divisor,
                bucket.upper_bound / divisor,
            )
        })
        .collect();

    ForecastSeries::daily(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn last_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
    }

    #[test]
    fn expands_sixty_days_from_two_buckets() {
        let output = BucketedOutput::from_totals([90.0, 60.0, 30.0]).unwrap();
        let daily = expand_buckets(&output, last_date(), Horizon::Days60);

        assert_eq!(daily.len(), 60);
        assert!(daily.points[..30].iter().all(|p| p.predicted_quantity == 3.0));
        assert!(daily.points[30..].iter().all(|p| p.predicted_quantity == 2.0));
        assert_eq!(daily.first_date(), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(daily.last_date(), NaiveDate::from_ymd_opt(2024, 4, 29));
    }

    #[test]
    fn bounds_are_divided_too() {
        let output = BucketedOutput::from_totals([90.0, 60.0, 30.0]).unwrap();
        let daily = expand_buckets(&output, last_date(), Horizon::Days30);
        assert_relative_eq!(daily.points[0].lower_bound, 2.4);
        assert_relative_eq!(daily.points[0].upper_bound, 3.6);
        assert!(daily.points.iter().all(|p| p.is_consistent()));
    }

    #[test]
    fn ninety_days_preserve_bucket_totals() {
        let output = BucketedOutput::from_totals([300.0, 330.0, 360.0]).unwrap();
        let daily = expand_buckets(&output, last_date(), Horizon::Days90);
        assert_eq!(daily.len(), 90);
        assert_relative_eq!(daily.total(), 990.0, epsilon = 1e-9);
    }
}
