//! Daily to monthly roll-up

use crate::forecast::{ForecastPoint, ForecastSeries};
use chrono::{Datelike, Days, NaiveDate};
use std::collections::BTreeMap;

/// Last calendar day of the month containing `date`
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_sub_days(Days::new(1)))
        .unwrap_or(date)
}

/// Collapse a daily series into one point per calendar month.
///
/// Each monthly point is dated at the month's last day and carries the sums
/// of the contributing daily estimates and bounds. Months with no daily
/// points are left out.
pub fn aggregate_monthly(series: &ForecastSeries) -> ForecastSeries {
    let mut months: BTreeMap<(i32, u32), (f64, f64, f64, NaiveDate)> = BTreeMap::new();

    for p in &series.points {
        let entry = months
            .entry((p.date.year(), p.date.month()))
            .or_insert((0.0, 0.0, 0.0, month_end(p.date)));
        entry.0 += p.predicted_quantity;
        entry.1 += p.lower_bound;
        entry.2 += p.upper_bound;
    }

    let points = months
        .into_values()
        .map(|(predicted, lower, upper, date)| {
            ForecastPoint::normalized(date, predicted, lower, upper)
        })
        .collect();

    ForecastSeries::monthly(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::granularity::GranularityClass;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily_from(start: NaiveDate, values: &[f64]) -> ForecastSeries {
        ForecastSeries::daily(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    ForecastPoint::new(start + Days::new(i as u64), *v, v * 0.5, v * 2.0).unwrap()
                })
                .collect(),
        )
    }

    #[test]
    fn test_month_end() {
        assert_eq!(month_end(date(2024, 2, 10)), date(2024, 2, 29));
        assert_eq!(month_end(date(2023, 12, 1)), date(2023, 12, 31));
        assert_eq!(month_end(date(2023, 4, 30)), date(2023, 4, 30));
    }

    #[test]
    fn sums_per_calendar_month() {
        // Jan 30 .. Feb 2
        let series = daily_from(date(2024, 1, 30), &[1.0, 2.0, 3.0, 4.0]);
        let monthly = aggregate_monthly(&series);

        assert_eq!(monthly.granularity, GranularityClass::Monthly);
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly.points[0].date, date(2024, 1, 31));
        assert_relative_eq!(monthly.points[0].predicted_quantity, 3.0);
        assert_relative_eq!(monthly.points[0].lower_bound, 1.5);
        assert_relative_eq!(monthly.points[0].upper_bound, 6.0);
        assert_eq!(monthly.points[1].date, date(2024, 2, 29));
        assert_relative_eq!(monthly.points[1].predicted_quantity, 7.0);
    }

    #[test]
    fn preserves_total_volume() {
        let values: Vec<f64> = (0..90).map(|i| (i % 7) as f64 * 1.5).collect();
        let series = daily_from(date(2024, 9, 1), &values);
        let monthly = aggregate_monthly(&series);

        assert_eq!(monthly.len(), 3);
        assert_relative_eq!(monthly.total(), series.total(), epsilon = 1e-9);
    }

    #[test]
    fn empty_series_has_no_months() {
        assert!(aggregate_monthly(&ForecastSeries::daily(vec![])).is_empty());
    }
}
