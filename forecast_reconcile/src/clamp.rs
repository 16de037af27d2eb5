//! Plausibility caps on daily and monthly forecasts
//!
//! Both guards scale a point's estimate and bounds by the same ratio, so the
//! `lower <= predicted <= upper` ordering survives clamping. Histories with
//! fewer than two observations give no basis for a cap and pass through.

use crate::config::{ClampConfig, GranularityConfig};
use crate::data::ObservationSeries;
use crate::forecast::{ForecastPoint, ForecastSeries};
use crate::granularity::GranularityClass;
use demand_math::stats::clamp_ratio;
use tracing::debug;

/// Caps forecasts to multiples of what history has actually shown
#[derive(Debug, Clone, Default)]
pub struct PlausibilityGuard {
    clamp: ClampConfig,
    granularity: GranularityConfig,
}

impl PlausibilityGuard {
    pub fn new(clamp: ClampConfig, granularity: GranularityConfig) -> Self {
        Self { clamp, granularity }
    }

    /// Largest plausible daily quantity.
    ///
    /// Monthly history is converted to a daily equivalent first.
    pub fn daily_cap(&self, history: &ObservationSeries) -> Option<f64> {
        if history.len() < 2 {
            return None;
        }
        let max_hist = history.max_value()?;
        let max_daily = match GranularityClass::of(history, &self.granularity) {
            GranularityClass::Monthly => max_hist / self.clamp.days_per_month,
            GranularityClass::Daily => max_hist,
        };
        Some(max_daily.max(self.clamp.daily_floor) * self.clamp.daily_multiplier)
    }

    /// Largest plausible monthly total.
    ///
    /// Daily history is summed per calendar month first.
    pub fn monthly_cap(&self, history: &ObservationSeries) -> Option<f64> {
        if history.len() < 2 {
            return None;
        }
        let max_monthly = match GranularityClass::of(history, &self.granularity) {
            GranularityClass::Monthly => history.max_value()?,
            GranularityClass::Daily => history
                .monthly_totals()
                .into_values()
                .reduce(f64::max)?,
        };
        let cap = max_monthly * self.clamp.monthly_multiplier;
        (cap > 0.0).then_some(cap)
    }

    /// Cap every daily point
    pub fn clamp_daily(
        &self,
        series: &ForecastSeries,
        history: &ObservationSeries,
    ) -> ForecastSeries {
        match self.daily_cap(history) {
            Some(cap) => clamp_series(series, cap, "daily"),
            None => series.clone(),
        }
    }

    /// Cap every monthly point
    pub fn clamp_monthly(
        &self,
        series: &ForecastSeries,
        history: &ObservationSeries,
    ) -> ForecastSeries {
        match self.monthly_cap(history) {
            Some(cap) => clamp_series(series, cap, "monthly"),
            None => series.clone(),
        }
    }
}

fn clamp_series(series: &ForecastSeries, cap: f64, scope: &str) -> ForecastSeries {
    let mut clamped = 0usize;
    let points = series
        .points
        .iter()
        .map(|p| {
            let ratio = clamp_ratio(p.predicted_quantity, cap);
            if ratio < 1.0 {
                clamped += 1;
                let scaled = p.scaled(ratio);
                ForecastPoint::normalized(p.date, cap, scaled.lower_bound, scaled.upper_bound)
            } else {
                *p
            }
        })
        .collect();

    if clamped > 0 {
        debug!(scope, cap, clamped, total = series.len(), "clamped implausible forecast points");
    }

    ForecastSeries::new(series.granularity, points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::{daily_series, monthly_series};
    use approx::assert_relative_eq;
    use chrono::{Days, NaiveDate};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn forecast(values: &[f64]) -> ForecastSeries {
        let start = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        ForecastSeries::daily(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    ForecastPoint::new(start + Days::new(i as u64), *v, v * 0.8, v * 1.2).unwrap()
                })
                .collect(),
        )
    }

    #[test]
    fn daily_history_cap() {
        let guard = PlausibilityGuard::default();
        let history = daily_series(2024, 1, 1, &[2.0, 5.0, 4.0]);
        assert_relative_eq!(guard.daily_cap(&history).unwrap(), 15.0);

        let out = guard.clamp_daily(&forecast(&[30.0, 10.0]), &history);
        assert_relative_eq!(out.points[0].predicted_quantity, 15.0);
        assert_relative_eq!(out.points[0].lower_bound, 12.0);
        assert_relative_eq!(out.points[0].upper_bound, 18.0);
        assert_eq!(out.points[1], forecast(&[30.0, 10.0]).points[1]);
    }

    #[test]
    fn monthly_history_uses_daily_equivalent() {
        let guard = PlausibilityGuard::default();
        let history = monthly_series(2023, 1, &[90.0, 60.0, 120.0, 30.0]);
        // 120 / 30 = 4 per day, times 3
        assert_relative_eq!(guard.daily_cap(&history).unwrap(), 12.0);
    }

    #[test]
    fn low_history_uses_floor() {
        let guard = PlausibilityGuard::default();
        let history = daily_series(2024, 1, 1, &[0.0, 0.1, 0.0]);
        assert_relative_eq!(guard.daily_cap(&history).unwrap(), 1.5);
    }

    #[test]
    fn tiny_history_passes_through() {
        let guard = PlausibilityGuard::default();
        let history = daily_series(2024, 1, 1, &[1.0]);
        let input = forecast(&[1000.0]);
        assert_eq!(guard.clamp_daily(&input, &history), input);
    }

    #[test]
    fn monthly_cap_from_daily_history() {
        let guard = PlausibilityGuard::default();
        // January sums to 31, February to 29
        let history = daily_series(2024, 1, 1, &[1.0; 60]);
        assert_relative_eq!(guard.monthly_cap(&history).unwrap(), 31.0 * 2.5);
    }

    #[test]
    fn monthly_cap_from_monthly_history() {
        let guard = PlausibilityGuard::default();
        let history = monthly_series(2023, 1, &[100.0, 240.0, 180.0]);
        let monthly = ForecastSeries::monthly(forecast(&[1000.0, 500.0]).points);
        let capped = guard.clamp_monthly(&monthly, &history);
        assert_relative_eq!(capped.points[0].predicted_quantity, 600.0);
        assert_relative_eq!(capped.points[0].upper_bound, 720.0);
        assert_relative_eq!(capped.points[1].predicted_quantity, 500.0);
        assert_eq!(capped.granularity, GranularityClass::Monthly);
    }

    #[test]
    fn all_zero_history_has_no_monthly_cap() {
        let guard = PlausibilityGuard::default();
        assert_eq!(guard.monthly_cap(&daily_series(2024, 1, 1, &[0.0; 10])), None);
    }

    #[test]
    fn daily_clamp_is_idempotent_and_ordered() {
        let guard = PlausibilityGuard::default();
        let mut rng = StdRng::seed_from_u64(7);
        let history_values: Vec<f64> = (0..60).map(|_| rng.gen_range(0.0..20.0)).collect();
        let history = daily_series(2024, 1, 1, &history_values);
        let values: Vec<f64> = (0..90).map(|_| rng.gen_range(0.0..200.0)).collect();

        let once = guard.clamp_daily(&forecast(&values), &history);
        let twice = guard.clamp_daily(&once, &history);
        assert_eq!(once, twice);
        assert!(once.points.iter().all(|p| p.is_consistent()));
    }
}
