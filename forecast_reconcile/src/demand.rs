//! Average daily demand implied by a reconciled forecast

use crate::forecast::ForecastSeries;
use crate::granularity::GranularityClass;
use demand_math::stats::round_to;

/// Average gap (days) above which forecast points are treated as monthly totals
pub const MONTHLY_POINT_GAP_DAYS: f64 = 15.0;

/// Mean quantity per day covered by `series`, rounded to four decimals.
///
/// Monthly points each stand for the month that ends on their date, so the
/// covered span is extended by thirty days rather than one.
pub fn average_daily_demand(series: &ForecastSeries) -> f64 {
    let (Some(first), Some(last)) = (series.first_date(), series.last_date()) else {
        return 0.0;
    };

    let span = (last - first).num_days() as f64;
    let monthly = if series.len() > 1 {
        span / (series.len() - 1) as f64 > MONTHLY_POINT_GAP_DAYS
    } else {
        series.granularity == GranularityClass::Monthly
    };

    let days = if monthly { span + 30.0 } else { span + 1.0 };
    round_to((series.total() / days).max(0.0), 4)
}
