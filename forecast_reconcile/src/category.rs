//! Category-level roll-up of entity reconciliations

use crate::forecast::{ForecastPoint, ForecastSeries, Horizon};
use crate::granularity::GranularityClass;
use crate::pipeline::EntityReconciliation;
use chrono::NaiveDate;
use demand_math::stats::{mean, round_to};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summed forecast for one category and horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryForecast {
    pub horizon: Horizon,
    pub series: ForecastSeries,
}

/// Aggregate of every reconciled entity in a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReconciliation {
    pub category: String,
    pub product_count: usize,
    pub forecasts: Vec<CategoryForecast>,
    /// Mean of the members' known MAPE values
    pub mape: Option<f64>,
    /// Mean of the members' known MAE values
    pub mae: Option<f64>,
}

/// Group reconciliations by category and sum their forecasts by date.
///
/// Categories are returned in name order.
pub fn rollup_categories(reconciliations: &[EntityReconciliation]) -> Vec<CategoryReconciliation> {
    let mut groups: BTreeMap<&str, Vec<&EntityReconciliation>> = BTreeMap::new();
    for r in reconciliations {
        groups.entry(r.category.as_str()).or_default().push(r);
    }

    groups
        .into_iter()
        .map(|(category, members)| {
            let forecasts = Horizon::ALL
                .iter()
                .map(|&horizon| CategoryForecast {
                    horizon,
                    series: sum_by_date(&members, horizon),
                })
                .collect();

            let mapes: Vec<f64> = members.iter().filter_map(|m| m.accuracy.mape).collect();
            let maes: Vec<f64> = members.iter().filter_map(|m| m.accuracy.mae).collect();

            CategoryReconciliation {
                category: category.to_string(),
                product_count: members.len(),
                forecasts,
                mape: mean(&mapes).ok().map(|v| round_to(v, 2)),
                mae: mean(&maes).ok().map(|v| round_to(v, 2)),
            }
        })
        .collect()
}

fn sum_by_date(members: &[&EntityReconciliation], horizon: Horizon) -> ForecastSeries {
    let mut totals: BTreeMap<NaiveDate, (f64, f64, f64)> = BTreeMap::new();
    let mut all_monthly = true;

    for forecast in members.iter().filter_map(|m| m.forecast(horizon)) {
        all_monthly &= forecast.series.granularity == GranularityClass::Monthly;
        for p in &forecast.series.points {
            let entry = totals.entry(p.date).or_insert((0.0, 0.0, 0.0));
            entry.0 += p.predicted_quantity;
            entry.1 += p.lower_bound;
            entry.2 += p.upper_bound;
        }
    }

    let granularity = if all_monthly && !totals.is_empty() {
        GranularityClass::Monthly
    } else {
        GranularityClass::Daily
    };
    let points = totals
        .into_iter()
        .map(|(date, (predicted, lower, upper))| {
            ForecastPoint::normalized(date, predicted, lower, upper)
        })
        .collect();

    ForecastSeries::new(granularity, points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adequacy::AdequacyDecision;
    use crate::granularity::FrequencyClass;
    use crate::models::{AccuracyMetric, ModelKind};
    use crate::pipeline::ReconciledForecast;
    use crate::router::RoutingDecision;
    use approx::assert_relative_eq;
    use chrono::Days;

    fn entity(id: &str, category: &str, value: f64, mape: Option<f64>) -> EntityReconciliation {
        let start = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        let forecasts = Horizon::ALL
            .iter()
            .map(|&horizon| ReconciledForecast {
                horizon,
                series: ForecastSeries::daily(
                    (0..horizon.days() as u64)
                        .map(|i| {
                            ForecastPoint::new(start + Days::new(i), value, value, value).unwrap()
                        })
                        .collect(),
                ),
                decision: RoutingDecision::only_available(ModelKind::Regression),
                zero_floor_substituted: false,
            })
            .collect();

        EntityReconciliation {
            entity_id: id.to_string(),
            category: category.to_string(),
            adequacy: AdequacyDecision {
                use_seasonal_model: true,
                reason: "dense".to_string(),
                frequency_class: FrequencyClass::DenseDaily,
                point_count: 120,
            },
            forecasts,
            unavailable: Vec::new(),
            accuracy: AccuracyMetric::new(mape, None),
            average_daily_demand: value,
        }
    }

    #[test]
    fn sums_members_by_date() {
        let rolled = rollup_categories(&[
            entity("a", "Snacks", 2.0, Some(10.0)),
            entity("b", "Drinks", 5.0, None),
            entity("c", "Snacks", 3.0, Some(20.0)),
        ]);

        assert_eq!(rolled.len(), 2);
        let snacks = &rolled[1];
        assert_eq!(snacks.category, "Snacks");
        assert_eq!(snacks.product_count, 2);
        assert_eq!(snacks.mape, Some(15.0));
        assert_eq!(snacks.mae, None);

        let ninety = &snacks.forecasts[2];
        assert_eq!(ninety.horizon, Horizon::Days90);
        assert_eq!(ninety.series.len(), 90);
        assert_relative_eq!(ninety.series.points[0].predicted_quantity, 5.0);

        assert_eq!(rolled[0].category, "Drinks");
        assert_eq!(rolled[0].mape, None);
    }

    #[test]
    fn empty_input() {
        assert!(rollup_categories(&[]).is_empty());
    }
}
