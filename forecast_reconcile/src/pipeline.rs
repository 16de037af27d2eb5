//! Per-entity reconciliation: runs every stage for each horizon

use crate::adequacy::{AdequacyDecision, DataAdequacyClassifier};
use crate::aggregate::aggregate_monthly;
use crate::clamp::PlausibilityGuard;
use crate::config::ReconcileConfig;
use crate::data::ObservationSeries;
use crate::demand::average_daily_demand;
use crate::ensemble::combine;
use crate::error::{ReconcileError, Result};
use crate::forecast::{ForecastSeries, Horizon};
use crate::granularity::GranularityClass;
use crate::models::{AccuracyMetric, ModelKind, ModelRun};
use crate::router::{effective_accuracy, route, RoutingContext, RoutingDecision, Source};
use crate::validate::ZeroFloorValidator;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Everything known about one entity before reconciliation
#[derive(Debug, Clone)]
pub struct EntityForecastInput {
    pub entity_id: String,
    pub category: String,
    pub history: ObservationSeries,
    /// Seasonal model run, if it produced one
    pub seasonal: Option<ModelRun>,
    /// Regression model run, if it produced one
    pub regression: Option<ModelRun>,
}

impl EntityForecastInput {
    pub fn new(
        entity_id: impl Into<String>,
        category: impl Into<String>,
        history: ObservationSeries,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            category: category.into(),
            history,
            seasonal: None,
            regression: None,
        }
    }

    pub fn with_seasonal(mut self, run: ModelRun) -> Self {
        self.seasonal = Some(run);
        self
    }

    pub fn with_regression(mut self, run: ModelRun) -> Self {
        self.regression = Some(run);
        self
    }

    fn accuracy_of(&self, kind: ModelKind) -> AccuracyMetric {
        let run = match kind {
            ModelKind::Seasonal => self.seasonal.as_ref(),
            ModelKind::Regression => self.regression.as_ref(),
        };
        run.map(|r| r.accuracy).unwrap_or_default()
    }
}

/// Reconciled forecast for one horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledForecast {
    pub horizon: Horizon,
    pub series: ForecastSeries,
    pub decision: RoutingDecision,
    /// The zero floor replaced the routed series with the alternate source
    pub zero_floor_substituted: bool,
}

/// A horizon for which neither model had usable output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailableHorizon {
    pub horizon: Horizon,
    pub reason: String,
}

/// Reconciliation result for one entity across all horizons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityReconciliation {
    pub entity_id: String,
    pub category: String,
    pub adequacy: AdequacyDecision,
    /// One entry per reconciled horizon, shortest first
    pub forecasts: Vec<ReconciledForecast>,
    /// Horizons with no forecast available
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable: Vec<UnavailableHorizon>,
    /// Accuracy implied by the routing decision of the shortest reconciled horizon
    pub accuracy: AccuracyMetric,
    pub average_daily_demand: f64,
}

impl EntityReconciliation {
    pub fn forecast(&self, horizon: Horizon) -> Option<&ReconciledForecast> {
        self.forecasts.iter().find(|f| f.horizon == horizon)
    }
}

/// Runs the reconciliation stages for single entities
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    config: ReconcileConfig,
    context: RoutingContext,
    classifier: DataAdequacyClassifier,
    guard: PlausibilityGuard,
    validator: ZeroFloorValidator,
}

impl Reconciler {
    pub fn new(config: ReconcileConfig) -> Self {
        Self {
            classifier: DataAdequacyClassifier::new(
                config.adequacy.clone(),
                config.granularity.clone(),
            ),
            guard: PlausibilityGuard::new(config.clamp.clone(), config.granularity.clone()),
            validator: ZeroFloorValidator::new(config.zero_floor.clone()),
            context: RoutingContext::default(),
            config,
        }
    }

    /// Route for a different usage context
    pub fn with_context(mut self, context: RoutingContext) -> Self {
        self.context = context;
        self
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    pub fn classifier(&self) -> &DataAdequacyClassifier {
        &self.classifier
    }

    /// Reconcile one entity for every horizon.
    ///
    /// A horizon without usable model output is recorded in
    /// [`EntityReconciliation::unavailable`]; the entity fails with
    /// `InsufficientData` only when no horizon can be reconciled.
    pub fn reconcile_entity(&self, input: &EntityForecastInput) -> Result<EntityReconciliation> {
        let adequacy = self.classifier.classify(&input.history);
        let mut forecasts = Vec::with_capacity(Horizon::ALL.len());
        let mut unavailable = Vec::new();

        for horizon in Horizon::ALL {
            match self.reconcile_with(input, &adequacy, horizon) {
                Ok(forecast) => forecasts.push(forecast),
                Err(ReconcileError::InsufficientData(reason)) => {
                    warn!(
                        entity = %input.entity_id,
                        horizon = %horizon,
                        %reason,
                        "no forecast available"
                    );
                    unavailable.push(UnavailableHorizon { horizon, reason });
                }
                Err(e) => return Err(e),
            }
        }

        if forecasts.is_empty() {
            return Err(ReconcileError::InsufficientData(format!(
                "no usable forecast for entity '{}' at any horizon",
                input.entity_id
            )));
        }

        let seasonal_accuracy = if adequacy.use_seasonal_model {
            input.accuracy_of(ModelKind::Seasonal)
        } else {
            AccuracyMetric::unknown()
        };
        let regression_accuracy = input.accuracy_of(ModelKind::Regression);
        let accuracy = forecasts
            .first()
            .map(|f| effective_accuracy(&f.decision, &seasonal_accuracy, &regression_accuracy))
            .unwrap_or_default();

        let average_daily_demand = forecasts
            .iter()
            .rev()
            .find(|f| !f.series.is_empty())
            .map(|f| average_daily_demand(&f.series))
            .unwrap_or(0.0);

        info!(
            entity = %input.entity_id,
            seasonal_allowed = adequacy.use_seasonal_model,
            average_daily_demand,
            "entity reconciled"
        );

        Ok(EntityReconciliation {
            entity_id: input.entity_id.clone(),
            category: input.category.clone(),
            adequacy,
            forecasts,
            unavailable,
            accuracy,
            average_daily_demand,
        })
    }

    /// Reconcile one entity for a single horizon
    pub fn reconcile_horizon(
        &self,
        input: &EntityForecastInput,
        horizon: Horizon,
    ) -> Result<ReconciledForecast> {
        let adequacy = self.classifier.classify(&input.history);
        self.reconcile_with(input, &adequacy, horizon)
    }

    fn reconcile_with(
        &self,
        input: &EntityForecastInput,
        adequacy: &AdequacyDecision,
        horizon: Horizon,
    ) -> Result<ReconciledForecast> {
        let entity = input.entity_id.as_str();
        let last_date = input.history.last_date().ok_or_else(|| {
            ReconcileError::InsufficientData(format!("entity '{}' has no history", entity))
        })?;

        let seasonal_run = match &input.seasonal {
            Some(_) if !adequacy.use_seasonal_model => {
                debug!(entity, reason = %adequacy.reason, "discarding seasonal output");
                None
            }
            run => run.as_ref(),
        };

        let seasonal = seasonal_run
            .map(|r| r.output.to_daily(last_date, horizon))
            .filter(|s| !s.is_empty());
        let regression = input
            .regression
            .as_ref()
            .map(|r| r.output.to_daily(last_date, horizon))
            .filter(|s| !s.is_empty());

        let seasonal_mape = seasonal_run.and_then(|r| r.accuracy.mape);
        let regression_mape = input.regression.as_ref().and_then(|r| r.accuracy.mape);

        let (decision, chosen, alternate) = match (seasonal, regression) {
            (None, None) => {
                return Err(ReconcileError::InsufficientData(format!(
                    "no usable forecast for entity '{}' at {}",
                    entity, horizon
                )))
            }
            (Some(a), None) => (RoutingDecision::only_available(ModelKind::Seasonal), a, None),
            (None, Some(b)) => {
                let decision =
                    route(None, regression_mape, horizon, self.context, &self.config.router);
                let decision = if decision.source == Source::Regression {
                    decision
                } else {
                    RoutingDecision::only_available(ModelKind::Regression)
                };
                (decision, b, None)
            }
            (Some(a), Some(b)) => {
                let decision = route(
                    seasonal_mape,
                    regression_mape,
                    horizon,
                    self.context,
                    &self.config.router,
                );
                match decision.source {
                    Source::Seasonal => (decision, a, Some(b)),
                    Source::Regression => (decision, b, Some(a)),
                    Source::Ensemble => {
                        let weights = decision.weights.unwrap_or_default();
                        let blended = combine(&a, &b, weights, &self.config.ensemble);
                        (decision, blended, Some(b))
                    }
                }
            }
        };

        let chosen = self.post_process(&chosen, &input.history);
        let alternate = alternate.map(|s| self.post_process(&s, &input.history));

        let historical_mean = input.history.trailing_mean(self.config.zero_floor.history_window);
        let outcome = self
            .validator
            .validate(entity, chosen, alternate.as_ref(), historical_mean);

        debug!(
            entity,
            horizon = %horizon,
            source = %decision.source,
            confidence = decision.confidence,
            points = outcome.series.len(),
            "horizon reconciled"
        );

        Ok(ReconciledForecast {
            horizon,
            series: outcome.series,
            decision,
            zero_floor_substituted: outcome.substituted,
        })
    }

    /// Daily clamp, then monthly roll-up and clamp for monthly history
    fn post_process(&self, daily: &ForecastSeries, history: &ObservationSeries) -> ForecastSeries {
        let clamped = self.guard.clamp_daily(daily, history);
        match GranularityClass::of(history, &self.config.granularity) {
            GranularityClass::Monthly => {
                self.guard.clamp_monthly(&aggregate_monthly(&clamped), history)
            }
            GranularityClass::Daily => clamped,
        }
    }
}
