//! Parallel reconciliation of many entities
//!
//! Each entity is one task on a fixed-size rayon pool. Tasks share nothing
//! but read-only configuration and model handles, so a failure or panic in
//! one entity is recorded and the rest of the batch carries on.

use crate::category::{rollup_categories, CategoryReconciliation};
use crate::config::ReconcileConfig;
use crate::data::EntityHistory;
use crate::error::Result;
use crate::models::{ForecastModel, ModelRun};
use crate::pipeline::{EntityForecastInput, EntityReconciliation, Reconciler};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{info, warn};

/// An entity that produced no reconciliation, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntity {
    pub entity_id: String,
    pub reason: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub reconciled: Vec<EntityReconciliation>,
    pub skipped: Vec<SkippedEntity>,
}

impl BatchSummary {
    /// Number of entities submitted
    pub fn total(&self) -> usize {
        self.reconciled.len() + self.skipped.len()
    }

    pub fn get(&self, entity_id: &str) -> Option<&EntityReconciliation> {
        self.reconciled.iter().find(|r| r.entity_id == entity_id)
    }

    pub fn is_skipped(&self, entity_id: &str) -> bool {
        self.skipped.iter().any(|s| s.entity_id == entity_id)
    }

    /// Roll the reconciled entities up by category
    pub fn categories(&self) -> Vec<CategoryReconciliation> {
        rollup_categories(&self.reconciled)
    }
}

/// Runs model invocation and reconciliation for many entities in parallel
pub struct BatchReconciler {
    reconciler: Reconciler,
    seasonal: Option<Arc<dyn ForecastModel>>,
    regression: Option<Arc<dyn ForecastModel>>,
}

impl BatchReconciler {
    pub fn new(config: ReconcileConfig) -> Self {
        Self {
            reconciler: Reconciler::new(config),
            seasonal: None,
            regression: None,
        }
    }

    /// Use a customised reconciler, e.g. one routing for a different context
    pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    pub fn with_seasonal_model(mut self, model: Arc<dyn ForecastModel>) -> Self {
        self.seasonal = Some(model);
        self
    }

    pub fn with_regression_model(mut self, model: Arc<dyn ForecastModel>) -> Self {
        self.regression = Some(model);
        self
    }

    /// Reconcile every entity.
    ///
    /// Only building the worker pool can fail; per-entity problems end up in
    /// [`BatchSummary::skipped`].
    pub fn run(&self, histories: &[EntityHistory]) -> Result<BatchSummary> {
        if histories.is_empty() {
            return Ok(BatchSummary::default());
        }

        let workers = self.reconciler.config().batch.max_workers.min(histories.len()).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("reconcile-{}", i))
            .build()?;

        info!(entities = histories.len(), workers, "starting batch reconciliation");

        let outcomes: Vec<(String, std::result::Result<EntityReconciliation, String>)> =
            pool.install(|| {
                histories
                    .par_iter()
                    .map(|history| {
                        let outcome =
                            panic::catch_unwind(AssertUnwindSafe(|| self.process(history)))
                                .unwrap_or_else(|payload| {
                                    Err(format!("worker panicked: {}", panic_message(&*payload)))
                                });
                        (history.entity_id.clone(), outcome)
                    })
                    .collect()
            });

        let mut summary = BatchSummary::default();
        for (entity_id, outcome) in outcomes {
            match outcome {
                Ok(reconciliation) => summary.reconciled.push(reconciliation),
                Err(reason) => {
                    warn!(entity = %entity_id, %reason, "skipping entity");
                    summary.skipped.push(SkippedEntity { entity_id, reason });
                }
            }
        }

        info!(
            reconciled = summary.reconciled.len(),
            skipped = summary.skipped.len(),
            "batch reconciliation finished"
        );
        Ok(summary)
    }

    fn process(
        &self,
        history: &EntityHistory,
    ) -> std::result::Result<EntityReconciliation, String> {
        let min_points = self.reconciler.config().batch.min_history_points;
        if history.series.len() < min_points {
            return Err(format!(
                "only {} observations, need at least {}",
                history.series.len(),
                min_points
            ));
        }

        let adequacy = self.reconciler.classifier().classify(&history.series);
        let seasonal = if adequacy.use_seasonal_model {
            self.seasonal.as_deref().and_then(|m| invoke(m, history))
        } else {
            None
        };
        let regression = self.regression.as_deref().and_then(|m| invoke(m, history));

        if seasonal.is_none() && regression.is_none() {
            return Err("no model produced a forecast".to_string());
        }

        let input = EntityForecastInput {
            entity_id: history.entity_id.clone(),
            category: history.category.clone(),
            history: history.series.clone(),
            seasonal,
            regression,
        };
        self.reconciler.reconcile_entity(&input).map_err(|e| e.to_string())
    }
}

/// Run one model for one entity; a failure means the other model is used alone
fn invoke(model: &dyn ForecastModel, history: &EntityHistory) -> Option<ModelRun> {
    match model.predict(&history.entity_id, &history.series) {
        Ok(run) => Some(run),
        Err(e) => {
            warn!(
                entity = %history.entity_id,
                model = model.name(),
                kind = %model.kind(),
                error = %e,
                "model failed, continuing without it"
            );
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
