use clap::{Parser, ValueEnum};
use forecast_reconcile::data::{DataLoader, EntityAccuracy};
use forecast_reconcile::{
    BatchReconciler, ModelKind, ModelOutput, ModelRun, PrecomputedModel, ReconcileConfig,
    Reconciler, RoutingContext,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reconcile_batch")]
#[command(
    version,
    about = "Reconcile seasonal and regression demand forecasts for a batch of entities"
)]
struct Cli {
    /// History CSV: entity_id,date,quantity[,category]
    history: PathBuf,

    /// Regression buckets CSV: entity_id,bucket,predicted_quantity,lower_bound,upper_bound
    regression: PathBuf,

    /// Seasonal daily forecasts CSV: entity_id,date,predicted_quantity,lower_bound,upper_bound
    #[arg(long)]
    seasonal: Option<PathBuf>,

    /// Backtest accuracy CSV: entity_id,model,mape,mae
    #[arg(long)]
    accuracy: Option<PathBuf>,

    /// JSON configuration overriding the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// What the forecasts will be used for
    #[arg(long, value_enum, default_value = "forecast")]
    context: ContextArg,

    /// Also print per-category totals
    #[arg(long)]
    categories: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ContextArg {
    Forecast,
    UrgentAction,
    SeasonalityOnly,
}

impl From<ContextArg> for RoutingContext {
    fn from(arg: ContextArg) -> Self {
        match arg {
            ContextArg::Forecast => RoutingContext::Forecast,
            ContextArg::UrgentAction => RoutingContext::UrgentAction,
            ContextArg::SeasonalityOnly => RoutingContext::SeasonalityOnly,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ReconcileConfig::from_json_file(path)?,
        None => ReconcileConfig::default(),
    };
    config.validate()?;

    let histories = DataLoader::histories_from_csv(&cli.history)?;
    let accuracy = match &cli.accuracy {
        Some(path) => DataLoader::accuracy_from_csv(path)?,
        None => Default::default(),
    };
    let metrics_for = |entity: &str| accuracy.get(entity).copied().unwrap_or_default();

    let mut regression = PrecomputedModel::new(ModelKind::Regression, "regression");
    for (entity, buckets) in DataLoader::bucketed_forecasts_from_csv(&cli.regression)? {
        let EntityAccuracy { regression: metric, .. } = metrics_for(&entity);
        regression.insert(entity, ModelRun::new(ModelOutput::Bucketed(buckets), metric));
    }

    let reconciler = Reconciler::new(config.clone()).with_context(cli.context.into());
    let mut batch = BatchReconciler::new(config)
        .with_reconciler(reconciler)
        .with_regression_model(Arc::new(regression));

    if let Some(path) = &cli.seasonal {
        let mut seasonal = PrecomputedModel::new(ModelKind::Seasonal, "seasonal");
        for (entity, series) in DataLoader::daily_forecasts_from_csv(path)? {
            let EntityAccuracy { seasonal: metric, .. } = metrics_for(&entity);
            seasonal.insert(entity, ModelRun::new(ModelOutput::Dense(series), metric));
        }
        batch = batch.with_seasonal_model(Arc::new(seasonal));
    }

    let histories: Vec<_> = histories.into_values().collect();
    let summary = batch.run(&histories)?;

    let output = if cli.categories {
        json!({ "summary": summary, "categories": summary.categories() })
    } else {
        json!({ "summary": summary })
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
