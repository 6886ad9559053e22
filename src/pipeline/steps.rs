//! The pipeline steps, each callable in-process and wrapped by one binary.

use std::path::PathBuf;

use anyhow::Context;
use tracing::{error, info};

use super::evaluation::{evaluate, EvaluationSummary};
use super::runner::PipelineStep;
use crate::config::Config;
use crate::domain::ModelKind;
use crate::error::Result;
use crate::forecast::build_feature_table;
use crate::ml::{train_feature_model, train_seasonal_model, TrainingReport};
use crate::repo::{read_series, write_feature_table, write_series};
use crate::simulation::ConsumptionSynthesizer;
use crate::telemetry::init_step_logging;

/// Generate the synthetic series and write the raw table.
pub fn prepare_input(cfg: &Config) -> Result<PathBuf> {
    let synthesizer = ConsumptionSynthesizer::new(&cfg.synthesis, cfg.modeling.random_seed);
    let series = synthesizer.generate();
    info!(
        rows = series.len(),
        start = ?series.first().map(|r| r.timestamp),
        end = ?series.last().map(|r| r.timestamp),
        "synthetic series generated"
    );

    let path = cfg.processed_series_path();
    write_series(&path, &series)?;
    info!(path = %path.display(), "raw series saved");
    Ok(path)
}

/// Derive the feature table from the raw series; returns its row count.
pub fn feature_engineering(cfg: &Config) -> Result<usize> {
    let input = cfg.processed_series_path();
    let series = read_series(&input)?;
    info!(rows = series.len(), path = %input.display(), "raw series loaded");

    let table = build_feature_table(&series);
    let output = cfg.feature_table_path();
    write_feature_table(&output, &table)?;
    info!(
        rows = table.len(),
        dropped = series.len() - table.len(),
        path = %output.display(),
        "feature table saved"
    );
    Ok(table.len())
}

pub fn train_seasonal(cfg: &Config) -> Result<TrainingReport> {
    train_seasonal_model(cfg)
}

pub fn train_gradient_boosting(cfg: &Config) -> Result<TrainingReport> {
    train_feature_model(cfg, ModelKind::GradientBoosting)
}

pub fn train_linear(cfg: &Config) -> Result<TrainingReport> {
    train_feature_model(cfg, ModelKind::LinearRegression)
}

pub fn evaluate_models(cfg: &Config) -> Result<EvaluationSummary> {
    evaluate(cfg)
}

/// Shared body of the step binaries.
///
/// Loads the configuration, sends logs to `<logging.dir>/<step>.log`, runs
/// `body` and logs its outcome. Logging falls back to the defaults when the
/// configuration itself cannot be loaded, so that failure is recorded too.
pub fn run_step<T>(step: PipelineStep, body: impl FnOnce(&Config) -> Result<T>) -> anyhow::Result<T> {
    let cfg = Config::load();
    let logging = cfg.as_ref().map(|c| c.logging.clone()).unwrap_or_default();
    let _guard = init_step_logging(&logging.dir, &step.name(), &logging.level)
        .context("initialising logging")?;
    info!(%step, "step started");

    let cfg = cfg
        .inspect_err(|e| error!(%step, error = %e, "configuration could not be loaded"))
        .context("loading configuration")?;

    match body(&cfg) {
        Ok(value) => {
            info!(%step, "step completed");
            Ok(value)
        }
        Err(e) => {
            error!(%step, error = %e, "step failed");
            Err(anyhow::Error::new(e).context(format!("{step} failed")))
        }
    }
}
