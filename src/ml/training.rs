//! Model Training Pipeline
//!
//! Loads the feature table, fits one model, scores it and persists the
//! prediction table and forecast plot. Feature-table models are scored on a
//! chronological hold-out; the seasonal model is fitted on the full history
//! and scored in-sample.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use super::{FeatureRegressor, GradientBoostingModel, LinearRegressionModel, SeasonalModel};
use crate::config::Config;
use crate::domain::{FeatureRow, ModelKind, PredictionRecord, SeasonalForecastPoint, TimeSeries};
use crate::error::{PipelineError, Result};
use crate::forecast::ForecastMetrics;
use crate::plots::ForecastChart;
use crate::repo::{read_feature_table, read_series, write_predictions};

/// Outcome of one trainer run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub model: ModelKind,
    pub metrics: ForecastMetrics,
    pub train_rows: usize,
    /// Rows the metrics were computed over
    pub test_rows: usize,
    pub predictions_path: PathBuf,
    pub plot_path: PathBuf,
}

/// Split into a leading training segment and a trailing test segment.
///
/// `ceil(n · test_size)` rows are held out. Returns `None` when either
/// segment would be empty.
pub fn chronological_split<T>(rows: &[T], test_size: f64) -> Option<(&[T], &[T])> {
    let n = rows.len();
    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return None;
    }
    Some(rows.split_at(n - n_test))
}

/// Fit a feature-table regressor
pub fn fit_regressor(
    kind: ModelKind,
    cfg: &Config,
    x: &[Vec<f64>],
    y: &[f64],
) -> Result<Box<dyn FeatureRegressor>> {
    Ok(match kind {
        ModelKind::GradientBoosting => {
            Box::new(GradientBoostingModel::fit(x, y, &cfg.gradient_boosting)?)
        }
        ModelKind::LinearRegression => Box::new(LinearRegressionModel::fit(
            x,
            y,
            cfg.linear_regression.fit_intercept,
        )?),
        ModelKind::Seasonal => {
            return Err(PipelineError::fit(kind, "not a feature-table model"));
        }
    })
}

/// Train, score and persist one of the feature-table models.
pub fn train_feature_model(cfg: &Config, kind: ModelKind) -> Result<TrainingReport> {
    let table_path = cfg.feature_table_path();
    let table = read_feature_table(&table_path)?;
    info!(rows = table.len(), path = %table_path.display(), "feature table loaded");

    let (train, test) = chronological_split(&table, cfg.modeling.test_size).ok_or_else(|| {
        PipelineError::malformed(
            &table_path,
            format!("{} rows cannot be split into training and test segments", table.len()),
        )
    })?;

    let x_train: Vec<Vec<f64>> = train.iter().map(FeatureRow::features).collect();
    let y_train: Vec<f64> = train.iter().map(FeatureRow::target).collect();
    let model = fit_regressor(kind, cfg, &x_train, &y_train)?;
    info!(model = %kind, train_rows = train.len(), "model fitted");

    let x_test: Vec<Vec<f64>> = test.iter().map(FeatureRow::features).collect();
    let y_test: Vec<f64> = test.iter().map(FeatureRow::target).collect();
    let predicted = model.predict(&x_test)?;
    let metrics =
        ForecastMetrics::calculate(&y_test, &predicted).map_err(|e| PipelineError::fit(kind, e))?;

    let records: Vec<PredictionRecord> = test
        .iter()
        .zip(&predicted)
        .map(|(row, p)| PredictionRecord::point(row.timestamp, row.energy_kwh, *p))
        .collect();

    persist(cfg, kind, &records, ForecastChart::from_records(chart_title(kind), &records))?;

    let report = TrainingReport {
        model: kind,
        metrics,
        train_rows: train.len(),
        test_rows: test.len(),
        predictions_path: cfg.predictions_path(kind),
        plot_path: cfg.plot_path(kind),
    };
    log_report(&report);
    Ok(report)
}

/// Fit the seasonal model on the full history and forecast the configured
/// horizon past its end.
pub fn train_seasonal_model(cfg: &Config) -> Result<TrainingReport> {
    let kind = ModelKind::Seasonal;
    let table_path = cfg.feature_table_path();
    let series = read_series(&table_path)?;
    info!(rows = series.len(), path = %table_path.display(), "history loaded");

    let model = SeasonalModel::fit(&series, &cfg.seasonal)?;
    let forecast = model.forecast(cfg.modeling.horizon_hours as usize)?;
    info!(
        model = %kind,
        horizon_hours = cfg.modeling.horizon_hours,
        points = forecast.len(),
        "forecast generated"
    );

    let records = join_actuals(&series, &forecast);
    let actual: Vec<Option<f64>> = records.iter().map(|r| r.actual).collect();
    let predicted: Vec<Option<f64>> = records.iter().map(|r| Some(r.predicted)).collect();
    let metrics = ForecastMetrics::calculate_complete(&actual, &predicted)
        .map_err(|e| PipelineError::fit(kind, e))?;

    let chart = ForecastChart::from_forecast(chart_title(kind), &series, &forecast);
    persist(cfg, kind, &records, chart)?;

    let report = TrainingReport {
        model: kind,
        metrics,
        train_rows: series.len(),
        test_rows: metrics.sample_count,
        predictions_path: cfg.predictions_path(kind),
        plot_path: cfg.plot_path(kind),
    };
    log_report(&report);
    Ok(report)
}

/// Left-join a forecast with the known actuals on timestamp.
pub fn join_actuals(history: &TimeSeries, forecast: &[SeasonalForecastPoint]) -> Vec<PredictionRecord> {
    let actuals: HashMap<_, _> = history
        .readings()
        .iter()
        .map(|r| (r.timestamp, r.energy_kwh))
        .collect();

    forecast
        .iter()
        .map(|p| PredictionRecord {
            timestamp: p.timestamp,
            actual: actuals.get(&p.timestamp).copied(),
            predicted: p.yhat,
            predicted_lower: Some(p.yhat_lower),
            predicted_upper: Some(p.yhat_upper),
        })
        .collect()
}

fn chart_title(kind: ModelKind) -> String {
    format!("{} Forecast", kind.label())
}

fn persist(cfg: &Config, kind: ModelKind, records: &[PredictionRecord], chart: ForecastChart) -> Result<()> {
    let predictions_path = cfg.predictions_path(kind);
    write_predictions(&predictions_path, records)?;
    info!(path = %predictions_path.display(), rows = records.len(), "predictions saved");

    let plot_path = cfg.plot_path(kind);
    chart.render_to(&plot_path)?;
    info!(path = %plot_path.display(), "plot saved");
    Ok(())
}

fn log_report(report: &TrainingReport) {
    info!(
        model = %report.model,
        rmse = report.metrics.rmse,
        mae = report.metrics.mae,
        train_rows = report.train_rows,
        test_rows = report.test_rows,
        "training completed"
    );
}
