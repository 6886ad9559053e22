//! Model comparison
//!
//! Recomputes RMSE and MAE from every persisted prediction table. A model
//! whose table is missing or unusable is skipped with a warning; the summary
//! and comparison chart are always written.

use std::path::Path;

use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::{EvaluationRow, ModelKind};
use crate::error::{PipelineError, Result};
use crate::forecast::ForecastMetrics;
use crate::plots::render_comparison;
use crate::repo::{read_predictions, write_summary};

#[derive(Debug, Clone, Serialize)]
pub struct SkippedModel {
    pub model: ModelKind,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationSummary {
    pub rows: Vec<EvaluationRow>,
    pub skipped: Vec<SkippedModel>,
}

impl EvaluationSummary {
    pub fn evaluated(&self) -> usize {
        self.rows.len()
    }
}

pub fn evaluate(cfg: &Config) -> Result<EvaluationSummary> {
    let mut summary = EvaluationSummary::default();

    for kind in ModelKind::iter() {
        let path = cfg.predictions_path(kind);
        match score(kind, &path) {
            Ok(row) => {
                info!(model = %kind, rmse = row.rmse, mae = row.mae, "model evaluated");
                summary.rows.push(row);
            }
            Err(e) => {
                warn!(model = %kind, path = %path.display(), error = %e, "skipping model");
                summary.skipped.push(SkippedModel {
                    model: kind,
                    reason: e.to_string(),
                });
            }
        }
    }

    let summary_path = cfg.evaluation_summary_path();
    write_summary(&summary_path, &summary.rows)?;
    info!(path = %summary_path.display(), models = summary.rows.len(), "evaluation summary saved");

    let plot_path = cfg.comparison_plot_path();
    render_comparison(&plot_path, &summary.rows)?;
    info!(path = %plot_path.display(), "comparison plot saved");

    Ok(summary)
}

/// Metrics of one persisted prediction table, over rows with both values
pub fn score(kind: ModelKind, path: &Path) -> Result<EvaluationRow> {
    let stored = read_predictions(path).map_err(|e| match e {
        PipelineError::InputMissing(p) => PipelineError::ArtifactMissing(p),
        other => other,
    })?;

    let metrics = ForecastMetrics::calculate_complete(&stored.actual(), &stored.predicted())
        .map_err(|e| PipelineError::malformed(path, format!("no complete rows to score: {e}")))?;

    Ok(EvaluationRow {
        model: kind.to_string(),
        rmse: round3(metrics.rmse),
        mae: round3(metrics.mae),
    })
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
