//! Dashboard handlers. Artifacts are re-read on every request so the page
//! always reflects the latest pipeline run.

use std::str::FromStr;

use axum::{
    extract::{Multipart, Query, State},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use super::{
    error::ApiError,
    forecast::{forecast_upload, ForecastRequest},
    pages::{self, IndexView},
    AppState,
};
use crate::config::Config;
use crate::domain::ModelKind;
use crate::error::PipelineError;
use crate::plots::{comparison_svg, ForecastChart};
use crate::repo::{read_predictions, read_summary, StoredPredictions};

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    pub model: Option<String>,
}

/// Error rendered as an HTML page instead of JSON
pub struct PageError(pub ApiError);

impl From<ApiError> for PageError {
    fn from(error: ApiError) -> Self {
        Self(error)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        (status, Html(pages::error_page(status, &self.0.public_message()))).into_response()
    }
}

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
) -> Result<Html<String>, PageError> {
    let selected = query
        .model
        .as_deref()
        .and_then(|m| ModelKind::from_str(m).ok())
        .unwrap_or(ModelKind::Seasonal);

    let cfg = state.cfg.clone();
    let view = tokio::task::spawn_blocking(move || index_view(&cfg, selected))
        .await
        .map_err(ApiError::from)?;
    Ok(Html(pages::index_page(&view)))
}

pub async fn upload_forecast(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Html<String>, PageError> {
    let request = ForecastRequest::from_multipart(multipart).await?;
    let horizon_hours = request.horizon_hours;
    let forecast = forecast_upload(&state, request).await?;

    let chart = ForecastChart::from_forecast(
        format!("Forecast on Uploaded Data (+{horizon_hours}h)"),
        &forecast.history,
        &forecast.points,
    )
    .render_svg()
    .map_err(ApiError::from)?;
    let csv = forecast.to_csv()?;

    Ok(Html(pages::forecast_page(&forecast, &chart, &csv)))
}

fn index_view(cfg: &Config, selected: ModelKind) -> IndexView {
    let chart = prediction_chart(cfg, selected);

    let (summary, comparison) = match read_summary(&cfg.evaluation_summary_path()) {
        Ok(rows) => {
            let svg = comparison_svg(&rows)
                .inspect_err(|e| tracing::warn!(error = %e, "comparison chart failed"))
                .ok();
            (Ok(rows), svg)
        }
        Err(PipelineError::ArtifactMissing(_)) => (
            Err("Evaluation summary not found. Run the pipeline to evaluate the models.".to_string()),
            None,
        ),
        Err(e) => (Err(format!("Evaluation summary could not be read: {e}")), None),
    };

    IndexView {
        selected,
        chart,
        summary,
        comparison,
    }
}

fn prediction_chart(cfg: &Config, model: ModelKind) -> Result<String, String> {
    let stored = match read_predictions(&cfg.predictions_path(model)) {
        Ok(stored) => stored,
        Err(PipelineError::InputMissing(_)) => {
            return Err(format!("No prediction file found for {}.", model.label()))
        }
        Err(e) => return Err(format!("Predictions for {} could not be read: {e}", model.label())),
    };
    if !stored.has_time_column {
        return Err(format!(
            "Prediction file for {} has no 'timestamp' or 'ds' column.",
            model.label()
        ));
    }

    stored_chart(model, &stored)
        .render_svg()
        .map_err(|e| format!("Chart for {} could not be drawn: {e}", model.label()))
}

fn stored_chart(model: ModelKind, stored: &StoredPredictions) -> ForecastChart {
    let mut chart = ForecastChart::new(format!("{} Forecast vs Actual", model.label()));
    for row in &stored.rows {
        let Some(ts) = row.timestamp else { continue };
        if let Some(actual) = row.actual {
            chart.actual.push((ts, actual));
        }
        if let Some(predicted) = row.predicted {
            chart.predicted.push((ts, predicted));
        }
    }
    chart
}
