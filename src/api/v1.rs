use std::str::FromStr;

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};

use super::{
    error::ApiError,
    forecast::{forecast_upload, ForecastRequest, DOWNLOAD_FILE_NAME},
    response::ApiResponse,
    AppState,
};
use crate::domain::{EvaluationRow, ModelKind};
use crate::error::PipelineError;
use crate::repo::{read_predictions, read_summary, StoredPrediction};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/forecast", post(post_forecast))
        .route("/evaluation", get(get_evaluation))
        .route("/predictions/:model", get(get_predictions))
}

/// POST /api/v1/forecast - forecast an uploaded CSV, answered as a CSV attachment
async fn post_forecast(State(state): State<AppState>, multipart: Multipart) -> Result<Response, ApiError> {
    let request = ForecastRequest::from_multipart(multipart).await?;
    let forecast = forecast_upload(&state, request).await?;
    let csv = forecast.to_csv()?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\""),
            ),
        ],
        csv,
    )
        .into_response())
}

/// GET /api/v1/evaluation - latest model comparison table
async fn get_evaluation(State(state): State<AppState>) -> Result<ApiResponse<Vec<EvaluationRow>>, ApiError> {
    let rows = read_summary(&state.cfg.evaluation_summary_path())?;
    let count = rows.len();
    Ok(ApiResponse::success(rows).with_count(count))
}

/// GET /api/v1/predictions/:model - stored predictions of one model
async fn get_predictions(
    State(state): State<AppState>,
    Path(model): Path<String>,
) -> Result<ApiResponse<Vec<StoredPrediction>>, ApiError> {
    let kind = ModelKind::from_str(&model)
        .map_err(|_| ApiError::NotFound(format!("unknown model '{model}'")))?;

    let stored = read_predictions(&state.cfg.predictions_path(kind)).map_err(|e| match e {
        PipelineError::InputMissing(path) => PipelineError::ArtifactMissing(path),
        other => other,
    })?;
    let count = stored.rows.len();
    Ok(ApiResponse::success(stored.rows).with_count(count))
}
