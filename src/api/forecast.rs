//! On-demand seasonal forecast for uploaded CSV data
//!
//! Shared by the dashboard page and the JSON/CSV API: parse the multipart
//! form, validate it, fit on the blocking pool and package the result.

use std::path::Path;

use axum::body::Bytes;
use axum::extract::Multipart;
use validator::Validate;

use super::{error::ApiError, AppState};
use crate::config::SeasonalConfig;
use crate::domain::{EnergyReading, ForecastDownloadRow, SeasonalForecastPoint, TimeSeries};
use crate::forecast::ForecastMetrics;
use crate::ml::{training::join_actuals, SeasonalModel};
use crate::repo::read_upload_from;

pub const MIN_HORIZON_HOURS: u32 = 6;
pub const MAX_HORIZON_HOURS: u32 = 168;
pub const HORIZON_STEP_HOURS: u32 = 6;
pub const DEFAULT_HORIZON_HOURS: u32 = 24;
pub const PREVIEW_ROWS: usize = 5;
pub const DOWNLOAD_FILE_NAME: &str = "uploaded_forecast_results.csv";

/// Parsed upload form
#[derive(Debug, Clone, Validate)]
pub struct ForecastRequest {
    pub file_name: Option<String>,
    pub csv: Bytes,
    #[validate(range(min = 6, max = 168))]
    pub horizon_hours: u32,
}

impl ForecastRequest {
    /// Read the `file` and `horizon_hours` fields; other fields are ignored.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut upload: Option<(Option<String>, Bytes)> = None;
        let mut horizon_hours = DEFAULT_HORIZON_HOURS;

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("file") => {
                    let file_name = field.file_name().map(str::to_owned);
                    upload = Some((file_name, field.bytes().await?));
                }
                Some("horizon_hours") => {
                    let raw = field.text().await?;
                    horizon_hours = parse_horizon(&raw)?;
                }
                _ => {}
            }
        }

        let (file_name, csv) =
            upload.ok_or_else(|| ApiError::ValidationError("no CSV file was uploaded".to_string()))?;
        Ok(Self {
            file_name,
            csv,
            horizon_hours,
        })
    }

    /// Range and step checks on the horizon, and a non-empty file
    pub fn check(&self) -> Result<(), ApiError> {
        self.validate()?;
        if self.horizon_hours % HORIZON_STEP_HOURS != 0 {
            return Err(ApiError::ValidationError(format!(
                "horizon_hours must be a multiple of {HORIZON_STEP_HOURS}, got {}",
                self.horizon_hours
            )));
        }
        if self.csv.iter().all(u8::is_ascii_whitespace) {
            return Err(ApiError::ValidationError("uploaded file is empty".to_string()));
        }
        Ok(())
    }

    fn label(&self) -> &Path {
        Path::new(self.file_name.as_deref().unwrap_or("upload.csv"))
    }
}

fn parse_horizon(raw: &str) -> Result<u32, ApiError> {
    raw.trim().parse().map_err(|_| {
        ApiError::ValidationError(format!("horizon_hours must be a whole number of hours, got '{}'", raw.trim()))
    })
}

/// Result of forecasting an upload
#[derive(Debug, Clone)]
pub struct UploadForecast {
    pub history: TimeSeries,
    pub horizon_hours: u32,
    pub points: Vec<SeasonalForecastPoint>,
    /// Rows skipped for a blank or `NaN` energy value
    pub dropped_rows: usize,
    /// Upload rows were sorted by timestamp before fitting
    pub reordered: bool,
    /// Accuracy over timestamps present in both the upload and the forecast
    pub overlap: Option<ForecastMetrics>,
}

impl UploadForecast {
    pub fn preview(&self) -> &[EnergyReading] {
        let readings = self.history.readings();
        &readings[..readings.len().min(PREVIEW_ROWS)]
    }

    pub fn download_rows(&self) -> Vec<ForecastDownloadRow> {
        self.points.iter().map(ForecastDownloadRow::from).collect()
    }

    /// Forecast as `timestamp,predicted_energy_kwh,prediction_lower_bound,prediction_upper_bound`
    pub fn to_csv(&self) -> Result<String, ApiError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in self.download_rows() {
            writer
                .serialize(row)
                .map_err(|e| ApiError::InternalError(e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| ApiError::InternalError(e.to_string()))
    }
}

/// Fit on the upload and forecast `horizon_hours` past its end.
pub fn run_forecast(request: &ForecastRequest, params: &SeasonalConfig) -> Result<UploadForecast, ApiError> {
    let upload = read_upload_from(&request.csv[..], request.label())?;
    let history = upload.series;

    let model = SeasonalModel::fit(&history, &upload_params(params))?;
    let points = model.forecast(request.horizon_hours as usize)?;

    let joined = join_actuals(&history, &points);
    let actual: Vec<Option<f64>> = joined.iter().map(|r| r.actual).collect();
    let predicted: Vec<Option<f64>> = joined.iter().map(|r| Some(r.predicted)).collect();
    let overlap = ForecastMetrics::calculate_complete(&actual, &predicted).ok();

    Ok(UploadForecast {
        history,
        horizon_hours: request.horizon_hours,
        points,
        dropped_rows: upload.dropped_rows,
        reordered: upload.reordered,
        overlap,
    })
}

/// Uploads always fit daily seasonality; weekly and yearly follow the length
/// of the upload rather than the pipeline configuration.
fn upload_params(params: &SeasonalConfig) -> SeasonalConfig {
    SeasonalConfig {
        daily_seasonality: true,
        weekly_seasonality: None,
        yearly_seasonality: None,
        ..params.clone()
    }
}

/// Validate, then fit on the blocking pool.
pub async fn forecast_upload(state: &AppState, request: ForecastRequest) -> Result<UploadForecast, ApiError> {
    request.check()?;
    let params = state.cfg.seasonal.clone();
    let bytes = request.csv.len();
    let horizon_hours = request.horizon_hours;

    let result = tokio::task::spawn_blocking(move || run_forecast(&request, &params)).await?;
    match &result {
        Ok(forecast) => tracing::info!(
            bytes,
            history = forecast.history.len(),
            horizon_hours,
            "upload forecast completed"
        ),
        Err(e) => tracing::warn!(error = %e, horizon_hours, "upload forecast rejected"),
    }
    result
}
