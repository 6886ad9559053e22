use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::timestamp;

/// Seasonal model output for one hourly step, history or horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalForecastPoint {
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// Row layout of the forecast CSV offered for download on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastDownloadRow {
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
    pub predicted_energy_kwh: f64,
    pub prediction_lower_bound: f64,
    pub prediction_upper_bound: f64,
}

impl From<&SeasonalForecastPoint> for ForecastDownloadRow {
    fn from(point: &SeasonalForecastPoint) -> Self {
        Self {
            timestamp: point.timestamp,
            predicted_energy_kwh: point.yhat,
            prediction_lower_bound: point.yhat_lower,
            prediction_upper_bound: point.yhat_upper,
        }
    }
}
