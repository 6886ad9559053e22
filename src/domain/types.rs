use chrono::NaiveDateTime;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use thiserror::Error;

use super::timestamp;

// ============================================================================
// Time series
// ============================================================================

/// One hourly observation of the energy metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyReading {
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
    pub energy_kwh: f64,
}

impl EnergyReading {
    pub fn new(timestamp: NaiveDateTime, energy_kwh: f64) -> Self {
        Self {
            timestamp,
            energy_kwh,
        }
    }
}

/// Ordering violations detected when building a [`TimeSeries`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("timestamp {current} at row {index} does not follow {previous}")]
    NotIncreasing {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("non-finite energy value at row {index}")]
    NonFinite { index: usize },
}

/// A time-ordered series: strictly increasing timestamps, no duplicates,
/// finite values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    readings: Vec<EnergyReading>,
}

impl TimeSeries {
    pub fn new(readings: Vec<EnergyReading>) -> Result<Self, SeriesError> {
        if let Some(index) = readings.iter().position(|r| !r.energy_kwh.is_finite()) {
            return Err(SeriesError::NonFinite { index });
        }

        if let Some((index, (prev, cur))) = readings
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|(_, (prev, cur))| cur.timestamp <= prev.timestamp)
        {
            return Err(SeriesError::NotIncreasing {
                index: index + 1,
                previous: prev.timestamp,
                current: cur.timestamp,
            });
        }

        Ok(Self { readings })
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn readings(&self) -> &[EnergyReading] {
        &self.readings
    }

    pub fn values(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.energy_kwh).collect()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.readings.iter().map(|r| r.timestamp).collect()
    }

    pub fn first(&self) -> Option<&EnergyReading> {
        self.readings.first()
    }

    pub fn last(&self) -> Option<&EnergyReading> {
        self.readings.last()
    }
}

// ============================================================================
// Feature table
// ============================================================================

/// Model inputs, in the column order every regressor is trained with.
pub const FEATURE_COLUMNS: [&str; 7] = [
    "hour",
    "dayofweek",
    "month",
    "lag_1h",
    "lag_24h",
    "rolling_3h",
    "rolling_24h",
];

pub const TARGET_COLUMN: &str = "energy_kwh";

/// A reading extended with calendar, lag and rolling-window features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
    pub energy_kwh: f64,
    /// Hour of day (0-23)
    pub hour: u32,
    /// Day of week (0=Monday, 6=Sunday)
    pub dayofweek: u32,
    /// Month (1-12)
    pub month: u32,
    pub lag_1h: f64,
    pub lag_24h: f64,
    pub rolling_3h: f64,
    pub rolling_24h: f64,
}

impl FeatureRow {
    /// Feature values ordered as [`FEATURE_COLUMNS`]
    pub fn features(&self) -> Vec<f64> {
        vec![
            self.hour as f64,
            self.dayofweek as f64,
            self.month as f64,
            self.lag_1h,
            self.lag_24h,
            self.rolling_3h,
            self.rolling_24h,
        ]
    }

    pub fn target(&self) -> f64 {
        self.energy_kwh
    }
}

// ============================================================================
// Models and their artifacts
// ============================================================================

/// The three forecasting models of the pipeline.
///
/// Every artifact name is derived from here so that trainers, evaluator and
/// dashboard agree on file names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    #[strum(to_string = "Seasonal", serialize = "seasonal")]
    Seasonal,
    #[strum(to_string = "GradientBoosting", serialize = "gradient_boosting")]
    GradientBoosting,
    #[strum(to_string = "LinearRegression", serialize = "linear_regression")]
    LinearRegression,
}

impl ModelKind {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Seasonal => "seasonal",
            Self::GradientBoosting => "gradient_boosting",
            Self::LinearRegression => "linear_regression",
        }
    }

    /// Human-readable label used in plot titles and the dashboard
    pub fn label(&self) -> &'static str {
        match self {
            Self::Seasonal => "Seasonal",
            Self::GradientBoosting => "Gradient Boosting",
            Self::LinearRegression => "Linear Regression",
        }
    }

    pub fn predictions_file(&self) -> String {
        format!("predictions_{}.csv", self.slug())
    }

    pub fn plot_file(&self) -> String {
        format!("plot_forecast_{}.svg", self.slug())
    }
}

/// Persisted prediction for one timestamp.
///
/// `actual` is empty for rows beyond the known data; the bound columns are only
/// filled by the seasonal model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
    pub actual: Option<f64>,
    pub predicted: f64,
    pub predicted_lower: Option<f64>,
    pub predicted_upper: Option<f64>,
}

impl PredictionRecord {
    pub fn point(timestamp: NaiveDateTime, actual: f64, predicted: f64) -> Self {
        Self {
            timestamp,
            actual: Some(actual),
            predicted,
            predicted_lower: None,
            predicted_upper: None,
        }
    }
}

/// One row of the model comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRow {
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    #[serde(rename = "MAE")]
    pub mae: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    fn hourly(values: &[f64]) -> Vec<EnergyReading> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| EnergyReading::new(start + Duration::hours(i as i64), *v))
            .collect()
    }

    #[test]
    fn test_time_series_accepts_increasing() {
        let series = TimeSeries::new(hourly(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.values(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_time_series_rejects_duplicates() {
        let mut readings = hourly(&[1.0, 2.0, 3.0]);
        readings[2].timestamp = readings[1].timestamp;

        let err = TimeSeries::new(readings).unwrap_err();
        assert!(matches!(err, SeriesError::NotIncreasing { index: 2, .. }));
    }

    #[test]
    fn test_time_series_rejects_nan() {
        let err = TimeSeries::new(hourly(&[1.0, f64::NAN])).unwrap_err();
        assert_eq!(err, SeriesError::NonFinite { index: 1 });
    }

    #[test]
    fn test_model_kind_artifact_names() {
        assert_eq!(
            ModelKind::GradientBoosting.predictions_file(),
            "predictions_gradient_boosting.csv"
        );
        assert_eq!(
            ModelKind::LinearRegression.plot_file(),
            "plot_forecast_linear_regression.svg"
        );
        assert_eq!(ModelKind::iter().count(), 3);
    }

    #[test]
    fn test_model_kind_parses_slug_and_name() {
        assert_eq!(ModelKind::from_str("seasonal").unwrap(), ModelKind::Seasonal);
        assert_eq!(
            ModelKind::from_str("LinearRegression").unwrap(),
            ModelKind::LinearRegression
        );
        assert!(ModelKind::from_str("arima").is_err());
        assert_eq!(ModelKind::GradientBoosting.to_string(), "GradientBoosting");
    }

    #[test]
    fn test_feature_vector_order() {
        let row = FeatureRow {
            timestamp: hourly(&[0.0])[0].timestamp,
            energy_kwh: 4.0,
            hour: 1,
            dayofweek: 2,
            month: 3,
            lag_1h: 4.5,
            lag_24h: 5.5,
            rolling_3h: 6.5,
            rolling_24h: 7.5,
        };
        assert_eq!(row.features(), vec![1.0, 2.0, 3.0, 4.5, 5.5, 6.5, 7.5]);
        assert_eq!(row.features().len(), FEATURE_COLUMNS.len());
    }
}
