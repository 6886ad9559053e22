//! Additive trend + seasonality model
//!
//! Wraps Prophet (`augurs`, Stan model run through the wasmstan optimizer):
//! piecewise-linear trend with automatic changepoints plus Fourier
//! seasonalities, with uncertainty intervals of width `interval_width`.
//! Seasonality flags left unset in the configuration use Prophet's automatic
//! rules (weekly from two weeks of history, yearly from two years).

use std::fmt::Display;

use augurs::prophet::{
    wasmstan::WasmstanOptimizer, PredictionData, Prophet, ProphetOptions, SeasonalityOption,
    TrainingData,
};
use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::config::SeasonalConfig;
use crate::domain::{ModelKind, SeasonalForecastPoint, TimeSeries};
use crate::error::{PipelineError, Result};

/// Fitted seasonal model.
pub struct SeasonalModel {
    prophet: Prophet<WasmstanOptimizer>,
    history: Vec<NaiveDateTime>,
}

impl std::fmt::Debug for SeasonalModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeasonalModel")
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl SeasonalModel {
    /// Fit over the whole series; at least two readings are required.
    pub fn fit(series: &TimeSeries, params: &SeasonalConfig) -> Result<Self> {
        if series.len() < 2 {
            return Err(fit_error("at least two readings are required"));
        }

        let history = series.timestamps();
        let data = TrainingData::new(epoch_seconds(&history), series.values()).map_err(fit_error)?;

        let mut prophet = Prophet::new(options(params)?, WasmstanOptimizer::new());
        prophet.fit(data, Default::default()).map_err(fit_error)?;

        debug!(
            rows = history.len(),
            daily = params.daily_seasonality,
            weekly = ?params.weekly_seasonality,
            yearly = ?params.yearly_seasonality,
            "seasonal model fitted"
        );
        Ok(Self { prophet, history })
    }

    /// Forecast every history timestamp plus `horizon` further hourly steps.
    pub fn forecast(&self, horizon: usize) -> Result<Vec<SeasonalForecastPoint>> {
        let end = self.end();
        let future = (1..=horizon as i64).map(|h| end + Duration::hours(h));
        let timestamps: Vec<NaiveDateTime> = self.history.iter().copied().chain(future).collect();
        self.predict(&timestamps)
    }

    /// Predict arbitrary timestamps.
    pub fn predict(&self, timestamps: &[NaiveDateTime]) -> Result<Vec<SeasonalForecastPoint>> {
        if timestamps.is_empty() {
            return Ok(Vec::new());
        }

        let predictions = self
            .prophet
            .predict(Some(PredictionData::new(epoch_seconds(timestamps))))
            .map_err(fit_error)?;

        // Bounds are absent only when uncertainty sampling is disabled
        let yhat = predictions.yhat;
        let lower = yhat.lower.unwrap_or_else(|| yhat.point.clone());
        let upper = yhat.upper.unwrap_or_else(|| yhat.point.clone());

        Ok(timestamps
            .iter()
            .zip(yhat.point)
            .zip(lower.into_iter().zip(upper))
            .map(|((&timestamp, yhat), (yhat_lower, yhat_upper))| SeasonalForecastPoint {
                timestamp,
                yhat,
                yhat_lower,
                yhat_upper,
            })
            .collect())
    }

    /// Last history timestamp
    pub fn end(&self) -> NaiveDateTime {
        self.history.last().copied().unwrap_or_default()
    }
}

/// Prophet options for a seasonal configuration block
pub fn options(params: &SeasonalConfig) -> Result<ProphetOptions> {
    Ok(ProphetOptions {
        daily_seasonality: SeasonalityOption::Manual(params.daily_seasonality),
        weekly_seasonality: seasonality(params.weekly_seasonality),
        yearly_seasonality: seasonality(params.yearly_seasonality),
        changepoint_prior_scale: params
            .changepoint_prior_scale
            .try_into()
            .map_err(|e| invalid("changepoint_prior_scale", e))?,
        seasonality_prior_scale: params
            .seasonality_prior_scale
            .try_into()
            .map_err(|e| invalid("seasonality_prior_scale", e))?,
        interval_width: params
            .interval_width
            .try_into()
            .map_err(|e| invalid("interval_width", e))?,
        ..Default::default()
    })
}

fn seasonality(flag: Option<bool>) -> SeasonalityOption {
    flag.map_or(SeasonalityOption::Auto, SeasonalityOption::Manual)
}

fn epoch_seconds(timestamps: &[NaiveDateTime]) -> Vec<i64> {
    timestamps.iter().map(|ts| ts.and_utc().timestamp()).collect()
}

fn fit_error(reason: impl Display) -> PipelineError {
    PipelineError::fit(ModelKind::Seasonal, reason)
}

fn invalid(field: &str, reason: impl Display) -> PipelineError {
    fit_error(format!("invalid {field}: {reason}"))
}
