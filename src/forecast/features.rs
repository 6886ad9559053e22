//! Feature engineering for forecasting models
//!
//! Turns an hourly series into the feature table the regressors train on:
//! calendar fields, lagged targets and trailing rolling means.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::domain::{FeatureRow, TimeSeries};

/// Longest look-back of any derived feature; this many leading rows are dropped.
pub const MAX_LOOKBACK: usize = 24;

/// Calendar fields of a timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFeatures {
    /// Hour of day (0-23)
    pub hour: u32,
    /// Day of week (0=Monday, 6=Sunday)
    pub dayofweek: u32,
    /// Month (1-12)
    pub month: u32,
}

/// Extract calendar features from a timestamp
pub fn calendar_features(timestamp: NaiveDateTime) -> CalendarFeatures {
    CalendarFeatures {
        hour: timestamp.hour(),
        dayofweek: timestamp.weekday().num_days_from_monday(),
        month: timestamp.month(),
    }
}

/// Value `lag` rows back, `None` for the first `lag` rows
pub fn lag(values: &[f64], lag: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| i.checked_sub(lag).map(|j| values[j]))
        .collect()
}

/// Trailing mean over `window` rows including the current one, `None` until
/// the window is full
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i + 1 < window {
            out.push(None);
            continue;
        }
        let slice = &values[i + 1 - window..=i];
        out.push(Some(slice.iter().sum::<f64>() / window as f64));
    }
    out
}

/// Build the feature table, keeping only rows where every feature is defined.
///
/// The result has exactly `series.len() - 24` rows (none for short series).
pub fn build_feature_table(series: &TimeSeries) -> Vec<FeatureRow> {
    let values = series.values();
    let lag_1h = lag(&values, 1);
    let lag_24h = lag(&values, MAX_LOOKBACK);
    let rolling_3h = rolling_mean(&values, 3);
    let rolling_24h = rolling_mean(&values, MAX_LOOKBACK);

    series
        .readings()
        .iter()
        .enumerate()
        .filter_map(|(i, reading)| {
            let calendar = calendar_features(reading.timestamp);
            Some(FeatureRow {
                timestamp: reading.timestamp,
                energy_kwh: reading.energy_kwh,
                hour: calendar.hour,
                dayofweek: calendar.dayofweek,
                month: calendar.month,
                lag_1h: lag_1h[i]?,
                lag_24h: lag_24h[i]?,
                rolling_3h: rolling_3h[i]?,
                rolling_24h: rolling_24h[i]?,
            })
        })
        .collect()
}
