//! Per-model prediction tables

use std::path::Path;

use chrono::NaiveDateTime;
use csv::StringRecord;
use serde::Serialize;

use super::{column_index, open_reader, require_columns, series::write_rows};
use crate::domain::{timestamp, PredictionRecord};
use crate::error::{PipelineError, Result};

pub const PREDICTION_COLUMNS: [&str; 5] = [
    "timestamp",
    "actual",
    "predicted",
    "predicted_lower",
    "predicted_upper",
];

/// Time column names accepted when reading prediction tables
const TIME_COLUMNS: [&str; 2] = ["timestamp", "ds"];

pub fn write_predictions(path: &Path, records: &[PredictionRecord]) -> Result<()> {
    write_rows(path, records, &PREDICTION_COLUMNS)
}

/// A prediction row as read back from disk; any cell may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StoredPrediction {
    pub timestamp: Option<NaiveDateTime>,
    pub actual: Option<f64>,
    pub predicted: Option<f64>,
}

impl StoredPrediction {
    pub fn is_complete(&self) -> bool {
        self.actual.is_some() && self.predicted.is_some()
    }
}

/// Prediction table loaded leniently, for evaluation and display.
#[derive(Debug, Clone, Default)]
pub struct StoredPredictions {
    pub rows: Vec<StoredPrediction>,
    /// Whether a `timestamp` or `ds` column was present
    pub has_time_column: bool,
}

impl StoredPredictions {
    pub fn actual(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.actual).collect()
    }

    pub fn predicted(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.predicted).collect()
    }

    pub fn complete_rows(&self) -> impl Iterator<Item = &StoredPrediction> {
        self.rows.iter().filter(|r| r.is_complete())
    }
}

/// Read a prediction table written by any trainer (or by an older tool).
///
/// Requires `actual` and `predicted` columns; the time column may be named
/// `timestamp` or `ds` and is optional. Empty and `NaN` cells are missing
/// values; any other unparseable number is malformed input.
pub fn read_predictions(path: &Path) -> Result<StoredPredictions> {
    let mut rdr = open_reader(path)?;
    let headers = rdr.headers()?.clone();
    require_columns(path, &headers, &["actual", "predicted"])?;

    let actual_idx = column_index(&headers, "actual");
    let predicted_idx = column_index(&headers, "predicted");
    let time_idx = TIME_COLUMNS.iter().find_map(|c| column_index(&headers, c));

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let line = i + 1;
        rows.push(StoredPrediction {
            timestamp: time_idx
                .and_then(|idx| record.get(idx))
                .and_then(timestamp::parse),
            actual: numeric_cell(&record, actual_idx, path, line)?,
            predicted: numeric_cell(&record, predicted_idx, path, line)?,
        });
    }

    Ok(StoredPredictions {
        rows,
        has_time_column: time_idx.is_some(),
    })
}

/// Parse a numeric cell; empty and non-finite cells are missing values.
pub(crate) fn numeric_cell(
    record: &StringRecord,
    idx: Option<usize>,
    path: &Path,
    line: usize,
) -> Result<Option<f64>> {
    let Some(raw) = idx.and_then(|i| record.get(i)) else {
        return Ok(None);
    };
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        Ok(_) => Ok(None),
        Err(_) => Err(PipelineError::malformed(
            path,
            format!("row {line}: '{raw}' is not a number"),
        )),
    }
}
