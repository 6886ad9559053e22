//! Model comparison summary table

use std::path::Path;

use super::{open_reader, require_columns, series::write_rows};
use crate::domain::EvaluationRow;
use crate::error::{PipelineError, Result};

pub const SUMMARY_COLUMNS: [&str; 3] = ["Model", "RMSE", "MAE"];

pub fn write_summary(path: &Path, rows: &[EvaluationRow]) -> Result<()> {
    write_rows(path, rows, &SUMMARY_COLUMNS)
}

pub fn read_summary(path: &Path) -> Result<Vec<EvaluationRow>> {
    let mut rdr = open_reader(path).map_err(|e| match e {
        PipelineError::InputMissing(p) => PipelineError::ArtifactMissing(p),
        other => other,
    })?;
    let headers = rdr.headers()?.clone();
    require_columns(path, &headers, &SUMMARY_COLUMNS)?;

    rdr.deserialize()
        .map(|row| row.map_err(|e| PipelineError::malformed(path, e.to_string())))
        .collect()
}
