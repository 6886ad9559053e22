//! Flat-file persistence for pipeline artifacts.
//!
//! Every table is a headed CSV file. Readers check required columns up front
//! so a malformed file fails with the list of what is missing rather than a
//! deserialization error on the first row.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use csv::StringRecord;

use crate::error::{PipelineError, Result};

pub mod evaluation;
pub mod predictions;
pub mod series;

pub use evaluation::*;
pub use predictions::*;
pub use series::*;

/// Open a CSV file for reading; a missing file is `InputMissing`.
pub(crate) fn open_reader(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PipelineError::InputMissing(path.to_path_buf()),
        _ => PipelineError::Io(e),
    })?;
    Ok(reader_from(file))
}

pub(crate) fn reader_from<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source)
}

/// Create (or truncate) a CSV file, creating parent directories.
pub(crate) fn create_writer(path: &Path) -> Result<csv::Writer<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(csv::Writer::from_path(path)?)
}

/// Fail with `MissingColumns` unless every required column is present.
pub(crate) fn require_columns(path: &Path, headers: &StringRecord, required: &[&str]) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::MissingColumns {
            path: path.to_path_buf(),
            columns: missing,
        })
    }
}

pub(crate) fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}
