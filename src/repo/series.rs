//! Raw series and feature table files

use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;

use super::{column_index, create_writer, numeric_cell, open_reader, reader_from, require_columns};
use crate::domain::{timestamp, EnergyReading, FeatureRow, TimeSeries, FEATURE_COLUMNS, TARGET_COLUMN};
use crate::error::{PipelineError, Result};

pub const SERIES_COLUMNS: [&str; 2] = ["timestamp", TARGET_COLUMN];

/// Read a `timestamp,energy_kwh` file. Extra columns are ignored, so the
/// feature table can be read as a plain series too.
pub fn read_series(path: &Path) -> Result<TimeSeries> {
    let rdr = open_reader(path)?;
    parse_series(rdr, path)
}

/// A user-supplied series after cleanup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadedSeries {
    pub series: TimeSeries,
    /// Rows skipped for a blank or `NaN` energy value
    pub dropped_rows: usize,
    /// Rows arrived out of timestamp order and were sorted
    pub reordered: bool,
}

/// Lenient reader for uploads: rows with a blank or `NaN` energy value are
/// skipped and the rest sorted by timestamp. Unparseable timestamps, non-numeric
/// values and duplicate timestamps are still malformed input.
pub fn read_upload_from<R: Read>(source: R, label: &Path) -> Result<UploadedSeries> {
    let mut rdr = reader_from(source);
    let headers = rdr.headers()?.clone();
    require_columns(label, &headers, &SERIES_COLUMNS)?;
    let time_idx = column_index(&headers, SERIES_COLUMNS[0]);
    let value_idx = column_index(&headers, TARGET_COLUMN);

    let mut readings = Vec::new();
    let mut dropped_rows = 0;
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let line = i + 1;
        let raw_time = time_idx.and_then(|idx| record.get(idx)).unwrap_or_default();
        let ts = timestamp::parse(raw_time).ok_or_else(|| {
            PipelineError::malformed(label, format!("row {line}: '{raw_time}' is not a timestamp"))
        })?;
        match numeric_cell(&record, value_idx, label, line)? {
            Some(value) => readings.push(EnergyReading::new(ts, value)),
            None => dropped_rows += 1,
        }
    }

    let reordered = readings.windows(2).any(|w| w[1].timestamp < w[0].timestamp);
    readings.sort_by_key(|r| r.timestamp);
    let series = TimeSeries::new(readings).map_err(|e| PipelineError::malformed(label, e.to_string()))?;

    Ok(UploadedSeries {
        series,
        dropped_rows,
        reordered,
    })
}

pub fn write_series(path: &Path, series: &TimeSeries) -> Result<()> {
    write_rows(path, series.readings(), &SERIES_COLUMNS)
}

pub fn read_feature_table(path: &Path) -> Result<Vec<FeatureRow>> {
    let mut rdr = open_reader(path)?;
    let headers = rdr.headers()?.clone();
    let mut required = SERIES_COLUMNS.to_vec();
    required.extend_from_slice(&FEATURE_COLUMNS);
    require_columns(path, &headers, &required)?;

    let rows: Vec<FeatureRow> = deserialize_rows(&mut rdr, path)?;

    // Same ordering invariant as the source series
    TimeSeries::new(
        rows.iter()
            .map(|r| EnergyReading::new(r.timestamp, r.energy_kwh))
            .collect(),
    )
    .map_err(|e| PipelineError::malformed(path, e.to_string()))?;

    Ok(rows)
}

pub fn write_feature_table(path: &Path, rows: &[FeatureRow]) -> Result<()> {
    let mut header = SERIES_COLUMNS.to_vec();
    header.extend_from_slice(&FEATURE_COLUMNS);
    write_rows(path, rows, &header)
}

fn parse_series<R: Read>(mut rdr: csv::Reader<R>, path: &Path) -> Result<TimeSeries> {
    let headers = rdr.headers()?.clone();
    require_columns(path, &headers, &SERIES_COLUMNS)?;

    let readings: Vec<EnergyReading> = deserialize_rows(&mut rdr, path)?;
    TimeSeries::new(readings).map_err(|e| PipelineError::malformed(path, e.to_string()))
}

fn deserialize_rows<R: Read, T: DeserializeOwned>(
    rdr: &mut csv::Reader<R>,
    path: &Path,
) -> Result<Vec<T>> {
    rdr.deserialize()
        .enumerate()
        .map(|(i, row)| row.map_err(|e| PipelineError::malformed(path, format!("row {}: {e}", i + 1))))
        .collect()
}

/// Serialize `rows`; `header` is only written explicitly for an empty table.
pub(crate) fn write_rows<T: serde::Serialize>(path: &Path, rows: &[T], header: &[&str]) -> Result<()> {
    let mut writer = create_writer(path)?;
    if rows.is_empty() {
        writer.write_record(header)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::build_feature_table;
    use rstest::rstest;

    fn sample_series(n: usize) -> TimeSeries {
        let start = timestamp::parse("2024-01-01 00:00:00").unwrap();
        TimeSeries::new(
            (0..n)
                .map(|i| EnergyReading::new(start + chrono::Duration::hours(i as i64), 2.0 + i as f64 * 0.25))
                .collect(),
        )
        .unwrap()
    }

    /// Strict read of `csv` through a scratch file
    fn read_strict(csv: &str) -> Result<TimeSeries> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed_data.csv");
        std::fs::write(&path, csv).unwrap();
        read_series(&path)
    }

    #[test]
    fn test_series_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed/processed_data.csv");
        write_series(&path, &sample_series(2)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "timestamp,energy_kwh\n2024-01-01 00:00:00,2.0\n2024-01-01 01:00:00,2.25\n"
        );
        assert_eq!(read_series(&path).unwrap(), sample_series(2));
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed_data_features.csv");
        write_feature_table(&path, &[]).unwrap();

        assert!(read_feature_table(&path).unwrap().is_empty());
    }

    #[test]
    fn test_read_series_missing_column() {
        let csv = "timestamp,value\n2024-01-01 00:00:00,1.0\n";
        let err = read_strict(csv).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumns { .. }));
    }

    #[test]
    fn test_read_series_bad_value() {
        let csv = "timestamp,energy_kwh\n2024-01-01 00:00:00,abc\n";
        let err = read_strict(csv).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { .. }));
    }

    #[test]
    fn test_read_series_unordered() {
        let csv = "timestamp,energy_kwh\n2024-01-01 01:00:00,1.0\n2024-01-01 00:00:00,2.0\n";
        let err = read_strict(csv).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { .. }));
    }

    #[test]
    fn test_upload_skips_blank_values_and_sorts() {
        let csv = "timestamp,energy_kwh\n\
                   2024-01-01 02:00:00,3.0\n\
                   2024-01-01 00:00:00,1.0\n\
                   2024-01-01 01:00:00,\n\
                   2024-01-01 03:00:00,NaN\n\
                   2024-01-01 01:00:00,2.0\n";
        let upload = read_upload_from(csv.as_bytes(), Path::new("upload.csv")).unwrap();

        assert_eq!(upload.dropped_rows, 2);
        assert!(upload.reordered);
        assert_eq!(upload.series.values(), vec![1.0, 2.0, 3.0]);
        assert_eq!(
            timestamp::format(&upload.series.first().unwrap().timestamp),
            "2024-01-01 00:00:00"
        );
    }

    #[test]
    fn test_upload_in_order_is_untouched() {
        let csv = "timestamp,energy_kwh\n2024-01-01 00:00:00,1.0\n2024-01-01 01:00:00,2.0\n";
        let upload = read_upload_from(csv.as_bytes(), Path::new("upload.csv")).unwrap();

        assert_eq!(upload.dropped_rows, 0);
        assert!(!upload.reordered);
        assert_eq!(upload.series, read_strict(csv).unwrap());
    }

    #[rstest]
    #[case("timestamp,energy_kwh\n2024-01-01 00:00:00,abc\n")]
    #[case("timestamp,energy_kwh\nyesterday,1.0\n")]
    #[case("timestamp,energy_kwh\n2024-01-01 00:00:00,1.0\n2024-01-01 00:00:00,2.0\n")]
    fn test_upload_still_rejects_malformed_rows(#[case] csv: &str) {
        let err = read_upload_from(csv.as_bytes(), Path::new("upload.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { .. }));
    }

    #[test]
    fn test_feature_table_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed_data_features.csv");
        let rows = build_feature_table(&sample_series(30));
        write_feature_table(&path, &rows).unwrap();

        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with(
            "timestamp,energy_kwh,hour,dayofweek,month,lag_1h,lag_24h,rolling_3h,rolling_24h\n"
        ));
        assert_eq!(read_feature_table(&path).unwrap(), rows);

        // The feature table doubles as a plain series
        assert_eq!(read_series(&path).unwrap().len(), 6);
    }

    #[test]
    fn test_feature_table_rejects_raw_series() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed_data.csv");
        write_series(&path, &sample_series(3)).unwrap();

        let err = read_feature_table(&path).unwrap_err();
        match err {
            PipelineError::MissingColumns { columns, .. } => assert_eq!(columns.len(), 7),
            other => panic!("unexpected error: {other}"),
        }
    }
}
