//! Export frames and model outputs to CSV / JSON.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream
//! plotting scripts. The cleaned frame keeps the canonical header
//! `Tid,Temperatur,Fuktighet,Trykk,Vindhastighet`.

use std::fs::File;
use std::path::Path;

use polars::prelude::*;

use crate::domain::{ColumnKind, DiagnosticRow, EvaluationResult, text_values, timestamp_column};
use crate::error::PipelineError;
use crate::io::extract::parse_timestamp;

/// Rendering of typed timestamps in CSV exports (RFC 3339, UTC).
const CSV_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Header of the diagnostics export.
pub const DIAGNOSTIC_COLUMNS: [&str; 5] = ["Tid", "Dag", "Faktisk", "Predikert", "Feil"];

/// Write a frame as CSV. Nulls become empty cells.
pub fn write_table_csv(path: &Path, table: &DataFrame) -> Result<(), PipelineError> {
    write_csv(path, &mut table.clone(), None)
}

fn write_csv(path: &Path, frame: &mut DataFrame, float_precision: Option<usize>) -> Result<(), PipelineError> {
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    CsvWriter::new(file)
        .include_header(true)
        .with_datetime_format(Some(CSV_DATETIME_FORMAT.to_string()))
        .with_float_precision(float_precision)
        .finish(frame)?;
    Ok(())
}

/// Read a CSV written by [`write_table_csv`].
///
/// Numeric columns are read as `Float64`. A text column whose non-empty cells
/// all parse as RFC 3339 timestamps becomes a timestamp column; anything else
/// stays text.
pub fn read_table_csv(path: &Path) -> Result<DataFrame, PipelineError> {
    if !path.is_file() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        return Err(PipelineError::io(path, source));
    }
    let frame = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(None)
        .finish()?
        .collect()?;

    let columns = frame
        .get_columns()
        .iter()
        .map(infer_column)
        .collect::<Result<Vec<_>, PipelineError>>()?;
    Ok(DataFrame::new(columns)?)
}

fn infer_column(column: &Column) -> Result<Column, PipelineError> {
    match ColumnKind::of(column) {
        ColumnKind::Numeric => Ok(column.cast(&DataType::Float64)?),
        ColumnKind::Text => {
            let raw = text_values(column)?;
            let parsed: Vec<_> = raw.iter().map(|s| s.as_deref().and_then(parse_timestamp)).collect();
            let all_timestamps = raw.iter().zip(&parsed).all(|(s, ts)| s.is_none() || ts.is_some());
            if all_timestamps && raw.iter().any(Option::is_some) {
                timestamp_column(column.name(), parsed)
            } else {
                Ok(column.clone())
            }
        }
        // A column of empty cells reads back as all-null text.
        _ => Ok(column.cast(&DataType::String)?),
    }
}

/// Write `{model: {"R^2": .., "RMSE": ..}}` as pretty JSON.
pub fn write_evaluation_json(path: &Path, result: &EvaluationResult) -> Result<(), PipelineError> {
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    serde_json::to_writer_pretty(file, result)?;
    Ok(())
}

/// Diagnostics as a frame with the export header.
pub fn diagnostics_table(rows: &[DiagnosticRow]) -> Result<DataFrame, PipelineError> {
    let [tid, day, actual, predicted, error] = DIAGNOSTIC_COLUMNS;
    let frame = DataFrame::new(vec![
        timestamp_column(tid, rows.iter().map(|r| r.timestamp))?,
        Column::new(
            day.into(),
            rows.iter().map(|r| r.day.map(|d| d.to_string())).collect::<Vec<_>>(),
        ),
        Column::new(actual.into(), rows.iter().map(|r| r.actual).collect::<Vec<_>>()),
        Column::new(predicted.into(), rows.iter().map(|r| r.predicted).collect::<Vec<_>>()),
        Column::new(error.into(), rows.iter().map(|r| r.abs_error).collect::<Vec<_>>()),
    ])?;
    Ok(frame)
}

/// Write per-prediction diagnostics as CSV, values to four decimals.
pub fn write_diagnostics_csv(path: &Path, rows: &[DiagnosticRow]) -> Result<(), PipelineError> {
    write_csv(path, &mut diagnostics_table(rows)?, Some(4))
}
