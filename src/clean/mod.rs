//! Cleaning transforms for weather frames.
//!
//! Every function here is pure: it borrows a frame and returns a new one.
//! [`build_canonical`] is all-or-nothing; the best-effort orchestration that
//! chains the other transforms lives in [`pipeline`].

use chrono::format::{Item, StrftimeItems};
use polars::prelude::*;
use tracing::debug;

use crate::domain::{
    CanonicalRow, MissingValuePolicy, QualityReport, RawRecord, TEMPERATURE, TIME, canonical_frame, null_cells,
    numeric_column_names, numeric_values, require, timestamp_values, with_column,
};
use crate::error::PipelineError;
use crate::io::extract::extract_row;

pub mod pipeline;

pub use pipeline::*;

/// Every finite `f64` is exact at this many decimal places.
const EXACT_DECIMAL_PLACES: usize = 1074;

/// Build the five-column canonical frame from raw records.
///
/// The first extraction failure aborts the build; no partial frame is returned.
pub fn build_canonical(raw_rows: &[RawRecord]) -> Result<DataFrame, PipelineError> {
    let rows = raw_rows
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            extract_row(record).inspect_err(|e| debug!(row = idx, error = %e, "canonical build aborted"))
        })
        .collect::<Result<Vec<CanonicalRow>, PipelineError>>()?;
    canonical_frame(&rows)
}

/// Apply a missing-value policy to the numeric columns.
///
/// Nulls in text or timestamp columns never drop a row.
pub fn apply_missing_policy(frame: &DataFrame, policy: MissingValuePolicy) -> Result<DataFrame, PipelineError> {
    let numeric = numeric_column_names(frame);
    if policy == MissingValuePolicy::Keep || numeric.is_empty() {
        return Ok(frame.clone());
    }

    let lf = frame.clone().lazy();
    let out = match policy {
        MissingValuePolicy::Keep => lf,
        MissingValuePolicy::DropRows => {
            let complete = numeric
                .iter()
                .map(|name| col(name.as_str()).is_not_null())
                .reduce(|acc, e| acc.and(e))
                .unwrap_or_else(|| lit(true));
            lf.filter(complete)
        }
        // An all-null column has no median and stays null.
        MissingValuePolicy::ImputeMedian => lf.with_columns(
            numeric
                .iter()
                .map(|name| col(name.as_str()).fill_null(col(name.as_str()).median()))
                .collect::<Vec<_>>(),
        ),
    };
    Ok(out.collect()?)
}

/// Drop rows that repeat an earlier row, unless `keep_duplicates` is set.
pub fn deduplicate(frame: &DataFrame, keep_duplicates: bool) -> Result<DataFrame, PipelineError> {
    if keep_duplicates {
        return Ok(frame.clone());
    }
    Ok(frame
        .clone()
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?)
}

/// Number of rows that repeat an earlier row across every column.
pub fn duplicate_count(frame: &DataFrame) -> Result<usize, PipelineError> {
    Ok(frame.height() - deduplicate(frame, false)?.height())
}

/// Round a numeric column to `decimals` places. Nulls pass through.
pub fn round_column(frame: &DataFrame, column: &str, decimals: i32) -> Result<DataFrame, PipelineError> {
    let places = usize::try_from(decimals)
        .map_err(|_| PipelineError::invalid(format!("decimals must be >= 0, got {decimals}")))?;
    let rounded: Vec<Option<f64>> = numeric_values(frame, column)?
        .into_iter()
        .map(|v| v.map(|x| round_to(x, places)))
        .collect();
    with_column(frame, Column::new(column.into(), rounded))
}

/// Round via the decimal rendering, which keeps rounding idempotent.
fn round_to(x: f64, places: usize) -> f64 {
    if !x.is_finite() || places >= EXACT_DECIMAL_PLACES {
        return x;
    }
    format!("{x:.places$}").parse().unwrap_or(x)
}

/// Render `Tid` as text using a strftime `pattern`.
pub fn format_timestamp(frame: &DataFrame, pattern: &str) -> Result<DataFrame, PipelineError> {
    let timestamps = timestamp_values(require(frame, TIME)?)?;
    validate_pattern(pattern)?;

    let rendered: Vec<Option<String>> = timestamps
        .iter()
        .map(|ts| ts.map(|t| t.format(pattern).to_string()))
        .collect();
    with_column(frame, Column::new(TIME.into(), rendered))
}

fn validate_pattern(pattern: &str) -> Result<(), PipelineError> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(PipelineError::invalid(format!("invalid timestamp pattern `{pattern}`")));
    }
    Ok(())
}

/// Keep rows whose `column` value is strictly greater than `threshold`.
pub fn filter_above(frame: &DataFrame, column: &str, threshold: f64) -> Result<DataFrame, PipelineError> {
    numeric_values(frame, column)?;
    Ok(frame
        .clone()
        .lazy()
        .filter(col(column).gt(lit(threshold)))
        .collect()?)
}

/// Convenience wrapper for the temperature threshold stage.
pub fn filter_temperature_above(frame: &DataFrame, threshold: f64) -> Result<DataFrame, PipelineError> {
    filter_above(frame, TEMPERATURE, threshold)
}

/// Count duplicate rows and null cells.
pub fn quality_report(frame: &DataFrame) -> Result<QualityReport, PipelineError> {
    Ok(QualityReport {
        duplicate_count: duplicate_count(frame)?,
        missing_value_count: null_cells(frame),
    })
}
