//! Reporting utilities: per-day error summaries and formatted terminal output.

pub mod format;

pub use format::*;

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::DiagnosticRow;

/// Mean absolute prediction error for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyError {
    pub day: NaiveDate,
    pub mean_abs_error: f64,
    pub n: usize,
}

/// Group diagnostics by day, oldest first. Rows without a date are skipped.
pub fn daily_errors(rows: &[DiagnosticRow]) -> Vec<DailyError> {
    let mut sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for row in rows {
        if let Some(day) = row.day {
            let entry = sums.entry(day).or_insert((0.0, 0));
            entry.0 += row.abs_error;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(day, (sum, n))| DailyError {
            day,
            mean_abs_error: sum / n as f64,
            n,
        })
        .collect()
}
