//! Best-effort cleaning orchestration.
//!
//! build → quality report → missing policy → dedup → timestamp formatting →
//! optional rounding → optional temperature filter → optional CSV export.
//!
//! Errors up to and including dedup are fatal. A failing later stage is logged, recorded in
//! [`CleaningRun::failures`], and skipped; the table from the previous stage
//! flows on to the next one.

use polars::prelude::DataFrame;
use tracing::{info, warn};

use crate::clean::{
    apply_missing_policy, build_canonical, deduplicate, filter_temperature_above, format_timestamp,
    quality_report, round_column,
};
use crate::domain::{CleaningConfig, QualityReport, RawRecord};
use crate::error::PipelineError;
use crate::io::export::write_table_csv;

/// Stage names as they appear in logs and [`StageFailure`]s.
pub mod stage {
    pub const FORMAT_TIMESTAMP: &str = "format_timestamp";
    pub const ROUND: &str = "round_column";
    pub const FILTER: &str = "filter_above";
    pub const EXPORT: &str = "export_csv";
}

/// A best-effort stage that did not apply.
#[derive(Debug)]
pub struct StageFailure {
    pub stage: &'static str,
    pub error: PipelineError,
}

/// Output of [`run_pipeline`].
#[derive(Debug)]
pub struct CleaningRun {
    pub table: DataFrame,
    /// Counts taken right after the build, before any transform.
    pub quality: QualityReport,
    pub failures: Vec<StageFailure>,
}

impl CleaningRun {
    pub fn all_stages_applied(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run the full cleaning sequence over raw records.
pub fn run_pipeline(raw_rows: &[RawRecord], config: &CleaningConfig) -> Result<CleaningRun, PipelineError> {
    let mut table = build_canonical(raw_rows)?;
    info!(rows = table.height(), "built canonical table");

    let quality = quality_report(&table)?;
    info!(
        duplicates = quality.duplicate_count,
        missing = quality.missing_value_count,
        "data quality before cleaning"
    );

    let mut failures = Vec::new();

    table = apply_missing_policy(&table, config.missing_policy)?;
    info!(policy = %config.missing_policy, rows = table.height(), "applied missing-value policy");

    table = deduplicate(&table, config.keep_duplicates)?;
    info!(keep_duplicates = config.keep_duplicates, rows = table.height(), "deduplicated");

    if let Some(pattern) = &config.timestamp_format {
        table = best_effort(stage::FORMAT_TIMESTAMP, table, &mut failures, |t| {
            format_timestamp(t, pattern)
        });
    }

    if let Some((column, decimals)) = &config.round {
        table = best_effort(stage::ROUND, table, &mut failures, |t| round_column(t, column, *decimals));
    }

    if let Some(threshold) = config.temperature_threshold {
        table = best_effort(stage::FILTER, table, &mut failures, |t| {
            filter_temperature_above(t, threshold)
        });
    }

    if let Some(path) = &config.export_csv {
        match write_table_csv(path, &table) {
            Ok(()) => info!(path = %path.display(), "exported cleaned table"),
            Err(error) => {
                warn!(stage = stage::EXPORT, %error, "stage failed, continuing");
                failures.push(StageFailure {
                    stage: stage::EXPORT,
                    error,
                });
            }
        }
    }

    Ok(CleaningRun {
        table,
        quality,
        failures,
    })
}

fn best_effort<F>(name: &'static str, table: DataFrame, failures: &mut Vec<StageFailure>, stage_fn: F) -> DataFrame
where
    F: FnOnce(&DataFrame) -> Result<DataFrame, PipelineError>,
{
    match stage_fn(&table) {
        Ok(next) => {
            info!(stage = name, rows = next.height(), "stage applied");
            next
        }
        Err(error) => {
            warn!(stage = name, %error, "stage failed, continuing");
            failures.push(StageFailure { stage: name, error });
            table
        }
    }
}
