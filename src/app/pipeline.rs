//! Shared workflow logic used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! raw records -> cleaning -> statistics -> train/test split -> fit -> evaluation
//!
//! The command handlers in `app` can then focus on presentation and exports.

use std::path::PathBuf;

use polars::prelude::*;
use tracing::{info, warn};

use crate::clean::{CleaningRun, apply_missing_policy, run_pipeline};
use crate::data::generate_records;
use crate::domain::{
    AnalysisConfig, CleaningConfig, ColumnKind, ColumnSummary, DiagnosticRow, EvaluationResult, MissingValuePolicy,
    RawRecord, SOURCE_TIME, SplitConfig, TIME, null_cells, numeric_values, require, timestamp_column,
};
use crate::error::PipelineError;
use crate::io::extract::extract_timestamp;
use crate::io::ingest::{load_raw_records, text_column};
use crate::predict::PredictionPipeline;
use crate::stats::{OutlierReport, StatisticsEngine};

/// Column name given to a raw categorical field joined into the model table.
pub const CATEGORY_COLUMN: &str = "Kategori";

/// Where raw records come from.
#[derive(Debug, Clone)]
pub enum RecordSource {
    File { path: PathBuf, list_path: String },
    Synthetic { count: usize, seed: u64 },
}

pub fn load_records(source: &RecordSource) -> Result<Vec<RawRecord>, PipelineError> {
    let records = match source {
        RecordSource::File { path, list_path } => load_raw_records(path, list_path)?,
        RecordSource::Synthetic { count, seed } => generate_records(*count, *seed)?,
    };
    info!(records = records.len(), "loaded raw records");
    Ok(records)
}

/// Everything `wx analyze` prints.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub summaries: Vec<ColumnSummary>,
    pub correlations: Vec<(String, Vec<f64>)>,
    pub outliers: OutlierReport,
    pub trend_column: String,
    pub window: usize,
    pub raw: Vec<Option<f64>>,
    pub trend: Vec<Option<f64>>,
}

pub fn run_analysis(table: &DataFrame, config: &AnalysisConfig) -> Result<AnalysisOutput, PipelineError> {
    let engine = StatisticsEngine::new(table);
    let outliers = engine.detect_outliers(config.outlier_threshold)?;
    let trend = engine.rolling_trend(&config.trend_column, config.window)?;
    info!(outliers = outliers.len(), "statistics computed");

    Ok(AnalysisOutput {
        summaries: engine.describe(),
        correlations: engine.correlation_matrix(),
        outliers,
        trend_column: config.trend_column.clone(),
        window: config.window,
        raw: numeric_values(table, &config.trend_column)?,
        trend,
    })
}

/// Everything `wx predict` prints or exports.
#[derive(Debug)]
pub struct PredictionOutput {
    pub cleaning: CleaningRun,
    pub pipeline: PredictionPipeline,
    pub evaluation: EvaluationResult,
    pub diagnostics: Vec<DiagnosticRow>,
}

/// Clean, optionally join a raw categorical field, fit "Linear" and evaluate.
///
/// `Tid` is kept typed so diagnostics can be ordered in time. A `keep` policy
/// would leave nulls the regression cannot use, so incomplete rows are dropped.
pub fn run_prediction(
    records: &[RawRecord],
    cleaning: &CleaningConfig,
    target: &str,
    split: &SplitConfig,
    category_field: Option<&str>,
) -> Result<PredictionOutput, PipelineError> {
    let config = CleaningConfig {
        timestamp_format: None,
        ..cleaning.clone()
    };
    let run = run_pipeline(records, &config)?;

    let mut table = run.table.clone();
    let nulls = null_cells(&table);
    if config.missing_policy == MissingValuePolicy::Keep && nulls > 0 {
        warn!(
            nulls,
            "missing-value policy `keep` leaves nulls; dropping incomplete rows for modeling"
        );
        table = apply_missing_policy(&table, MissingValuePolicy::DropRows)?;
    }
    if let Some(path) = category_field {
        table = join_raw_column(&table, records, path, CATEGORY_COLUMN)?;
    }

    let mut pipeline = PredictionPipeline::new(&table, target, split)?;
    pipeline.fit_linear()?;
    let evaluation = pipeline.evaluate()?;
    let diagnostics = pipeline.diagnostics_frame()?;

    Ok(PredictionOutput {
        cleaning: run,
        pipeline,
        evaluation,
        diagnostics,
    })
}

/// Attach a raw field to a cleaned frame, matching rows on `Tid`.
///
/// The cleaned frame may have lost rows, so positions cannot be reused. When a
/// timestamp repeats in the raw records the first occurrence wins; rows with no
/// match get a null.
pub fn join_raw_column(
    table: &DataFrame,
    records: &[RawRecord],
    path: &str,
    name: &str,
) -> Result<DataFrame, PipelineError> {
    if ColumnKind::of(require(table, TIME)?) != ColumnKind::Timestamp {
        return Err(PipelineError::invalid(format!(
            "column `{TIME}` must hold timestamps to join `{path}`"
        )));
    }

    let times = records
        .iter()
        .map(|record| extract_timestamp(record, SOURCE_TIME))
        .collect::<Result<Vec<_>, PipelineError>>()?;
    let raw = DataFrame::new(vec![timestamp_column(TIME, times)?, text_column(records, path, name)?])?;

    let joined = table
        .clone()
        .lazy()
        .join(
            raw.lazy().unique_stable(Some(vec![TIME.into()]), UniqueKeepStrategy::First),
            [col(TIME)],
            [col(TIME)],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;
    Ok(joined)
}
