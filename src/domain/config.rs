//! Run configuration as understood by the library.
//!
//! These are derived from CLI flags (plus defaults) in `app`; the library never
//! reads settings from the environment.

use std::path::PathBuf;

use crate::domain::types::{DEFAULT_TIMESTAMP_FORMAT, MissingValuePolicy, PRESSURE};

/// Seed used for the train/test split unless overridden.
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// Settings for `clean::run_pipeline`.
#[derive(Debug, Clone)]
pub struct CleaningConfig {
    pub missing_policy: MissingValuePolicy,
    /// When false, exact duplicate rows are removed (first occurrence kept).
    pub keep_duplicates: bool,
    /// strftime pattern used to render `Tid`. `None` keeps timestamps typed.
    pub timestamp_format: Option<String>,
    /// Optional `(column, decimals)` rounding stage.
    pub round: Option<(String, i32)>,
    /// Optional lower bound (exclusive) on `Temperatur`.
    pub temperature_threshold: Option<f64>,
    /// Optional CSV export of the cleaned table.
    pub export_csv: Option<PathBuf>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            missing_policy: MissingValuePolicy::Keep,
            keep_duplicates: true,
            timestamp_format: Some(DEFAULT_TIMESTAMP_FORMAT.to_string()),
            round: None,
            temperature_threshold: None,
            export_csv: None,
        }
    }
}

/// Settings for the statistics stage.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub outlier_threshold: f64,
    pub window: usize,
    pub trend_column: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            outlier_threshold: 3.0,
            window: 7,
            trend_column: PRESSURE.to_string(),
        }
    }
}

/// Train/test split settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    /// Fraction of rows held out for evaluation, in (0, 1).
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: DEFAULT_SPLIT_SEED,
        }
    }
}
