//! Command-line parsing for the weather pipeline.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! cleaning/statistics/modeling code. Flags are converted into the library's
//! config structs in `app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_SPLIT_SEED, DEFAULT_TIMESTAMP_FORMAT, MissingValuePolicy, PRESSURE, TEMPERATURE};
use crate::io::ingest::DEFAULT_LIST_PATH;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "wx", version, about = "Weather data cleaning, statistics and regression")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Clean a forecast document and print the data-quality report.
    Clean(CleanArgs),
    /// Clean, then print descriptive statistics, correlations, outliers and a trend.
    Analyze(AnalyzeArgs),
    /// Clean, fit a linear model on a held-out split and print its evaluation.
    Predict(PredictArgs),
    /// Write a synthetic forecast document.
    Sample(SampleArgs),
}

/// Where raw records come from.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Forecast JSON document saved from the API.
    #[arg(short, long, value_name = "JSON", conflicts_with = "synthetic")]
    pub input: Option<PathBuf>,

    /// Generate N synthetic hourly records instead of reading a file.
    #[arg(long, value_name = "N")]
    pub synthetic: Option<usize>,

    /// Seed for synthetic records.
    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    /// Dotted path to the record list inside the document.
    #[arg(long, default_value = DEFAULT_LIST_PATH)]
    pub list_path: String,
}

/// Cleaning flags shared by every subcommand that cleans.
#[derive(Debug, Args, Clone)]
pub struct CleaningArgs {
    /// Missing-value policy: keep, drop or median.
    #[arg(long, default_value = "keep", value_parser = parse_policy)]
    pub missing: MissingValuePolicy,

    /// Remove exact duplicate rows (first occurrence kept).
    #[arg(long)]
    pub drop_duplicates: bool,

    /// strftime pattern for `Tid`.
    #[arg(long, default_value = DEFAULT_TIMESTAMP_FORMAT)]
    pub time_format: String,

    /// Round a column, e.g. `--round Temperatur --decimals 1`.
    #[arg(long, value_name = "COLUMN", requires = "decimals")]
    pub round: Option<String>,

    #[arg(long, allow_negative_numbers = true, requires = "round")]
    pub decimals: Option<i32>,

    /// Keep only rows with `Temperatur` strictly above this value.
    #[arg(long, allow_negative_numbers = true)]
    pub min_temperature: Option<f64>,
}

#[derive(Debug, Args, Clone)]
pub struct CleanArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub cleaning: CleaningArgs,

    /// Write the cleaned table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Rows of the cleaned table to print.
    #[arg(long, default_value_t = 10)]
    pub show: usize,
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub cleaning: CleaningArgs,

    /// z-score above which a row is reported as an outlier.
    #[arg(long, default_value_t = 3.0)]
    pub outlier_threshold: f64,

    /// Rolling-mean window.
    #[arg(long, default_value_t = 7)]
    pub window: usize,

    /// Column for the rolling trend.
    #[arg(long, default_value = PRESSURE)]
    pub trend_column: String,

    /// Rows of the trend to print.
    #[arg(long, default_value_t = 12)]
    pub show: usize,
}

#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub cleaning: CleaningArgs,

    /// Column to predict.
    #[arg(long, default_value = TEMPERATURE)]
    pub target: String,

    /// Fraction of rows held out for evaluation.
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    /// Seed for the train/test split.
    #[arg(long, default_value_t = DEFAULT_SPLIT_SEED)]
    pub split_seed: u64,

    /// Raw field to add as a categorical feature, e.g.
    /// `data_next_1_hours_summary_symbol_code`.
    #[arg(long, value_name = "PATH")]
    pub category_field: Option<String>,

    /// Write `{model: {"R^2", "RMSE"}}` to JSON.
    #[arg(long, value_name = "JSON")]
    pub export_metrics: Option<PathBuf>,

    /// Write test-set predictions to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_diagnostics: Option<PathBuf>,

    /// Diagnostic rows to print.
    #[arg(long, default_value_t = 10)]
    pub show: usize,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Number of hourly records.
    #[arg(short = 'n', long, default_value_t = 240)]
    pub count: usize,

    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    /// Output file; stdout when omitted.
    #[arg(short, long, value_name = "JSON")]
    pub output: Option<PathBuf>,
}

fn parse_policy(raw: &str) -> Result<MissingValuePolicy, String> {
    raw.parse().map_err(|e: crate::error::PipelineError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_predict_flags() {
        let cli = Cli::try_parse_from([
            "wx",
            "-v",
            "predict",
            "--synthetic",
            "100",
            "--missing",
            "median",
            "--category-field",
            "data_next_1_hours_summary_symbol_code",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        let Command::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(args.input.synthetic, Some(100));
        assert_eq!(args.cleaning.missing, MissingValuePolicy::ImputeMedian);
        assert_eq!(args.target, TEMPERATURE);
        assert_eq!(args.split_seed, 42);
    }

    #[test]
    fn rejects_unknown_policy_and_conflicting_inputs() {
        assert!(Cli::try_parse_from(["wx", "clean", "--missing", "interpolate"]).is_err());
        assert!(Cli::try_parse_from(["wx", "clean", "--input", "a.json", "--synthetic", "5"]).is_err());
    }

    #[test]
    fn round_and_decimals_come_together() {
        assert!(Cli::try_parse_from(["wx", "clean", "--round", "Temperatur"]).is_err());
        assert!(Cli::try_parse_from(["wx", "clean", "--decimals", "1"]).is_err());
        let cli = Cli::try_parse_from(["wx", "clean", "--round", "Temperatur", "--decimals", "1"]).unwrap();
        let Command::Clean(args) = cli.command else {
            panic!("expected clean");
        };
        assert_eq!(args.cleaning.decimals, Some(1));
    }
}
