//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - loads raw records (file or synthetic)
//! - runs cleaning, statistics or prediction
//! - prints reports
//! - writes optional exports

use std::io::Write as _;

use clap::Parser;

use crate::cli::{AnalyzeArgs, CleanArgs, CleaningArgs, Command, InputArgs, PredictArgs, SampleArgs};
use crate::domain::{AnalysisConfig, CleaningConfig, SplitConfig};
use crate::error::{AppError, PipelineError};

pub mod pipeline;

use pipeline::RecordSource;

/// Entry point for the `wx` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    crate::logging::init(cli.verbose);

    match cli.command {
        Command::Clean(args) => handle_clean(args),
        Command::Analyze(args) => handle_analyze(args),
        Command::Predict(args) => handle_predict(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_clean(args: CleanArgs) -> Result<(), AppError> {
    let records = pipeline::load_records(&record_source(&args.input)?)?;
    let config = CleaningConfig {
        export_csv: args.export.clone(),
        ..cleaning_config_from_args(&args.cleaning)
    };
    let run = crate::clean::run_pipeline(&records, &config)?;

    println!("{}", crate::report::format_cleaning_summary(&run, &config));
    println!("{}", crate::report::format_table(&run.table, args.show));
    Ok(())
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let records = pipeline::load_records(&record_source(&args.input)?)?;
    let cleaning = cleaning_config_from_args(&args.cleaning);
    let run = crate::clean::run_pipeline(&records, &cleaning)?;
    let analysis = analysis_config_from_args(&args);
    let output = pipeline::run_analysis(&run.table, &analysis)?;

    println!("{}", crate::report::format_cleaning_summary(&run, &cleaning));
    println!("Descriptive statistics:\n{}", crate::report::format_describe(&output.summaries)?);
    println!("Correlation:\n{}", crate::report::format_correlation_matrix(&output.correlations));
    println!("{}", crate::report::format_outliers(&output.outliers, args.show));
    println!(
        "{}",
        crate::report::format_trend(&output.trend_column, output.window, &output.raw, &output.trend, args.show)
    );
    Ok(())
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let records = pipeline::load_records(&record_source(&args.input)?)?;
    let cleaning = cleaning_config_from_args(&args.cleaning);
    let split = SplitConfig {
        test_fraction: args.test_fraction,
        seed: args.split_seed,
    };
    let output = pipeline::run_prediction(&records, &cleaning, &args.target, &split, args.category_field.as_deref())?;

    println!("{}", crate::report::format_cleaning_summary(&output.cleaning, &cleaning));
    println!(
        "Target: {} | train={} test={} (seed {})",
        output.pipeline.target(),
        output.pipeline.split().train.len(),
        output.pipeline.split().test.len(),
        split.seed
    );
    println!("{}", crate::report::format_evaluation(&output.evaluation));
    println!("{}", crate::report::format_diagnostics(&output.diagnostics, args.show));

    if let Some(path) = &args.export_metrics {
        crate::io::export::write_evaluation_json(path, &output.evaluation)?;
    }
    if let Some(path) = &args.export_diagnostics {
        crate::io::export::write_diagnostics_csv(path, &output.diagnostics)?;
    }
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let document = crate::data::generate_document(&crate::data::SampleOptions::new(args.count, args.seed))?;
    let text = serde_json::to_string_pretty(&document).map_err(PipelineError::from)?;

    match &args.output {
        Some(path) => std::fs::write(path, text).map_err(|e| PipelineError::io(path, e))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{text}").map_err(|e| AppError::new(4, format!("Failed to write stdout: {e}")))?;
        }
    }
    Ok(())
}

fn record_source(args: &InputArgs) -> Result<RecordSource, AppError> {
    match (&args.input, args.synthetic) {
        (Some(path), _) => Ok(RecordSource::File {
            path: path.clone(),
            list_path: args.list_path.clone(),
        }),
        (None, Some(count)) => Ok(RecordSource::Synthetic { count, seed: args.seed }),
        (None, None) => Err(AppError::new(2, "Provide --input <JSON> or --synthetic <N>.")),
    }
}

pub fn cleaning_config_from_args(args: &CleaningArgs) -> CleaningConfig {
    CleaningConfig {
        missing_policy: args.missing,
        keep_duplicates: !args.drop_duplicates,
        timestamp_format: Some(args.time_format.clone()),
        round: args.round.clone().zip(args.decimals),
        temperature_threshold: args.min_temperature,
        export_csv: None,
    }
}

pub fn analysis_config_from_args(args: &AnalyzeArgs) -> AnalysisConfig {
    AnalysisConfig {
        outlier_threshold: args.outlier_threshold,
        window: args.window,
        trend_column: args.trend_column.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::domain::{MissingValuePolicy, TEMPERATURE};

    #[test]
    fn flags_become_cleaning_config() {
        let cli = Cli::try_parse_from([
            "wx",
            "clean",
            "--synthetic",
            "10",
            "--missing",
            "drop",
            "--drop-duplicates",
            "--round",
            TEMPERATURE,
            "--decimals",
            "1",
            "--min-temperature",
            "-2.5",
        ])
        .unwrap();
        let Command::Clean(args) = cli.command else {
            panic!("expected clean");
        };
        let config = cleaning_config_from_args(&args.cleaning);
        assert_eq!(config.missing_policy, MissingValuePolicy::DropRows);
        assert!(!config.keep_duplicates);
        assert_eq!(config.round, Some((TEMPERATURE.to_string(), 1)));
        assert_eq!(config.temperature_threshold, Some(-2.5));
        assert!(matches!(
            record_source(&args.input).unwrap(),
            RecordSource::Synthetic { count: 10, seed: 7 }
        ));
    }

    #[test]
    fn missing_input_is_a_usage_error() {
        let cli = Cli::try_parse_from(["wx", "analyze"]).unwrap();
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(record_source(&args.input).unwrap_err().exit_code(), 2);
        assert_eq!(analysis_config_from_args(&args).window, 7);
    }
}
