use std::fs;

use serde_json::json;

use weather_pipeline::clean::{round_column, run_pipeline};
use weather_pipeline::data::{SYMBOL_FIELD, SampleOptions, generate_document};
use weather_pipeline::domain::{
    CANONICAL_COLUMNS, CleaningConfig, ColumnKind, MissingValuePolicy, SplitConfig, TEMPERATURE, TIME, null_cells,
    numeric_values, require,
};
use weather_pipeline::error::PipelineError;
use weather_pipeline::io::{
    DEFAULT_LIST_PATH, load_raw_records, read_table_csv, write_diagnostics_csv, write_evaluation_json,
};
use weather_pipeline::predict::{LINEAR_MODEL, PredictionPipeline, Stage};
use weather_pipeline::stats::StatisticsEngine;

fn saved_forecast(dir: &tempfile::TempDir, count: usize) -> std::path::PathBuf {
    let path = dir.path().join("forecast.json");
    let document = generate_document(&SampleOptions::new(count, 21)).unwrap();
    fs::write(&path, serde_json::to_string(&document).unwrap()).unwrap();
    path
}

#[test]
fn saved_document_cleans_to_canonical_csv() {
    let dir = tempfile::tempdir().unwrap();
    let input = saved_forecast(&dir, 72);
    let export = dir.path().join("renset.csv");

    let records = load_raw_records(&input, DEFAULT_LIST_PATH).unwrap();
    assert_eq!(records.len(), 72);

    let config = CleaningConfig {
        missing_policy: MissingValuePolicy::ImputeMedian,
        keep_duplicates: false,
        round: Some((TEMPERATURE.to_string(), 0)),
        export_csv: Some(export.clone()),
        ..CleaningConfig::default()
    };
    let run = run_pipeline(&records, &config).unwrap();
    assert!(run.all_stages_applied(), "{:?}", run.failures);

    let text = fs::read_to_string(&export).unwrap();
    assert!(text.starts_with("Tid,Temperatur,Fuktighet,Trykk,Vindhastighet\n"));

    let back = read_table_csv(&export).unwrap();
    let names: Vec<&str> = back.get_column_names().iter().map(|n| n.as_str()).collect();
    assert_eq!(names, CANONICAL_COLUMNS.to_vec());
    assert_eq!(back.height(), run.table.height());
    assert_eq!(null_cells(&back), 0);
    // Formatted `dd.mm.yy - HH:MM` is not RFC 3339, so it reads back as text.
    assert_eq!(ColumnKind::of(require(&back, TIME).unwrap()), ColumnKind::Text);

    // Rounding again changes nothing.
    let again = round_column(&back, TEMPERATURE, 0).unwrap();
    assert_eq!(
        numeric_values(&again, TEMPERATURE).unwrap(),
        numeric_values(&back, TEMPERATURE).unwrap()
    );
}

#[test]
fn missing_source_field_aborts_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    let document = json!({
        "properties": {"timeseries": [
            {"time": "2025-01-01T00:00:00Z", "data": {"instant": {"details": {
                "air_temperature": 1.0,
                "relative_humidity": 80.0,
                "air_pressure_at_sea_level": 1000.0,
                "wind_speed": 3.0
            }}}},
            {"time": "2025-01-01T01:00:00Z", "data": {"instant": {"details": {
                "air_temperature": 1.0,
                "relative_humidity": 80.0,
                "wind_speed": 3.0
            }}}}
        ]}
    });
    fs::write(&path, document.to_string()).unwrap();

    let records = load_raw_records(&path, DEFAULT_LIST_PATH).unwrap();
    let err = run_pipeline(&records, &CleaningConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::MissingField { .. }), "{err}");
}

#[test]
fn statistics_on_cleaned_table() {
    let dir = tempfile::tempdir().unwrap();
    let records = load_raw_records(&saved_forecast(&dir, 120), DEFAULT_LIST_PATH).unwrap();
    let run = run_pipeline(&records, &CleaningConfig::default()).unwrap();

    let engine = StatisticsEngine::new(&run.table);
    let describe = engine.describe();
    assert_eq!(describe.len(), 4);
    assert!(describe.iter().all(|s| s.mean.is_finite() && s.std >= 0.0));

    let r = engine.correlation(TEMPERATURE, "Fuktighet").unwrap();
    assert!((-1.0..=1.0).contains(&r));
    // Humidity is generated to fall as temperature rises.
    assert!(r < 0.0);

    assert!(engine.detect_outliers(10.0).unwrap().is_empty());
}

#[test]
fn prediction_exports_metrics_and_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let records = load_raw_records(&saved_forecast(&dir, 200), DEFAULT_LIST_PATH).unwrap();

    let config = CleaningConfig {
        missing_policy: MissingValuePolicy::DropRows,
        timestamp_format: None,
        ..CleaningConfig::default()
    };
    let run = run_pipeline(&records, &config).unwrap();

    let mut pipeline = PredictionPipeline::new(&run.table, TEMPERATURE, &SplitConfig::default()).unwrap();
    let again = PredictionPipeline::new(&run.table, TEMPERATURE, &SplitConfig::default()).unwrap();
    assert_eq!(pipeline.split(), again.split());

    pipeline.fit_linear().unwrap();
    let evaluation = pipeline.evaluate().unwrap();
    assert_eq!(pipeline.stage(), Stage::Evaluated);
    assert!(evaluation[LINEAR_MODEL].r2 <= 1.0);

    let metrics = dir.path().join("metrics.json");
    write_evaluation_json(&metrics, &evaluation).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&fs::read_to_string(&metrics).unwrap()).unwrap();
    assert!(parsed[LINEAR_MODEL]["R^2"].is_number());
    assert!(parsed[LINEAR_MODEL]["RMSE"].is_number());

    let rows = pipeline.diagnostics_frame().unwrap();
    let diagnostics = dir.path().join("diagnostics.csv");
    write_diagnostics_csv(&diagnostics, &rows).unwrap();
    let text = fs::read_to_string(&diagnostics).unwrap();
    assert!(text.starts_with("Tid,Dag,Faktisk,Predikert,Feil\n"));
    assert_eq!(text.lines().count(), rows.len() + 1);
}

#[test]
fn raw_symbol_field_is_present_in_saved_documents() {
    let dir = tempfile::tempdir().unwrap();
    let records = load_raw_records(&saved_forecast(&dir, 5), DEFAULT_LIST_PATH).unwrap();
    assert!(records.iter().all(|r| r[SYMBOL_FIELD].is_string()));
}
