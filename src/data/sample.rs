//! Synthetic forecast documents shaped like the MET location-forecast API.
//!
//! Used by `wx sample` and by tests so the pipeline runs without a network.
//! Hourly steps start at a fixed instant; the generator is fully determined by
//! `(count, seed)`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde_json::{Value, json};

use crate::domain::RawRecord;
use crate::error::PipelineError;
use crate::io::ingest::{DEFAULT_LIST_PATH, records_from_document};

/// Raw path of the next-hour weather symbol in flattened records.
pub const SYMBOL_FIELD: &str = "data_next_1_hours_summary_symbol_code";

/// Share of rows whose humidity reading is `null`.
const MISSING_HUMIDITY_PROB: f64 = 0.02;

#[derive(Debug, Clone, Copy)]
pub struct SampleOptions {
    pub count: usize,
    pub seed: u64,
    pub start: DateTime<Utc>,
}

impl SampleOptions {
    pub fn new(count: usize, seed: u64) -> Self {
        Self {
            count,
            seed,
            start: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().unwrap_or_default(),
        }
    }
}

/// Build a nested forecast document with `options.count` hourly steps.
pub fn generate_document(options: &SampleOptions) -> Result<Value, PipelineError> {
    if options.count == 0 {
        return Err(PipelineError::invalid("sample count must be > 0"));
    }

    let mut rng = StdRng::seed_from_u64(options.seed);
    let normal =
        Normal::new(0.0, 1.0).map_err(|e| PipelineError::Numerical(format!("noise distribution error: {e}")))?;

    let mut pressure = 1013.0;
    let mut steps = Vec::with_capacity(options.count);
    for i in 0..options.count {
        let time = options.start + Duration::hours(i as i64);
        let hour = (i % 24) as f64;

        // Diurnal cycle peaking mid-afternoon.
        let diurnal = (std::f64::consts::TAU * (hour - 9.0) / 24.0).sin();
        let temperature = 4.0 + 5.0 * diurnal + 1.2 * normal.sample(&mut rng);
        let humidity = (78.0 - 2.5 * (temperature - 4.0) + 4.0 * normal.sample(&mut rng)).clamp(20.0, 100.0);
        pressure += 0.6 * normal.sample(&mut rng);
        let wind_speed = (3.0 + 1.5 * normal.sample(&mut rng)).abs();

        let humidity_value = if rng.r#gen::<f64>() < MISSING_HUMIDITY_PROB {
            Value::Null
        } else {
            json!(round1(humidity))
        };

        steps.push(json!({
            "time": time.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "data": {
                "instant": {
                    "details": {
                        "air_temperature": round1(temperature),
                        "relative_humidity": humidity_value,
                        "air_pressure_at_sea_level": round1(pressure),
                        "wind_speed": round1(wind_speed),
                    }
                },
                "next_1_hours": {
                    "summary": {"symbol_code": symbol_code(humidity, temperature)}
                }
            }
        }));
    }

    Ok(json!({
        "type": "Feature",
        "geometry": {"type": "Point", "coordinates": [10.75, 59.91, 23]},
        "properties": {
            "meta": {"updated_at": options.start.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)},
            "timeseries": steps,
        }
    }))
}

/// Generate a document and flatten it into raw records.
pub fn generate_records(count: usize, seed: u64) -> Result<Vec<RawRecord>, PipelineError> {
    let document = generate_document(&SampleOptions::new(count, seed))?;
    records_from_document(&document, DEFAULT_LIST_PATH)
}

fn symbol_code(humidity: f64, temperature: f64) -> &'static str {
    match (humidity, temperature) {
        (h, t) if h >= 90.0 && t <= 0.0 => "snow",
        (h, _) if h >= 90.0 => "rain",
        (h, _) if h >= 75.0 => "cloudy",
        (h, _) if h >= 60.0 => "partlycloudy_day",
        _ => "clearsky_day",
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
