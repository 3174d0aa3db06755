//! Field extraction from raw API records.
//!
//! A field path is dot-separated (`data.instant.details.air_temperature`). A
//! flattened record stores the whole path as one key
//! (`data_instant_details_air_temperature`); both shapes resolve through
//! [`resolve`]. Absent segments fail loudly with the segment name, so a schema
//! change in the feed never turns into a silent column of nulls.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::domain::{
    CanonicalRow, RawRecord, SOURCE_HUMIDITY, SOURCE_PRESSURE, SOURCE_TEMPERATURE, SOURCE_TIME, SOURCE_WIND_SPEED,
};
use crate::error::PipelineError;

/// Look up the value at `path`.
///
/// An exact key match wins over walking the dotted segments.
pub fn resolve<'a>(record: &'a RawRecord, path: &str) -> Result<&'a Value, PipelineError> {
    if let Some(value) = record.get(path) {
        return Ok(value);
    }

    let mut segments = path.split('.');
    let first = segments.next().unwrap_or(path);
    let mut node = record.get(first).ok_or_else(|| missing(path, first))?;
    for segment in segments {
        node = node
            .as_object()
            .and_then(|obj| obj.get(segment))
            .ok_or_else(|| missing(path, segment))?;
    }
    Ok(node)
}

/// Numeric field. JSON `null` is a declared missing value (`None`).
pub fn extract_f64(record: &RawRecord, path: &str) -> Result<Option<f64>, PipelineError> {
    let value = resolve(record, path)?;
    let parsed = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(x) if x.is_finite() => Ok(Some(x)),
        _ => Err(conversion(path, "a number", value)),
    }
}

/// ISO-8601 timestamp field, normalized to UTC.
///
/// Timestamps without an offset are taken to be UTC already.
pub fn extract_timestamp(record: &RawRecord, path: &str) -> Result<Option<DateTime<Utc>>, PipelineError> {
    let value = resolve(record, path)?;
    let raw = match value {
        Value::Null => return Ok(None),
        Value::String(s) => s.trim(),
        _ => return Err(conversion(path, "a timestamp", value)),
    };
    parse_timestamp(raw)
        .map(Some)
        .ok_or_else(|| conversion(path, "a timestamp", value))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Extract all five canonical fields of one record.
pub fn extract_row(record: &RawRecord) -> Result<CanonicalRow, PipelineError> {
    Ok(CanonicalRow {
        tid: extract_timestamp(record, SOURCE_TIME)?,
        temperature: extract_f64(record, SOURCE_TEMPERATURE)?,
        humidity: extract_f64(record, SOURCE_HUMIDITY)?,
        pressure: extract_f64(record, SOURCE_PRESSURE)?,
        wind_speed: extract_f64(record, SOURCE_WIND_SPEED)?,
    })
}

fn missing(path: &str, segment: &str) -> PipelineError {
    PipelineError::MissingField {
        path: path.to_string(),
        segment: segment.to_string(),
    }
}

fn conversion(path: &str, expected: &'static str, value: &Value) -> PipelineError {
    PipelineError::TypeConversion {
        path: path.to_string(),
        expected,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn resolves_flat_and_nested_paths() {
        let flat = record(json!({"data_instant_details_air_temperature": 4.5}));
        let nested = record(json!({"data": {"instant": {"details": {"air_temperature": 4.5}}}}));

        assert_eq!(extract_f64(&flat, "data_instant_details_air_temperature").unwrap(), Some(4.5));
        assert_eq!(extract_f64(&nested, "data.instant.details.air_temperature").unwrap(), Some(4.5));
    }

    #[test]
    fn missing_segment_is_named() {
        let nested = record(json!({"data": {"instant": {}}}));
        let err = extract_f64(&nested, "data.instant.details.air_temperature").unwrap_err();
        match err {
            PipelineError::MissingField { path, segment } => {
                assert_eq!(path, "data.instant.details.air_temperature");
                assert_eq!(segment, "details");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn numeric_coercion() {
        let r = record(json!({"a": "12.5", "b": null, "c": "varm", "d": true}));
        assert_eq!(extract_f64(&r, "a").unwrap(), Some(12.5));
        assert_eq!(extract_f64(&r, "b").unwrap(), None);
        assert!(matches!(extract_f64(&r, "c"), Err(PipelineError::TypeConversion { .. })));
        assert!(matches!(extract_f64(&r, "d"), Err(PipelineError::TypeConversion { .. })));
    }

    #[test]
    fn timestamps_are_normalized_to_utc() {
        let r = record(json!({"time": "2025-01-01T01:00:00+01:00", "naive": "2025-01-01T00:00:00", "bad": "i går"}));
        let expected = parse_timestamp("2025-01-01T00:00:00Z").unwrap();
        assert_eq!(extract_timestamp(&r, "time").unwrap(), Some(expected));
        assert_eq!(extract_timestamp(&r, "naive").unwrap(), Some(expected));
        assert!(matches!(extract_timestamp(&r, "bad"), Err(PipelineError::TypeConversion { .. })));
    }
}
