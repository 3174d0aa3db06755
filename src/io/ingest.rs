//! Raw-record ingest from a saved forecast document.
//!
//! This module turns a JSON document (as returned by a location-forecast API and
//! saved to disk) into a list of flat [`RawRecord`]s, one per timestamp.
//! Fetching the document over the network is not this crate's concern.
//!
//! Design goals:
//! - **Strict paths**: a missing list path fails with the absent key
//! - **Flat records**: nested objects are joined with `_`, so downstream field
//!   paths match the API's flattened column names
//! - **Separation of concerns**: no cleaning logic here

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use polars::prelude::Column;
use serde_json::Value;
use tracing::debug;

use crate::domain::RawRecord;
use crate::error::PipelineError;
use crate::io::extract::resolve;

/// Where the observation list lives in a forecast document.
pub const DEFAULT_LIST_PATH: &str = "properties.timeseries";

/// Separator used when flattening nested keys.
pub const FLATTEN_SEPARATOR: char = '_';

/// Read a JSON file and return its flattened records.
///
/// A top-level array is used as-is; otherwise `list_path` is walked to find it.
pub fn load_raw_records(path: &Path, list_path: &str) -> Result<Vec<RawRecord>, PipelineError> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let document: Value = serde_json::from_reader(BufReader::new(file))?;
    let records = records_from_document(&document, list_path)?;
    debug!(path = %path.display(), records = records.len(), "loaded raw records");
    Ok(records)
}

/// Locate the observation list inside `document` and flatten each entry.
pub fn records_from_document(document: &Value, list_path: &str) -> Result<Vec<RawRecord>, PipelineError> {
    let list = match document {
        Value::Array(items) => items,
        Value::Object(root) => {
            let node = resolve(root, list_path)?;
            node.as_array().ok_or_else(|| PipelineError::TypeConversion {
                path: list_path.to_string(),
                expected: "a list of records",
                value: truncate(node.to_string()),
            })?
        }
        other => {
            return Err(PipelineError::TypeConversion {
                path: list_path.to_string(),
                expected: "an object or a list",
                value: truncate(other.to_string()),
            });
        }
    };

    list.iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(_) => Ok(flatten_record(item)),
            other => Err(PipelineError::TypeConversion {
                path: format!("{list_path}[{idx}]"),
                expected: "an object",
                value: truncate(other.to_string()),
            }),
        })
        .collect()
}

/// Flatten nested objects into one level, joining keys with `_`.
///
/// Arrays and scalars are leaves.
pub fn flatten_record(value: &Value) -> RawRecord {
    let mut out = RawRecord::new();
    if let Value::Object(obj) = value {
        for (key, child) in obj {
            flatten_into(key, child, &mut out);
        }
    }
    out
}

fn flatten_into(prefix: &str, value: &Value, out: &mut RawRecord) {
    match value {
        Value::Object(obj) if !obj.is_empty() => {
            for (key, child) in obj {
                flatten_into(&format!("{prefix}{FLATTEN_SEPARATOR}{key}"), child, out);
            }
        }
        other => {
            out.insert(prefix.to_string(), other.clone());
        }
    }
}

/// Pull a non-canonical field from the raw records as a text column.
///
/// Used to carry categorical features (e.g. a weather symbol code) into the
/// modeling table alongside the cleaned measurements.
pub fn text_column(records: &[RawRecord], path: &str, name: &str) -> Result<Column, PipelineError> {
    let values = records
        .iter()
        .map(|record| {
            Ok(match resolve(record, path)? {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
        })
        .collect::<Result<Vec<Option<String>>, PipelineError>>()?;
    Ok(Column::new(name.into(), values))
}

fn truncate(mut s: String) -> String {
    const MAX: usize = 80;
    if s.len() > MAX {
        let mut cut = MAX;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push('…');
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn forecast_document() -> Value {
        json!({
            "type": "Feature",
            "properties": {
                "timeseries": [
                    {
                        "time": "2025-01-01T00:00:00Z",
                        "data": {
                            "instant": {"details": {"air_temperature": 5.0, "wind_speed": 2.2}},
                            "next_1_hours": {"summary": {"symbol_code": "cloudy"}}
                        }
                    },
                    {
                        "time": "2025-01-01T01:00:00Z",
                        "data": {
                            "instant": {"details": {"air_temperature": 4.0, "wind_speed": 3.1}},
                            "next_1_hours": {"summary": {"symbol_code": "rain"}}
                        }
                    }
                ]
            }
        })
    }

    #[test]
    fn flattens_nested_keys_with_underscores() {
        let records = records_from_document(&forecast_document(), DEFAULT_LIST_PATH).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["data_instant_details_air_temperature"], json!(5.0));
        assert_eq!(records[1]["data_next_1_hours_summary_symbol_code"], json!("rain"));
        assert_eq!(records[0]["time"], json!("2025-01-01T00:00:00Z"));
    }

    #[test]
    fn top_level_array_is_taken_as_records() {
        let doc = json!([{"time": "2025-01-01T00:00:00Z"}]);
        let records = records_from_document(&doc, DEFAULT_LIST_PATH).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn missing_list_key_is_reported() {
        let doc = json!({"properties": {}});
        let err = records_from_document(&doc, DEFAULT_LIST_PATH).unwrap_err();
        assert!(matches!(err, PipelineError::MissingField { ref segment, .. } if segment == "timeseries"));
    }

    #[test]
    fn text_column_reads_raw_fields() {
        let records = records_from_document(&forecast_document(), DEFAULT_LIST_PATH).unwrap();
        let column = text_column(&records, "data_next_1_hours_summary_symbol_code", "Symbol").unwrap();
        assert_eq!(column.name().as_str(), "Symbol");
        assert_eq!(
            crate::domain::text_values(&column).unwrap(),
            vec![Some("cloudy".to_string()), Some("rain".to_string())]
        );

        assert!(text_column(&records, "data_next_6_hours_summary_symbol_code", "Symbol").is_err());
    }
}
