//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between the cleaning, statistics and prediction stages
//! - exported to JSON/CSV
//! - rendered by the terminal report

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Timestamp column.
pub const TIME: &str = "Tid";
/// Air temperature, °C.
pub const TEMPERATURE: &str = "Temperatur";
/// Relative humidity, %.
pub const HUMIDITY: &str = "Fuktighet";
/// Air pressure at sea level, hPa.
pub const PRESSURE: &str = "Trykk";
/// Wind speed, m/s.
pub const WIND_SPEED: &str = "Vindhastighet";

/// Canonical column order of a cleaned table.
pub const CANONICAL_COLUMNS: [&str; 5] = [TIME, TEMPERATURE, HUMIDITY, PRESSURE, WIND_SPEED];

pub const SOURCE_TIME: &str = "time";
pub const SOURCE_TEMPERATURE: &str = "data_instant_details_air_temperature";
pub const SOURCE_HUMIDITY: &str = "data_instant_details_relative_humidity";
pub const SOURCE_PRESSURE: &str = "data_instant_details_air_pressure_at_sea_level";
pub const SOURCE_WIND_SPEED: &str = "data_instant_details_wind_speed";

/// Default `Tid` rendering (`dd.mm.yy - HH:MM`).
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%d.%m.%y - %H:%M";

/// One observation as delivered by the forecast API, flattened or nested.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// A typed row extracted from a [`RawRecord`].
///
/// `None` means the field was present but `null` in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRow {
    pub tid: Option<DateTime<Utc>>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed: Option<f64>,
}

/// How nulls in numeric columns are treated during cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingValuePolicy {
    /// Leave nulls in place.
    #[default]
    Keep,
    /// Remove every row with a null in any numeric column.
    DropRows,
    /// Replace nulls with the column median of the values present.
    ImputeMedian,
}

impl MissingValuePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            MissingValuePolicy::Keep => "keep",
            MissingValuePolicy::DropRows => "drop-rows",
            MissingValuePolicy::ImputeMedian => "impute-median",
        }
    }
}

impl fmt::Display for MissingValuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingValuePolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" | "behold" => Ok(MissingValuePolicy::Keep),
            "drop" | "drop-rows" => Ok(MissingValuePolicy::DropRows),
            "median" | "impute-median" => Ok(MissingValuePolicy::ImputeMedian),
            other => Err(PipelineError::invalid(format!(
                "unknown missing-value policy `{other}` (expected keep, drop-rows or impute-median)"
            ))),
        }
    }
}

/// Data-quality counts reported before cleaning transforms run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityReport {
    /// Rows identical across all columns to an earlier row.
    pub duplicate_count: usize,
    /// Null cells across the whole table.
    pub missing_value_count: usize,
}

/// One row of `describe()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    #[serde(rename = "Gjennomsnitt")]
    pub mean: f64,
    #[serde(rename = "Median")]
    pub median: f64,
    #[serde(rename = "Standardavvik")]
    pub std: f64,
}

/// Holdout metrics for one fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    #[serde(rename = "R^2")]
    pub r2: f64,
    #[serde(rename = "RMSE")]
    pub rmse: f64,
}

/// Model name → holdout metrics.
pub type EvaluationResult = BTreeMap<String, ModelScore>;

/// A single test-set prediction, for time-series and error-per-day analyses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticRow {
    pub timestamp: Option<DateTime<Utc>>,
    pub day: Option<NaiveDate>,
    pub actual: f64,
    pub predicted: f64,
    pub abs_error: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parses_aliases_case_insensitively() {
        assert_eq!("Drop".parse::<MissingValuePolicy>().unwrap(), MissingValuePolicy::DropRows);
        assert_eq!("median".parse::<MissingValuePolicy>().unwrap(), MissingValuePolicy::ImputeMedian);
        assert_eq!("behold".parse::<MissingValuePolicy>().unwrap(), MissingValuePolicy::Keep);
    }

    #[test]
    fn policy_rejects_unknown_names() {
        let err = "ukjent".parse::<MissingValuePolicy>().unwrap_err();
        assert!(matches!(err, PipelineError::InvalidArgument(_)));
    }

    #[test]
    fn model_score_serializes_with_metric_names() {
        let json = serde_json::to_string(&ModelScore { r2: 0.5, rmse: 1.25 }).unwrap();
        assert_eq!(json, r#"{"R^2":0.5,"RMSE":1.25}"#);
    }
}
