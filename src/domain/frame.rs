//! Typed access to the polars frames every stage passes around.
//!
//! Stages take a `&DataFrame` and return a new one. `Tid` is stored as
//! `Datetime(Milliseconds)` holding UTC instants until it is formatted to text.

use chrono::{DateTime, Utc};
use polars::prelude::*;

use crate::domain::types::{CanonicalRow, HUMIDITY, PRESSURE, TEMPERATURE, TIME, WIND_SPEED};
use crate::error::PipelineError;

/// Storage type of `Tid` while it is still typed.
pub const TIMESTAMP_DTYPE: DataType = DataType::Datetime(TimeUnit::Milliseconds, None);

/// How a column takes part in statistics and modeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Timestamp,
    Text,
    Other,
}

impl ColumnKind {
    pub fn of(column: &Column) -> Self {
        let dtype = column.dtype();
        if dtype.is_numeric() {
            ColumnKind::Numeric
        } else if matches!(dtype, DataType::Datetime(_, _)) {
            ColumnKind::Timestamp
        } else if matches!(dtype, DataType::String) {
            ColumnKind::Text
        } else {
            ColumnKind::Other
        }
    }
}

/// Assemble the five canonical columns from extracted rows.
pub fn canonical_frame(rows: &[CanonicalRow]) -> Result<DataFrame, PipelineError> {
    let numeric = |name: &str, get: fn(&CanonicalRow) -> Option<f64>| {
        Column::new(name.into(), rows.iter().map(get).collect::<Vec<_>>())
    };
    let frame = DataFrame::new(vec![
        timestamp_column(TIME, rows.iter().map(|r| r.tid))?,
        numeric(TEMPERATURE, |r| r.temperature),
        numeric(HUMIDITY, |r| r.humidity),
        numeric(PRESSURE, |r| r.pressure),
        numeric(WIND_SPEED, |r| r.wind_speed),
    ])?;
    Ok(frame)
}

/// Build a `Datetime(Milliseconds)` column from UTC instants.
pub fn timestamp_column(
    name: &str,
    values: impl IntoIterator<Item = Option<DateTime<Utc>>>,
) -> Result<Column, PipelineError> {
    let millis: Vec<Option<i64>> = values
        .into_iter()
        .map(|ts| ts.map(|t| t.timestamp_millis()))
        .collect();
    let column = Column::new(name.into(), millis).cast(&TIMESTAMP_DTYPE)?;
    Ok(column)
}

/// Look up a column, reporting absent names as [`PipelineError::ColumnNotFound`].
pub fn require<'a>(frame: &'a DataFrame, name: &str) -> Result<&'a Column, PipelineError> {
    frame.column(name).map_err(|_| PipelineError::column(name))
}

/// Values of a numeric column as `f64`, nulls kept.
pub fn float_values(column: &Column) -> Result<Vec<Option<f64>>, PipelineError> {
    if ColumnKind::of(column) != ColumnKind::Numeric {
        return Err(PipelineError::invalid(format!("column `{}` is not numeric", column.name())));
    }
    let floats = column.cast(&DataType::Float64)?;
    Ok(floats.f64()?.into_iter().collect())
}

pub fn numeric_values(frame: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, PipelineError> {
    float_values(require(frame, name)?)
}

/// Values of a typed timestamp column.
pub fn timestamp_values(column: &Column) -> Result<Vec<Option<DateTime<Utc>>>, PipelineError> {
    if ColumnKind::of(column) != ColumnKind::Timestamp {
        return Err(PipelineError::invalid(format!(
            "column `{}` is not a timestamp column",
            column.name()
        )));
    }
    let millis = column.cast(&TIMESTAMP_DTYPE)?.cast(&DataType::Int64)?;
    Ok(millis
        .i64()?
        .into_iter()
        .map(|ms| ms.and_then(DateTime::from_timestamp_millis))
        .collect())
}

pub fn text_values(column: &Column) -> Result<Vec<Option<String>>, PipelineError> {
    if ColumnKind::of(column) != ColumnKind::Text {
        return Err(PipelineError::invalid(format!(
            "column `{}` is not categorical text",
            column.name()
        )));
    }
    Ok(column.str()?.into_iter().map(|s| s.map(str::to_string)).collect())
}

/// Names of the numeric columns, in frame order.
pub fn numeric_column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_columns()
        .iter()
        .filter(|c| ColumnKind::of(c) == ColumnKind::Numeric)
        .map(|c| c.name().to_string())
        .collect()
}

/// Null cells across every column.
pub fn null_cells(frame: &DataFrame) -> usize {
    frame.get_columns().iter().map(|c| c.null_count()).sum()
}

/// Rows at `rows`, in that order.
pub fn take_rows(frame: &DataFrame, rows: &[usize]) -> Result<DataFrame, PipelineError> {
    let idx = IdxCa::from_vec("idx".into(), rows.iter().map(|&r| r as IdxSize).collect());
    Ok(frame.take(&idx)?)
}

/// Copy of `frame` with `column` replacing its namesake, or appended.
pub fn with_column(frame: &DataFrame, column: Column) -> Result<DataFrame, PipelineError> {
    let mut out = frame.clone();
    out.with_column(column)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::extract::parse_timestamp;

    #[test]
    fn timestamps_survive_the_datetime_column() {
        let ts = parse_timestamp("2025-01-01T06:30:00Z");
        let column = timestamp_column(TIME, [ts, None]).unwrap();
        assert_eq!(ColumnKind::of(&column), ColumnKind::Timestamp);
        assert_eq!(timestamp_values(&column).unwrap(), vec![ts, None]);
    }

    #[test]
    fn accessors_distinguish_missing_and_mistyped() {
        let frame = DataFrame::new(vec![Column::new("S".into(), &["a"])]).unwrap();
        assert!(matches!(numeric_values(&frame, "S"), Err(PipelineError::InvalidArgument(_))));
        assert!(matches!(numeric_values(&frame, "Z"), Err(PipelineError::ColumnNotFound(_))));
        assert_eq!(text_values(require(&frame, "S").unwrap()).unwrap(), vec![Some("a".to_string())]);
    }

    #[test]
    fn integer_columns_read_as_floats() {
        let frame = DataFrame::new(vec![Column::new("N".into(), &[1i64, 2])]).unwrap();
        assert_eq!(numeric_values(&frame, "N").unwrap(), vec![Some(1.0), Some(2.0)]);
        assert_eq!(numeric_column_names(&frame), vec!["N".to_string()]);
    }

    #[test]
    fn take_and_replace_leave_the_input_alone() {
        let frame = DataFrame::new(vec![
            Column::new("A".into(), &[1.0, 2.0, 3.0]),
            Column::new("B".into(), &[Some(4.0), None, Some(6.0)]),
        ])
        .unwrap();
        let picked = take_rows(&frame, &[2, 0]).unwrap();
        assert_eq!(numeric_values(&picked, "A").unwrap(), vec![Some(3.0), Some(1.0)]);

        let replaced = with_column(&frame, Column::new("A".into(), &[9.0, 9.0, 9.0])).unwrap();
        assert_eq!(replaced.get_column_names(), frame.get_column_names());
        assert_eq!(numeric_values(&frame, "A").unwrap()[0], Some(1.0));
        assert_eq!(null_cells(&frame), 1);
    }
}
