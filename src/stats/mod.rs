//! Descriptive statistics, outliers and trends over the numeric columns of a frame.
//!
//! [`StatisticsEngine`] is a read-only view: non-numeric columns (formatted
//! timestamps, categorical text) are excluded when it is constructed, and
//! every method recomputes from the borrowed frame. Nothing is cached.
//!
//! Zero-variance policy: a column whose standard deviation is zero (or
//! undefined, with fewer than two values) cannot produce a z-score, so it never
//! marks a row as an outlier.

use std::collections::BTreeMap;

use polars::prelude::*;

use crate::domain::{ColumnKind, ColumnSummary, float_values, take_rows};
use crate::error::PipelineError;
use crate::math::pearson;

/// Default z-score threshold for [`StatisticsEngine::detect_outliers`].
pub const DEFAULT_OUTLIER_THRESHOLD: f64 = 3.0;

/// Default window for [`StatisticsEngine::rolling_trend`].
pub const DEFAULT_TREND_WINDOW: usize = 7;

/// Column name → statistic.
pub type ColumnValues = BTreeMap<String, f64>;

/// Rows flagged by a z-score scan.
#[derive(Debug, Clone)]
pub struct OutlierReport {
    pub threshold: f64,
    /// Positions of the flagged rows in the source frame.
    pub rows: Vec<usize>,
    /// The flagged rows themselves, in source order.
    pub table: DataFrame,
}

impl OutlierReport {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StatisticsEngine<'a> {
    table: &'a DataFrame,
}

impl<'a> StatisticsEngine<'a> {
    pub fn new(table: &'a DataFrame) -> Self {
        Self { table }
    }

    /// The numeric columns this engine operates on, in frame order.
    pub fn numeric_columns(self) -> impl Iterator<Item = &'a Column> {
        self.table
            .get_columns()
            .iter()
            .filter(|c| ColumnKind::of(c) == ColumnKind::Numeric)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.numeric_columns().map(|c| c.name().to_string()).collect()
    }

    fn column(&self, name: &str) -> Result<&'a Column, PipelineError> {
        self.numeric_columns()
            .find(|c| c.name().as_str() == name)
            .ok_or_else(|| PipelineError::column(name))
    }

    fn per_column(&self, stat: fn(&Series) -> Option<f64>) -> ColumnValues {
        self.numeric_columns()
            .map(|c| (c.name().to_string(), stat(c.as_materialized_series()).unwrap_or(f64::NAN)))
            .collect()
    }

    pub fn mean_per_column(&self) -> ColumnValues {
        self.per_column(|s| s.mean())
    }

    pub fn median_per_column(&self) -> ColumnValues {
        self.per_column(|s| s.median())
    }

    /// Sample standard deviation (ddof = 1) per column.
    pub fn std_per_column(&self) -> ColumnValues {
        self.per_column(sample_std)
    }

    /// One summary row per numeric column, in frame order.
    pub fn describe(&self) -> Vec<ColumnSummary> {
        self.numeric_columns()
            .map(|c| {
                let series = c.as_materialized_series();
                ColumnSummary {
                    column: c.name().to_string(),
                    mean: series.mean().unwrap_or(f64::NAN),
                    median: series.median().unwrap_or(f64::NAN),
                    std: sample_std(series).unwrap_or(f64::NAN),
                }
            })
            .collect()
    }

    /// Pearson correlation of two numeric columns.
    pub fn correlation(&self, col_a: &str, col_b: &str) -> Result<f64, PipelineError> {
        let a = float_values(self.column(col_a)?)?;
        let b = float_values(self.column(col_b)?)?;

        let complete = a.iter().zip(b.iter()).filter(|(x, y)| x.is_some() && y.is_some()).count();
        if complete < 2 {
            return Err(PipelineError::InsufficientData {
                operation: "correlation",
                required: 2,
                actual: complete,
            });
        }
        pearson(&a, &b).ok_or_else(|| {
            PipelineError::Numerical(format!(
                "correlation of `{col_a}` and `{col_b}` is undefined: zero variance"
            ))
        })
    }

    /// Rows where any numeric column's `|x - mean| / std` exceeds `threshold`.
    pub fn detect_outliers(&self, threshold: f64) -> Result<OutlierReport, PipelineError> {
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Err(PipelineError::invalid(format!(
                "outlier threshold must be a finite value >= 0, got {threshold}"
            )));
        }

        let mut flagged = vec![false; self.table.height()];
        for column in self.numeric_columns() {
            let series = column.as_materialized_series();
            let (Some(m), Some(s)) = (series.mean(), sample_std(series)) else {
                continue;
            };
            if !(s.is_finite() && s > 0.0) {
                continue;
            }
            for (row, value) in float_values(column)?.into_iter().enumerate() {
                if value.is_some_and(|x| ((x - m) / s).abs() > threshold) {
                    flagged[row] = true;
                }
            }
        }

        let rows: Vec<usize> = flagged
            .iter()
            .enumerate()
            .filter_map(|(row, &hit)| hit.then_some(row))
            .collect();
        Ok(OutlierReport {
            threshold,
            table: take_rows(self.table, &rows)?,
            rows,
        })
    }

    /// Moving average with a shrinking window at the start (minimum period 1).
    ///
    /// Nulls inside a window are skipped; a window with no values yields `None`.
    pub fn rolling_trend(&self, column: &str, window: usize) -> Result<Vec<Option<f64>>, PipelineError> {
        if window == 0 {
            return Err(PipelineError::invalid("rolling window must be >= 1"));
        }
        self.column(column)?;
        let options = RollingOptionsFixedWindow {
            window_size: window,
            min_periods: 1,
            ..Default::default()
        };
        let trend = self
            .table
            .clone()
            .lazy()
            .select([col(column).cast(DataType::Float64).rolling_mean(options)])
            .collect()?;
        float_values(trend.column(column)?)
    }

    /// Full correlation matrix over the numeric columns, in frame order.
    ///
    /// Undefined pairs are `NaN`.
    pub fn correlation_matrix(&self) -> Vec<(String, Vec<f64>)> {
        let names = self.column_names();
        names
            .iter()
            .map(|a| {
                let row = names
                    .iter()
                    .map(|b| self.correlation(a, b).unwrap_or(f64::NAN))
                    .collect();
                (a.clone(), row)
            })
            .collect()
    }
}

fn sample_std(series: &Series) -> Option<f64> {
    series.std(1)
}

/// Render `describe()` output as a frame (index column `Kolonne`).
pub fn describe_table(summaries: &[ColumnSummary]) -> Result<DataFrame, PipelineError> {
    let frame = DataFrame::new(vec![
        Column::new("Kolonne".into(), summaries.iter().map(|s| s.column.clone()).collect::<Vec<_>>()),
        Column::new("Gjennomsnitt".into(), summaries.iter().map(|s| s.mean).collect::<Vec<_>>()),
        Column::new("Median".into(), summaries.iter().map(|s| s.median).collect::<Vec<_>>()),
        Column::new("Standardavvik".into(), summaries.iter().map(|s| s.std).collect::<Vec<_>>()),
    ])?;
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HUMIDITY, PRESSURE, TEMPERATURE, TIME, numeric_values};

    fn floats(name: &str, values: &[f64]) -> Column {
        Column::new(name.into(), values)
    }

    fn sample() -> DataFrame {
        DataFrame::new(vec![
            Column::new(TIME.into(), (0..5).map(|i| format!("0{i}.01.25 - 00:00")).collect::<Vec<_>>()),
            floats(TEMPERATURE, &[10.0, 12.0, 13.0, 15.0, 99.0]),
            floats(HUMIDITY, &[70.0, 72.0, 71.0, 73.0, 75.0]),
            floats(PRESSURE, &[1002.0, 1003.0, 1004.0, 1005.0, 1006.0]),
        ])
        .unwrap()
    }

    #[test]
    fn text_columns_are_excluded() {
        let table = sample();
        let engine = StatisticsEngine::new(&table);
        assert_eq!(engine.column_names(), vec![TEMPERATURE, HUMIDITY, PRESSURE]);
        assert!(matches!(engine.correlation(TIME, TEMPERATURE), Err(PipelineError::ColumnNotFound(_))));
    }

    #[test]
    fn per_column_statistics() {
        let table = sample();
        let engine = StatisticsEngine::new(&table);
        assert!((engine.mean_per_column()[TEMPERATURE] - 29.8).abs() < 1e-12);
        assert_eq!(engine.median_per_column()[HUMIDITY], 72.0);
        assert!(engine.std_per_column()[PRESSURE] > 0.0);

        let describe = engine.describe();
        assert_eq!(describe.len(), 3);
        assert_eq!(describe[0].column, TEMPERATURE);

        let rendered = describe_table(&describe).unwrap();
        assert_eq!(rendered.height(), 3);
        assert_eq!(numeric_values(&rendered, "Median").unwrap()[1], Some(72.0));
    }

    #[test]
    fn statistics_skip_nulls() {
        let table = DataFrame::new(vec![Column::new("X".into(), &[Some(1.0), None, Some(3.0), Some(5.0)])]).unwrap();
        let summary = &StatisticsEngine::new(&table).describe()[0];
        assert!((summary.mean - 3.0).abs() < 1e-12);
        assert!((summary.median - 3.0).abs() < 1e-12);
        assert!((summary.std - 2.0).abs() < 1e-12);
    }

    #[test]
    fn describe_constant_column() {
        let table = DataFrame::new(vec![floats("X", &[4.0, 4.0, 4.0])]).unwrap();
        let summary = &StatisticsEngine::new(&table).describe()[0];
        assert_eq!(summary.std, 0.0);
        assert_eq!(summary.mean, 4.0);
        assert_eq!(summary.median, 4.0);
    }

    #[test]
    fn correlation_is_bounded_and_validated() {
        let table = sample();
        let engine = StatisticsEngine::new(&table);
        let r = engine.correlation(TEMPERATURE, HUMIDITY).unwrap();
        assert!((-1.0..=1.0).contains(&r));
        assert!(matches!(
            engine.correlation(TEMPERATURE, "UgyldigKolonne"),
            Err(PipelineError::ColumnNotFound(_))
        ));

        let flat = DataFrame::new(vec![floats("A", &[1.0, 2.0]), floats("B", &[3.0, 3.0])]).unwrap();
        assert!(matches!(StatisticsEngine::new(&flat).correlation("A", "B"), Err(PipelineError::Numerical(_))));
    }

    #[test]
    fn outliers_respect_threshold() {
        let table = sample();
        let engine = StatisticsEngine::new(&table);

        // With n = 5 the largest attainable sample z-score is (n-1)/sqrt(n) ≈ 1.79,
        // so the extreme row is flagged at a threshold below that.
        let flagged = engine.detect_outliers(1.7).unwrap();
        assert_eq!(flagged.rows, vec![4]);
        assert_eq!(numeric_values(&flagged.table, TEMPERATURE).unwrap(), vec![Some(99.0)]);

        assert!(engine.detect_outliers(10.0).unwrap().is_empty());
        assert!(engine.detect_outliers(f64::NAN).is_err());
    }

    #[test]
    fn default_threshold_flags_a_spike_in_a_longer_series() {
        let mut temps: Vec<f64> = (0..30).map(|i| 10.0 + (i % 4) as f64).collect();
        temps[17] = 99.0;
        let table = DataFrame::new(vec![floats(TEMPERATURE, &temps)]).unwrap();

        let flagged = StatisticsEngine::new(&table)
            .detect_outliers(DEFAULT_OUTLIER_THRESHOLD)
            .unwrap();
        assert_eq!(flagged.rows, vec![17]);
    }

    #[test]
    fn zero_variance_columns_never_flag() {
        let table = DataFrame::new(vec![
            floats("Konstant", &[5.0, 5.0, 5.0, 5.0]),
            Column::new("Enslig".into(), &[Some(1.0), None, None, None]),
        ])
        .unwrap();
        assert!(StatisticsEngine::new(&table).detect_outliers(0.0).unwrap().is_empty());
    }

    #[test]
    fn rolling_trend_uses_shrinking_window() {
        let table = DataFrame::new(vec![floats(PRESSURE, &[1012.0, 1013.0, 1014.0])]).unwrap();
        let engine = StatisticsEngine::new(&table);
        assert_eq!(
            engine.rolling_trend(PRESSURE, 2).unwrap(),
            vec![Some(1012.0), Some(1012.5), Some(1013.5)]
        );
        assert!(matches!(engine.rolling_trend("FeilKolonne", 3), Err(PipelineError::ColumnNotFound(_))));
        assert!(matches!(engine.rolling_trend(PRESSURE, 0), Err(PipelineError::InvalidArgument(_))));
    }

    #[test]
    fn rolling_trend_skips_nulls() {
        let table = DataFrame::new(vec![Column::new("X".into(), &[None, Some(2.0), None, Some(4.0)])]).unwrap();
        let trend = StatisticsEngine::new(&table).rolling_trend("X", 2).unwrap();
        assert_eq!(trend, vec![None, Some(2.0), Some(2.0), Some(4.0)]);
    }
}
