//! Feature preprocessing fitted on the training split.
//!
//! - [`StandardScaler`]: numeric columns to zero mean / unit variance, using the
//!   training mean and population standard deviation. A constant feature is
//!   scaled by 1.
//! - [`OneHotEncoder`]: text columns to indicator columns over the sorted
//!   training categories, dropping the first. Unseen or null categories encode
//!   as all zeros.
//!
//! Both produce dense columns; the caller stitches them into one design matrix.

use std::collections::BTreeSet;

use polars::prelude::*;

use crate::domain::{numeric_values, require, text_values};
use crate::error::PipelineError;

#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    columns: Vec<String>,
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(columns: &[String], train: &DataFrame) -> Result<Self, PipelineError> {
        let mut means = Vec::with_capacity(columns.len());
        let mut scales = Vec::with_capacity(columns.len());
        for name in columns {
            dense_numeric(train, name)?;
            let series = require(train, name)?.as_materialized_series();
            means.push(series.mean().unwrap_or(0.0));
            let std = series.std(0).unwrap_or(f64::NAN);
            scales.push(if std.is_finite() && std > 0.0 { std } else { 1.0 });
        }
        Ok(Self {
            columns: columns.to_vec(),
            means,
            scales,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// One scaled output column per input column.
    pub fn transform(&self, table: &DataFrame) -> Result<Vec<Vec<f64>>, PipelineError> {
        self.columns
            .iter()
            .zip(self.means.iter().zip(self.scales.iter()))
            .map(|(name, (&mean, &scale))| {
                Ok(dense_numeric(table, name)?
                    .into_iter()
                    .map(|x| (x - mean) / scale)
                    .collect())
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OneHotEncoder {
    columns: Vec<String>,
    /// Sorted training categories per column, including the dropped first one.
    categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    pub fn fit(columns: &[String], train: &DataFrame) -> Result<Self, PipelineError> {
        let categories = columns
            .iter()
            .map(|name| {
                let values = text_values(require(train, name)?)?;
                let distinct: BTreeSet<&str> = values.iter().flatten().map(String::as_str).collect();
                Ok(distinct.into_iter().map(str::to_string).collect())
            })
            .collect::<Result<Vec<Vec<String>>, PipelineError>>()?;
        Ok(Self {
            columns: columns.to_vec(),
            categories,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of indicator columns produced.
    pub fn width(&self) -> usize {
        self.categories.iter().map(|c| c.len().saturating_sub(1)).sum()
    }

    /// Output column labels, `<column>_<category>`.
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(self.categories.iter())
            .flat_map(|(name, cats)| cats.iter().skip(1).map(move |cat| format!("{name}_{cat}")))
            .collect()
    }

    pub fn transform(&self, table: &DataFrame) -> Result<Vec<Vec<f64>>, PipelineError> {
        let mut out = Vec::with_capacity(self.width());
        for (name, cats) in self.columns.iter().zip(self.categories.iter()) {
            let values = text_values(require(table, name)?)?;
            for cat in cats.iter().skip(1) {
                out.push(
                    values
                        .iter()
                        .map(|v| if v.as_deref() == Some(cat.as_str()) { 1.0 } else { 0.0 })
                        .collect(),
                );
            }
        }
        Ok(out)
    }
}

/// Numeric column values with nulls rejected.
pub(crate) fn dense_numeric(table: &DataFrame, name: &str) -> Result<Vec<f64>, PipelineError> {
    numeric_values(table, name)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| {
                PipelineError::invalid(format!(
                    "column `{name}` has a missing value at row {row}; apply a missing-value policy first"
                ))
            })
        })
        .collect()
}
