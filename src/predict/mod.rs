//! Regression on the cleaned table.
//!
//! A [`PredictionPipeline`] owns:
//! - the feature/target table and its reproducible train/test split
//! - a name-keyed registry of [`FittedPipeline`]s
//! - the latest holdout [`EvaluationResult`]
//!
//! Each fitted pipeline is three plain values applied in order: a fitted
//! [`StandardScaler`] for numeric features, a fitted [`OneHotEncoder`] for text
//! features, and a [`LinearFit`]. Preprocessing statistics come from the
//! training rows only; evaluation never refits.
//!
//! Lifecycle: `new` (Split) → `fit_linear` (Fitted) → `evaluate` (Evaluated).

pub mod metrics;
pub mod preprocess;
pub mod split;

pub use metrics::*;
pub use preprocess::*;
pub use split::*;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use nalgebra::{DMatrix, DVector};
use polars::prelude::DataFrame;
use tracing::{debug, info};

use crate::domain::{
    ColumnKind, DiagnosticRow, EvaluationResult, ModelScore, SplitConfig, TIME, take_rows, timestamp_values,
};
use crate::error::PipelineError;
use crate::math::{LinearFit, fit_with_intercept};

/// Registry name of the ordinary least squares model.
pub const LINEAR_MODEL: &str = "Linear";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Split,
    Fitted,
    Evaluated,
}

/// Scaler + encoder + estimator, fitted together on one training split.
#[derive(Debug, Clone)]
pub struct FittedPipeline {
    pub name: String,
    pub numeric: StandardScaler,
    pub categorical: OneHotEncoder,
    pub estimator: LinearFit,
}

impl FittedPipeline {
    /// Predict the target for every row of `table`.
    ///
    /// `table` needs every feature column seen during fitting, with the same
    /// kinds. Extra columns are ignored.
    pub fn predict(&self, table: &DataFrame) -> Result<Vec<f64>, PipelineError> {
        let x = design_matrix(&self.numeric, &self.categorical, table)?;
        Ok((0..x.nrows())
            .map(|i| {
                let row: Vec<f64> = x.row(i).iter().copied().collect();
                self.estimator.predict_row(&row)
            })
            .collect())
    }

    pub fn feature_names(&self) -> Vec<String> {
        let mut names = self.numeric.columns().to_vec();
        names.extend(self.categorical.feature_names());
        names
    }
}

#[derive(Debug, Clone)]
pub struct PredictionPipeline {
    table: DataFrame,
    target: String,
    numeric_features: Vec<String>,
    categorical_features: Vec<String>,
    split: TrainTestSplit,
    models: BTreeMap<String, FittedPipeline>,
    latest: Option<String>,
    results: EvaluationResult,
    stage: Stage,
}

impl PredictionPipeline {
    /// Validate the target, classify features by column kind, and split rows.
    ///
    /// Features are every column except the target and `Tid`. Numeric columns
    /// are standardized, text columns one-hot encoded, any other column is
    /// ignored.
    pub fn new(table: &DataFrame, target: &str, config: &SplitConfig) -> Result<Self, PipelineError> {
        let Ok(target_column) = table.column(target) else {
            let names: Vec<String> = table.get_column_names().iter().map(|n| n.to_string()).collect();
            return Err(PipelineError::invalid(format!(
                "target column `{target}` not in table (columns: {})",
                names.join(", ")
            )));
        };
        if ColumnKind::of(target_column) != ColumnKind::Numeric {
            return Err(PipelineError::invalid(format!("target column `{target}` is not numeric")));
        }
        dense_numeric(table, target)?;

        let mut numeric_features = Vec::new();
        let mut categorical_features = Vec::new();
        for column in table.get_columns() {
            let name = column.name().as_str();
            if name == target || name == TIME {
                continue;
            }
            match ColumnKind::of(column) {
                ColumnKind::Numeric => {
                    dense_numeric(table, name)?;
                    numeric_features.push(name.to_string());
                }
                ColumnKind::Text => categorical_features.push(name.to_string()),
                kind => debug!(column = name, ?kind, "ignoring feature column"),
            }
        }

        let split = train_test_split(table.height(), config)?;
        info!(
            target_column = target,
            numeric = numeric_features.len(),
            categorical = categorical_features.len(),
            train = split.train.len(),
            test = split.test.len(),
            "split prediction data"
        );

        Ok(Self {
            table: table.clone(),
            target: target.to_string(),
            numeric_features,
            categorical_features,
            split,
            models: BTreeMap::new(),
            latest: None,
            results: EvaluationResult::new(),
            stage: Stage::Split,
        })
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn numeric_features(&self) -> &[String] {
        &self.numeric_features
    }

    pub fn categorical_features(&self) -> &[String] {
        &self.categorical_features
    }

    pub fn split(&self) -> &TrainTestSplit {
        &self.split
    }

    pub fn train_table(&self) -> Result<DataFrame, PipelineError> {
        take_rows(&self.table, &self.split.train)
    }

    pub fn test_table(&self) -> Result<DataFrame, PipelineError> {
        take_rows(&self.table, &self.split.test)
    }

    /// Results of the latest `evaluate`.
    pub fn results(&self) -> &EvaluationResult {
        &self.results
    }

    pub fn model(&self, name: &str) -> Option<&FittedPipeline> {
        self.models.get(name)
    }

    /// Fit scaler, encoder and OLS on the training rows; register as `"Linear"`.
    pub fn fit_linear(&mut self) -> Result<&FittedPipeline, PipelineError> {
        let train = self.train_table()?;
        let numeric = StandardScaler::fit(&self.numeric_features, &train)?;
        let categorical = OneHotEncoder::fit(&self.categorical_features, &train)?;

        let x = design_matrix(&numeric, &categorical, &train)?;
        let y = DVector::from_vec(dense_numeric(&train, &self.target)?);
        let estimator = fit_with_intercept(&x, &y)
            .ok_or_else(|| PipelineError::Numerical("least squares produced a non-finite solution".to_string()))?;
        debug!(
            features = x.ncols(),
            rows = x.nrows(),
            intercept = estimator.intercept,
            "fitted linear model"
        );

        let fitted = FittedPipeline {
            name: LINEAR_MODEL.to_string(),
            numeric,
            categorical,
            estimator,
        };
        self.models.insert(LINEAR_MODEL.to_string(), fitted);
        self.latest = Some(LINEAR_MODEL.to_string());
        self.stage = Stage::Fitted;
        info!(model = LINEAR_MODEL, "model fitted");

        self.models
            .get(LINEAR_MODEL)
            .ok_or_else(|| PipelineError::NotFitted(LINEAR_MODEL.to_string()))
    }

    /// Score every registered model on the held-out rows.
    ///
    /// With no fitted model this returns an empty result and the stage stays
    /// where it was.
    pub fn evaluate(&mut self) -> Result<EvaluationResult, PipelineError> {
        if self.models.is_empty() {
            debug!("evaluate called with no fitted models");
            return Ok(EvaluationResult::new());
        }
        let test = self.test_table()?;
        let results = self.evaluate_on(&test)?;
        for (name, score) in &results {
            info!(model = %name, r2 = score.r2, rmse = score.rmse, "evaluated on holdout");
        }
        self.results = results.clone();
        self.stage = Stage::Evaluated;
        Ok(results)
    }

    /// Score every registered model on an arbitrary table holding the target.
    ///
    /// Does not change the pipeline stage. A table without rows cannot be
    /// scored.
    pub fn evaluate_on(&self, table: &DataFrame) -> Result<EvaluationResult, PipelineError> {
        if table.height() == 0 {
            return Err(PipelineError::InsufficientData {
                operation: "evaluation",
                required: 1,
                actual: 0,
            });
        }
        let actual = dense_numeric(table, &self.target)?;
        self.models
            .iter()
            .map(|(name, model)| {
                let predicted = model.predict(table)?;
                Ok((
                    name.clone(),
                    ModelScore {
                        r2: r2(&actual, &predicted),
                        rmse: rmse(&actual, &predicted),
                    },
                ))
            })
            .collect()
    }

    /// Predict with the most recently fitted model.
    pub fn predict(&self, table: &DataFrame) -> Result<Vec<f64>, PipelineError> {
        self.latest_model()?.predict(table)
    }

    pub fn predict_with(&self, name: &str, table: &DataFrame) -> Result<Vec<f64>, PipelineError> {
        self.models
            .get(name)
            .ok_or_else(|| PipelineError::NotFitted(name.to_string()))?
            .predict(table)
    }

    /// Test rows with actual, predicted and absolute error, oldest first.
    ///
    /// Uses the most recently fitted model. Rows without a timestamp sort last.
    pub fn diagnostics_frame(&self) -> Result<Vec<DiagnosticRow>, PipelineError> {
        let model = self.latest_model()?;
        let test = self.test_table()?;
        let actual = dense_numeric(&test, &self.target)?;
        let predicted = model.predict(&test)?;
        let timestamps: Vec<Option<DateTime<Utc>>> = match test.column(TIME) {
            Ok(column) if ColumnKind::of(column) == ColumnKind::Timestamp => timestamp_values(column)?,
            _ => vec![None; test.height()],
        };

        let mut rows: Vec<DiagnosticRow> = timestamps
            .into_iter()
            .zip(actual.into_iter().zip(predicted))
            .map(|(timestamp, (actual, predicted))| DiagnosticRow {
                timestamp,
                day: timestamp.map(|t| t.date_naive()),
                actual,
                predicted,
                abs_error: (actual - predicted).abs(),
            })
            .collect();
        rows.sort_by_key(|r| (r.timestamp.is_none(), r.timestamp));
        Ok(rows)
    }

    fn latest_model(&self) -> Result<&FittedPipeline, PipelineError> {
        self.latest
            .as_deref()
            .and_then(|name| self.models.get(name))
            .ok_or_else(|| PipelineError::NotFitted("no model has been fitted".to_string()))
    }
}

fn design_matrix(
    numeric: &StandardScaler,
    categorical: &OneHotEncoder,
    table: &DataFrame,
) -> Result<DMatrix<f64>, PipelineError> {
    let mut columns = numeric.transform(table)?;
    columns.extend(categorical.transform(table)?);
    Ok(DMatrix::from_fn(table.height(), columns.len(), |i, j| columns[j][i]))
}
