//! Error types.
//!
//! The library reports failures through [`PipelineError`]. The binary wraps
//! those in [`AppError`], which carries the process exit code:
//!
//! - `2`: bad input (missing fields, unknown columns, invalid arguments)
//! - `3`: modeling / numerical failures
//! - `4`: I/O, serialization and data-frame failures

use thiserror::Error;

/// Errors raised by the cleaning, statistics and prediction stages.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required field is absent from a raw record.
    #[error("Missing field `{segment}` while resolving `{path}`")]
    MissingField { path: String, segment: String },

    /// An operation named a column the working table does not have.
    #[error("Column not found: `{0}`")]
    ColumnNotFound(String),

    /// A parameter is out of range or otherwise unusable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A value could not be coerced to the expected type.
    #[error("Cannot convert `{path}` to {expected}: {value}")]
    TypeConversion {
        path: String,
        expected: &'static str,
        value: String,
    },

    #[error("Insufficient data for {operation}: need at least {required}, got {actual}")]
    InsufficientData {
        operation: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("Numerical failure: {0}")]
    Numerical(String),

    /// A prediction was requested from a model that has not been fitted.
    #[error("Model not fitted: {0}")]
    NotFitted(String),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Failure inside the data-frame engine, including CSV reading and writing.
    #[error("Data frame error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl PipelineError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn column(name: impl Into<String>) -> Self {
        Self::ColumnNotFound(name.into())
    }

    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Top-level error for the `wx` binary.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let exit_code = match &err {
            PipelineError::MissingField { .. }
            | PipelineError::ColumnNotFound(_)
            | PipelineError::InvalidArgument(_)
            | PipelineError::TypeConversion { .. } => 2,
            PipelineError::InsufficientData { .. }
            | PipelineError::Numerical(_)
            | PipelineError::NotFitted(_) => 3,
            PipelineError::Io { .. } | PipelineError::Json(_) | PipelineError::Polars(_) => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        let input: AppError = PipelineError::column("Trykk").into();
        assert_eq!(input.exit_code(), 2);
        assert_eq!(input.to_string(), "Column not found: `Trykk`");

        let model: AppError = PipelineError::NotFitted("Linear".to_string()).into();
        assert_eq!(model.exit_code(), 3);

        let frame: AppError = PipelineError::from(polars::prelude::PolarsError::NoData("empty".into())).into();
        assert_eq!(frame.exit_code(), 4);
    }
}
