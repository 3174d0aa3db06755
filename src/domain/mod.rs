//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the canonical column names and their source field paths
//! - typed access to the polars frames every stage reads and returns
//! - run configuration (`CleaningConfig`, `AnalysisConfig`, `SplitConfig`)
//! - stage outputs (`QualityReport`, `ColumnSummary`, `ModelScore`, ...)

pub mod config;
pub mod frame;
pub mod types;

pub use config::*;
pub use frame::*;
pub use types::*;
