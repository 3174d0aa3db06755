//! `weather-pipeline` library crate.
//!
//! The binary (`wx`) is a thin wrapper around this library so that:
//!
//! - cleaning, statistics and modeling are testable without spawning processes
//! - the stages can be reused from other front-ends or notebooks
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod clean;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod math;
pub mod predict;
pub mod report;
pub mod stats;
