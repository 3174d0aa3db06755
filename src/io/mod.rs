//! Input/output helpers.
//!
//! - field extraction from raw records (`extract`)
//! - forecast document ingest + flattening (`ingest`)
//! - table / metrics exports (`export`)

pub mod export;
pub mod extract;
pub mod ingest;

pub use export::*;
pub use extract::*;
pub use ingest::*;
