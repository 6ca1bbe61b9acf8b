//! Input/output helpers.
//!
//! - CSV sample ingest + validation (`ingest`)
//! - classification export (CSV) (`export`)
//! - model JSON read/write (`model`)

pub mod export;
pub mod ingest;
pub mod model;

pub use export::*;
pub use ingest::*;
pub use model::*;
