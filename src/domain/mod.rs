//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - mixture parameters and component records (`MixtureParameters`, `Component`)
//! - fit outputs (`FitResult`, `StopReason`) and classification labels (`Category`)
//! - run configurations derived from the CLI (`FitConfig`, `HistogramConfig`, ...)

pub mod types;

pub use types::*;
