//! `gmm-fit` library crate.
//!
//! One-dimensional Gaussian mixture fitting with batch EM, a multi-start
//! search over local optima, a histogram-based seed estimator and a 3-sigma
//! classifier.
//!
//! The binary (`gmm`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the fitting core can be used directly on `&[f64]` samples

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod histogram;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
