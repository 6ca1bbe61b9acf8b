//! Mathematical utilities: cached Gaussian density evaluation.

pub mod gaussian;

pub use gaussian::*;
