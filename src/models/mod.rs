//! Gaussian mixture evaluation.
//!
//! Mixture-level quantities are implemented as small, pure functions so that
//! fitting/search code can stay focused on iteration logic.

pub mod classify;
pub mod mixture;

pub use classify::*;
pub use mixture::*;
