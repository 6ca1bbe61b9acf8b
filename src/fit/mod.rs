//! Mixture fitting orchestration.
//!
//! Responsibilities:
//!
//! - run EM from one seed to convergence (`em`)
//! - multi-start search: perturb the best fit and refit candidates in parallel (`search`)

pub mod em;
pub mod search;

pub use em::*;
pub use search::*;
