//! Reporting utilities: formatted terminal output for each command.

pub mod format;

pub use format::*;
