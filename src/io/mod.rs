//! Input/output helpers.
//!
//! - analysis exports (CSV) (`export`)

pub mod export;

pub use export::*;
