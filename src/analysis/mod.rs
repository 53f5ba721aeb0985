//! Analysis modules.
//!
//! Metric generation, aggregation and assembly of a full dashboard pass.

pub mod aggregator;
pub mod dashboard;

pub use aggregator::*;
pub use dashboard::*;
