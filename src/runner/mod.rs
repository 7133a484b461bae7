//! Check execution orchestration.
//!
//! - [`graph`] orders the registered checks by their dependencies
//! - [`engine`] runs them one at a time, applying remediations
//! - [`report`] aggregates the outcomes into a verdict

pub mod engine;
pub mod graph;
pub mod report;

pub use engine::{CheckupRunner, FixMode, RunOptions};
pub use graph::{CheckupGraph, GraphNode};
pub use report::{CheckOutcome, OutcomeStatus, RemediationOutcome, RunReport};
