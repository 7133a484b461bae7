//! State shared across one run.
//!
//! Checkup owns no persisted state; everything here lives for a single run.

pub mod shared;

pub use shared::SharedState;
