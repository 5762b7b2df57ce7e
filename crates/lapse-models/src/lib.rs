//! Shared data models for the timelapse backend.
//!
//! This crate provides the pure types the worker and collaborator crates
//! share:
//! - Cadences (hourly/daily/weekly) and their policy constants
//! - Time windows and deterministic artifact naming
//! - Retention decisions and post-build cleanup plans

pub mod cadence;
pub mod retention;
pub mod window;

// Re-export common types
pub use cadence::Cadence;
pub use retention::{
    cleanup_actions, BuildDecision, CadenceOutcome, CleanupAction, SkipReason,
};
pub use window::{TimeWindow, REFERENCE_ZONE};
