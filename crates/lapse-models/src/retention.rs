//! Retention decisions and post-build cleanup plans.
//!
//! Retention is a trailing-edge compaction scheme: once a higher cadence
//! subsumes a lower one, the lower tier's artifacts (and, at the top, the
//! raw source images) are purged to bound storage growth. The decision
//! types here are pure; the worker evaluates them against the store.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

use crate::cadence::Cadence;
use crate::window::TimeWindow;

/// Why a cadence was skipped without building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// The artifact for this window already exists in the output folder.
    AlreadyBuilt,
    /// Too few source images landed in the window.
    TooFewImages { found: usize, required: usize },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyBuilt => write!(f, "artifact already exists"),
            Self::TooFewImages { found, required } => {
                write!(f, "insufficient images: {} < {}", found, required)
            }
        }
    }
}

/// Outcome of the pre-build gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildDecision {
    Proceed,
    Skip(SkipReason),
}

/// Terminal state of one cadence within one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CadenceOutcome {
    /// Artifact built and uploaded.
    Built { frames: usize, artifact: String },
    Skipped(SkipReason),
    Failed(String),
}

impl CadenceOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, CadenceOutcome::Failed(_))
    }
}

impl std::fmt::Display for CadenceOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Built { frames, artifact } => {
                write!(f, "built {} ({} frames)", artifact, frames)
            }
            Self::Skipped(reason) => write!(f, "skipped ({})", reason),
            Self::Failed(err) => write!(f, "failed ({})", err),
        }
    }
}

/// A single best-effort deletion performed after a successful build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupAction {
    /// Delete every artifact in the given cadence's output folder.
    PurgeArtifacts(Cadence),
    /// Delete source images created strictly before the instant.
    PurgeImagesBefore(DateTime<Tz>),
}

/// Deletions owed after a successful build of `window`.
///
/// Only reached from a built state: a failed or skipped cadence performs no
/// deletions. Daily subsumes hourly output; weekly subsumes daily output
/// and the raw images the closed week covered.
pub fn cleanup_actions(window: &TimeWindow) -> Vec<CleanupAction> {
    match window.cadence {
        Cadence::Hourly => Vec::new(),
        Cadence::Daily => vec![CleanupAction::PurgeArtifacts(Cadence::Hourly)],
        Cadence::Weekly => vec![
            CleanupAction::PurgeArtifacts(Cadence::Daily),
            CleanupAction::PurgeImagesBefore(window.end),
        ],
    }
}
