//! Timelapse cadences and their policy constants.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Artifact-generation cadence.
///
/// Each cadence owns the constants the policy layer needs: the span of the
/// window it covers, the playback speed of the resulting timelapse, the
/// minimum number of source images required before a build is worthwhile,
/// and the name of the output subfolder it uploads into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Hourly,
    Daily,
    Weekly,
}

impl Cadence {
    /// Processing order for one batch invocation. Order matters: daily
    /// cleanup purges hourly output, weekly cleanup purges daily output.
    pub const ALL: [Cadence; 3] = [Cadence::Hourly, Cadence::Daily, Cadence::Weekly];

    /// Length of the window covered by one artifact.
    pub fn span(&self) -> Duration {
        match self {
            Cadence::Hourly => Duration::hours(1),
            Cadence::Daily => Duration::days(1),
            Cadence::Weekly => Duration::days(7),
        }
    }

    /// Playback duration of a single frame, in milliseconds.
    pub fn frame_duration_ms(&self) -> u64 {
        match self {
            Cadence::Hourly => 250,
            Cadence::Daily => 100,
            Cadence::Weekly => 50,
        }
    }

    /// Minimum source images required before a build proceeds.
    pub fn min_images(&self) -> usize {
        match self {
            Cadence::Hourly => 60,
            Cadence::Daily => 720,
            Cadence::Weekly => 1440,
        }
    }

    /// Name of the output subfolder under the timelapse root.
    pub fn output_folder(&self) -> &'static str {
        match self {
            Cadence::Hourly => "hourly",
            Cadence::Daily => "daily",
            Cadence::Weekly => "weekly",
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.output_folder()
    }
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
