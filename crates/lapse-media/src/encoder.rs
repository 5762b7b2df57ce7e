//! The encoder capability.
//!
//! One orchestrator, two interchangeable encoders: the remote FFmpeg API
//! produces MP4, the local encoder produces GIF. Both consume the same
//! prepared frames and a per-frame display duration.

use async_trait::async_trait;

use crate::error::{MediaError, MediaResult};
use crate::frames::Frame;

/// Container format of a produced artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Mp4,
    Gif,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "mp4",
            OutputFormat::Gif => "gif",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "video/mp4",
            OutputFormat::Gif => "image/gif",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = MediaError;

    fn from_str(s: &str) -> MediaResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mp4" => Ok(OutputFormat::Mp4),
            "gif" => Ok(OutputFormat::Gif),
            other => Err(MediaError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Turns an ordered frame sequence into one artifact.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Container format this encoder produces.
    fn format(&self) -> OutputFormat;

    /// Encode `frames` with each frame displayed for `frame_duration_ms`.
    async fn encode(&self, frames: &[Frame], frame_duration_ms: u64) -> MediaResult<Vec<u8>>;
}
