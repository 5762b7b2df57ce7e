//! Error types for media operations.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while preparing frames or encoding.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("No valid frames to encode")]
    NoValidFrames,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Encoding API failed: {0}")]
    ApiFailed(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn api_failed(msg: impl Into<String>) -> Self {
        Self::ApiFailed(msg.into())
    }
}
