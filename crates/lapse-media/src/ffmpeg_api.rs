//! MP4 encoding through a remote FFmpeg HTTP API.
//!
//! Frames are shipped as JPEGs together with a concat-demuxer `list.txt`
//! carrying per-frame display durations; the service runs FFmpeg and
//! returns a URL to the produced file.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::encoder::{Encoder, OutputFormat};
use crate::error::{MediaError, MediaResult};
use crate::frames::Frame;

const DEFAULT_API_URL: &str = "https://api.ffmpeg-api.com/ffmpeg/run";

/// Remote FFmpeg API configuration.
#[derive(Debug, Clone)]
pub struct RemoteFfmpegConfig {
    /// Endpoint that accepts multipart FFmpeg jobs.
    pub api_url: String,
    /// Value for the `Authorization` header.
    pub auth_token: String,
    /// Request timeout. Encoding a day's worth of frames takes a while.
    pub timeout: Duration,
}

impl RemoteFfmpegConfig {
    /// Create config from environment variables.
    pub fn from_env() -> MediaResult<Self> {
        let auth_token = std::env::var("FFMPEG_API_TOKEN")
            .map_err(|_| MediaError::config_error("FFMPEG_API_TOKEN not set"))?;

        let timeout_secs: u64 = std::env::var("FFMPEG_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(600);

        Ok(Self {
            api_url: std::env::var("FFMPEG_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            auth_token,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Encodes frames into MP4 via the remote FFmpeg service.
pub struct RemoteFfmpegEncoder {
    http: Client,
    config: RemoteFfmpegConfig,
}

impl RemoteFfmpegEncoder {
    /// Create a new encoder from configuration.
    pub fn new(config: RemoteFfmpegConfig) -> MediaResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("lapse-media/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(MediaError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> MediaResult<Self> {
        Self::new(RemoteFfmpegConfig::from_env()?)
    }

    fn frame_name(index: usize) -> String {
        format!("{:04}.jpg", index)
    }

    /// Concat-demuxer playlist with per-frame display durations.
    fn build_list(frame_count: usize, frame_duration_ms: u64) -> String {
        let duration_secs = frame_duration_ms as f64 / 1000.0;
        let mut list = String::new();
        for index in 0..frame_count {
            list.push_str(&format!(
                "file '{}'\nduration {:.3}\n",
                Self::frame_name(index),
                duration_secs
            ));
        }
        list
    }

    fn build_command() -> serde_json::Value {
        serde_json::json!({
            "inputs": [
                {
                    "file": "list.txt",
                    "options": ["-f", "concat", "-safe", "0"]
                }
            ],
            "outputs": [
                {
                    "file": "output.mp4",
                    "options": [
                        "-c:v", "libx264",
                        "-r", "4",
                        "-vf", "scale=1920:1080",
                        "-pix_fmt", "yuv420p"
                    ]
                }
            ]
        })
    }
}

#[async_trait]
impl Encoder for RemoteFfmpegEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Mp4
    }

    async fn encode(&self, frames: &[Frame], frame_duration_ms: u64) -> MediaResult<Vec<u8>> {
        if frames.is_empty() {
            return Err(MediaError::NoValidFrames);
        }

        info!(
            frames = frames.len(),
            frame_duration_ms, "Submitting FFmpeg API job"
        );

        let list = Self::build_list(frames.len(), frame_duration_ms);
        let mut form = Form::new().part(
            "list.txt",
            Part::text(list).file_name("list.txt"),
        );

        for (index, frame) in frames.iter().enumerate() {
            let name = Self::frame_name(index);
            let part = Part::bytes(frame.to_jpeg()?)
                .file_name(name.clone())
                .mime_str("image/jpeg")?;
            form = form.part(name, part);
        }

        form = form.part(
            "command",
            Part::text(Self::build_command().to_string()),
        );

        let response = self
            .http
            .post(&self.config.api_url)
            .header("Authorization", &self.config.auth_token)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::api_failed(format!(
                "FFmpeg API returned {}: {}",
                status, body
            )));
        }

        let run: RunResponse = response.json().await?;
        if !run.ok {
            return Err(MediaError::api_failed(format!(
                "FFmpeg API reported failure: {}",
                run.error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no detail".to_string())
            )));
        }

        let output = run
            .result
            .first()
            .ok_or_else(|| MediaError::api_failed("FFmpeg API returned no output files"))?;

        debug!(url = %output.file, "Downloading encoded output");
        let video = self.http.get(&output.file).send().await?;
        let status = video.status();
        if !status.is_success() {
            return Err(MediaError::api_failed(format!(
                "Output download returned {}",
                status
            )));
        }

        Ok(video.bytes().await?.to_vec())
    }
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    result: Vec<RunOutput>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RunOutput {
    file: String,
}
