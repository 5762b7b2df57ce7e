//! Frame preparation and timelapse encoding.
//!
//! This crate provides:
//! - Decoding and dimension standardization of downloaded frames
//! - The [`Encoder`] capability with two implementations:
//!   remote FFmpeg API (MP4) and local GIF encoding

pub mod encoder;
pub mod error;
pub mod ffmpeg_api;
pub mod frames;
pub mod gif;

pub use encoder::{Encoder, OutputFormat};
pub use error::{MediaError, MediaResult};
pub use ffmpeg_api::{RemoteFfmpegConfig, RemoteFfmpegEncoder};
pub use frames::{prepare_frames, Frame};
pub use gif::GifAnimationEncoder;
