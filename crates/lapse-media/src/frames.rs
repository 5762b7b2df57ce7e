//! Frame preparation.
//!
//! Downloaded images arrive as raw byte buffers in capture order. Before
//! encoding they are decoded, invalid buffers are dropped, and every frame
//! is standardized to the first valid frame's dimensions so the encoder
//! sees a uniform clip.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageOutputFormat};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// A decoded frame, standardized to the clip's dimensions.
pub struct Frame {
    pub image: DynamicImage,
}

impl Frame {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Re-encode the frame as JPEG for transport to a remote encoder.
    pub fn to_jpeg(&self) -> MediaResult<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        self.image.write_to(&mut buf, ImageOutputFormat::Jpeg(90))?;
        Ok(buf.into_inner())
    }
}

/// Decode raw image buffers into standardized frames, preserving order.
///
/// Buffers that fail to decode are dropped with a warning. Every surviving
/// frame is resized to the first valid frame's dimensions. Returns
/// [`MediaError::NoValidFrames`] when nothing survives.
pub fn prepare_frames(buffers: &[Vec<u8>]) -> MediaResult<Vec<Frame>> {
    let mut frames: Vec<Frame> = Vec::with_capacity(buffers.len());
    let mut target: Option<(u32, u32)> = None;

    for (index, bytes) in buffers.iter().enumerate() {
        let image = match image::load_from_memory(bytes) {
            Ok(image) => image,
            Err(e) => {
                warn!(index, "Dropping undecodable frame: {}", e);
                continue;
            }
        };

        let image = match target {
            None => {
                target = Some((image.width(), image.height()));
                image
            }
            Some((w, h)) if (image.width(), image.height()) != (w, h) => {
                debug!(
                    index,
                    from = ?(image.width(), image.height()),
                    to = ?(w, h),
                    "Resizing frame to clip dimensions"
                );
                image.resize_exact(w, h, FilterType::Lanczos3)
            }
            Some(_) => image,
        };

        frames.push(Frame { image });
    }

    if frames.is_empty() {
        return Err(MediaError::NoValidFrames);
    }

    Ok(frames)
}
