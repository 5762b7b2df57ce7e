//! Local GIF encoding.

use async_trait::async_trait;
use image::codecs::gif::Repeat;
use image::Delay;
use tracing::debug;

use crate::encoder::{Encoder, OutputFormat};
use crate::error::{MediaError, MediaResult};
use crate::frames::Frame;

/// Encodes frames into a looping GIF animation in-process.
#[derive(Debug, Default)]
pub struct GifAnimationEncoder;

impl GifAnimationEncoder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Encoder for GifAnimationEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Gif
    }

    async fn encode(&self, frames: &[Frame], frame_duration_ms: u64) -> MediaResult<Vec<u8>> {
        if frames.is_empty() {
            return Err(MediaError::NoValidFrames);
        }

        debug!(
            frames = frames.len(),
            frame_duration_ms, "Encoding GIF animation"
        );

        let mut buf = Vec::new();
        {
            let mut encoder = image::codecs::gif::GifEncoder::new(&mut buf);
            encoder.set_repeat(Repeat::Infinite)?;

            let delay = Delay::from_numer_denom_ms(frame_duration_ms as u32, 1);
            for frame in frames {
                let rgba = frame.image.to_rgba8();
                encoder.encode_frame(image::Frame::from_parts(rgba, 0, 0, delay))?;
            }
        }

        Ok(buf)
    }
}
