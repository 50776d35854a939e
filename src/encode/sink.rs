use std::path::PathBuf;

use crate::encode::codec::{CodecDescriptor, Container};
use crate::foundation::core::{Dimensions, Fps};
use crate::foundation::error::FramecapResult;
use crate::raster::frame::FrameRGBA;

/// Geometry and rate of an encoded stream, fixed for the life of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Frame size every ingested frame must match.
    pub dims: Dimensions,
    /// Nominal output frame rate.
    pub fps: Fps,
}

/// One ordered fragment of encoded output.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedChunk {
    /// Position in the stream, contiguous from 0.
    pub seq: u64,
    /// Timestamp of the most recent frame ingested when the chunk was produced.
    pub timestamp_secs: f64,
    /// Encoded bytes.
    pub data: Vec<u8>,
}

/// Encoder contract for consuming frames in arrival order.
///
/// Construction (through an [`EncoderFactory`]) is where a codec proves it is available; once
/// built, every returned byte buffer becomes one [`EncodedChunk`], in order.
pub trait ChunkEncoder: Send {
    /// Encode one frame. May return zero or more output fragments.
    fn encode_frame(&mut self, timestamp_secs: f64, frame: &FrameRGBA)
    -> FramecapResult<Vec<Vec<u8>>>;

    /// Flush all pending output. Called once after the last frame.
    fn finish(&mut self) -> FramecapResult<Vec<Vec<u8>>>;
}

/// Builds a [`ChunkEncoder`] for one codec, or fails if the codec cannot be instantiated.
pub trait EncoderFactory {
    /// Construct an encoder for `codec` at `cfg`.
    fn create(
        &self,
        codec: &CodecDescriptor,
        cfg: &EncoderConfig,
    ) -> FramecapResult<Box<dyn ChunkEncoder>>;
}

/// Factory used by default: pure-Rust Y4M, everything else through the system `ffmpeg`.
#[derive(Clone, Debug)]
pub struct DefaultEncoderFactory {
    /// `ffmpeg` executable.
    pub ffmpeg: PathBuf,
}

impl Default for DefaultEncoderFactory {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

impl EncoderFactory for DefaultEncoderFactory {
    fn create(
        &self,
        codec: &CodecDescriptor,
        cfg: &EncoderConfig,
    ) -> FramecapResult<Box<dyn ChunkEncoder>> {
        match codec.container {
            Container::Y4m => Ok(Box::new(crate::encode::y4m::Y4mEncoder::new(*cfg)?)),
            Container::Webm | Container::Mp4 => Ok(Box::new(
                crate::encode::ffmpeg::FfmpegEncoder::spawn(&self.ffmpeg, codec, cfg)?,
            )),
        }
    }
}
