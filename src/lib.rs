//! Framecap is a frame-accurate video capture pipeline.
//!
//! A source is seeked through a timestamp sequence; each decoded frame is drawn into a single
//! off-screen surface and then either snapshotted as a PNG or handed to a streaming encoder.
//! Three operations are built on that loop:
//!
//! - [`PipelineOrchestrator::compress`]: resample one source to a target width and frame rate
//! - [`PipelineOrchestrator::extract_frames`]: periodic PNG snapshots of one source
//! - [`PipelineOrchestrator::merge`]: concatenate several sources into one encoded artifact
//!
//! Decoding and encoding are collaborators behind [`DecodeService`] and [`EncoderFactory`].
//! The crate ships a synthetic decoder, an `ffprobe`/`ffmpeg` decoder (feature `media-ffmpeg`),
//! a pure-Rust Y4M encoder and an `ffmpeg` encoder.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Frame stepping, sampling and cancellation.
pub mod capture;
/// Encoder sessions and encoders.
pub mod encode;
/// Orchestration of the capture operations.
pub mod pipeline;
/// Off-screen rasters.
pub mod raster;
/// Source decoding.
pub mod source;

pub use crate::foundation::core::{Dimensions, Fps};
pub use crate::foundation::error::{FailureKind, FailureReason, FramecapError, FramecapResult};
pub use crate::foundation::tools::{ensure_parent_dir, is_ffmpeg_on_path};

pub use crate::capture::cancel::CancelToken;
pub use crate::capture::sampler::{FrameSample, FrameSampler};
pub use crate::capture::stepper::{SeekStepper, StepFrame, StepStats};
pub use crate::capture::timeline::sample_times;
pub use crate::encode::codec::{CodecDescriptor, CodecList, Container};
pub use crate::encode::session::{EncodedStream, EncoderSession, SessionOpts};
pub use crate::encode::sink::{
    ChunkEncoder, DefaultEncoderFactory, EncodedChunk, EncoderConfig, EncoderFactory,
};
pub use crate::pipeline::artifact::OutputArtifact;
pub use crate::pipeline::config::{CaptureConfig, PipelineConfig, PipelineOpts};
pub use crate::pipeline::orchestrator::{HeldResources, PipelineOrchestrator};
pub use crate::pipeline::state::PipelineState;
pub use crate::raster::frame::FrameRGBA;
pub use crate::raster::surface::{DrawMode, RasterSurface};
pub use crate::source::decoder::{DecodeService, Decoder, MediaInfo, SeekSignal, SourceInput};
pub use crate::source::ffmpeg::FfmpegDecodeService;
pub use crate::source::handle::{SourceDescriptor, SourceHandle, SourceOrigin};
pub use crate::source::synthetic::{SyntheticDecodeService, SyntheticSource};
