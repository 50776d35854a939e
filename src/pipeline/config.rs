use std::path::Path;
use std::time::Duration;

use crate::encode::codec::{CodecDescriptor, CodecList};
use crate::encode::session::SessionOpts;
use crate::foundation::core::Fps;
use crate::foundation::error::{FramecapError, FramecapResult};
use crate::source::handle::DEFAULT_SEEK_TIMEOUT;

/// What to capture: output size, rate, snapshot interval and codec preference.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    /// Requested output width; clamped to the native width.
    pub target_width: u32,
    /// Output frame rate for compress and merge.
    pub frame_rate: f64,
    /// Snapshot interval for frame extraction.
    pub sampling_interval_secs: f64,
    /// Codecs tried in order.
    pub codecs: CodecList,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            target_width: 640,
            frame_rate: 30.0,
            sampling_interval_secs: 1.0,
            codecs: CodecList::default(),
        }
    }
}

impl CaptureConfig {
    /// Replace the codec list with `preferred` then `fallback`.
    pub fn with_codecs(mut self, preferred: CodecDescriptor, fallback: CodecDescriptor) -> Self {
        self.codecs = CodecList::preferred_then(preferred, fallback);
        self
    }

    /// Check ranges.
    pub fn validate(&self) -> FramecapResult<()> {
        if self.target_width == 0 {
            return Err(FramecapError::validation("target_width must be > 0"));
        }
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(FramecapError::validation(format!(
                "frame_rate must be finite and > 0, got {}",
                self.frame_rate
            )));
        }
        if !self.sampling_interval_secs.is_finite() || self.sampling_interval_secs <= 0.0 {
            return Err(FramecapError::validation(format!(
                "sampling_interval_secs must be finite and > 0, got {}",
                self.sampling_interval_secs
            )));
        }
        if self.codecs.is_empty() {
            return Err(FramecapError::validation("codec list must not be empty"));
        }
        Ok(())
    }

    /// Output rate as a rational.
    pub fn fps(&self) -> FramecapResult<Fps> {
        Fps::from_f64(self.frame_rate)
    }
}

/// How the pipeline runs: timeouts, pacing and encoder buffering.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineOpts {
    /// Bound on every seek.
    #[serde(rename = "seek_timeout_ms", with = "millis")]
    pub seek_timeout: Duration,
    /// Sleep this fraction of the step interval after each draw (`0` = off).
    pub pacing_fraction: f64,
    /// Wait before closing the encoder feed.
    #[serde(rename = "settle_ms", with = "millis")]
    pub settle: Duration,
    /// Frames buffered between the stepper and the encoder thread.
    pub channel_capacity: usize,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        Self {
            seek_timeout: DEFAULT_SEEK_TIMEOUT,
            pacing_fraction: 0.0,
            settle: Duration::ZERO,
            channel_capacity: 4,
        }
    }
}

impl PipelineOpts {
    /// Check ranges.
    pub fn validate(&self) -> FramecapResult<()> {
        if self.seek_timeout.is_zero() {
            return Err(FramecapError::validation("seek_timeout_ms must be > 0"));
        }
        if !self.pacing_fraction.is_finite() || !(0.0..=1.0).contains(&self.pacing_fraction) {
            return Err(FramecapError::validation(format!(
                "pacing_fraction must be within [0, 1], got {}",
                self.pacing_fraction
            )));
        }
        if self.channel_capacity == 0 {
            return Err(FramecapError::validation("channel_capacity must be > 0"));
        }
        Ok(())
    }

    pub(crate) fn session_opts(&self) -> SessionOpts {
        SessionOpts {
            channel_capacity: self.channel_capacity,
            settle: self.settle,
        }
    }
}

/// On-disk configuration: both sections, each optional.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Capture section.
    pub capture: CaptureConfig,
    /// Runtime section.
    pub pipeline: PipelineOpts,
}

impl PipelineConfig {
    /// Parse JSON and validate both sections.
    pub fn from_json_str(s: &str) -> FramecapResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| FramecapError::validation(format!("invalid config: {e}")))?;
        cfg.capture.validate()?;
        cfg.pipeline.validate()?;
        Ok(cfg)
    }

    /// Load a JSON file.
    pub fn from_path(path: &Path) -> FramecapResult<Self> {
        use anyhow::Context as _;
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        Self::from_json_str(&s)
    }
}

mod millis {
    use std::time::Duration;

    pub(super) fn serialize<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = <u64 as serde::Deserialize>::deserialize(d)?;
        Ok(Duration::from_millis(ms))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/config.rs"]
mod tests;
