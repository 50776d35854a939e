use std::path::Path;
use std::sync::{Arc, mpsc};

use crate::foundation::error::{FramecapError, FramecapResult};
use crate::raster::frame::FrameRGBA;

/// Metadata a decoder reports once a source is opened.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MediaInfo {
    /// Native width in pixels.
    pub width: u32,
    /// Native height in pixels.
    pub height: u32,
    /// Duration in seconds.
    pub duration_secs: f64,
}

/// One opaque encoded video byte stream supplied by the caller.
#[derive(Clone, Debug)]
pub struct SourceInput {
    /// Display name, used for logs and suggested output names.
    pub name: String,
    /// Encoded bytes.
    pub bytes: Arc<[u8]>,
}

impl SourceInput {
    /// Wrap in-memory bytes.
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file into memory.
    pub fn from_path(path: &Path) -> FramecapResult<Self> {
        use anyhow::Context as _;
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read input '{}'", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string());
        Ok(Self::new(name, bytes))
    }

    /// Name without its extension.
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }
}

pub(crate) type SeekOutcome = Result<FrameRGBA, String>;

/// Completion signal handed to a [`Decoder`] for one seek request.
///
/// A decoder must eventually call [`SeekSignal::complete`] or [`SeekSignal::fail`]. A signal that
/// never fires is reported as a seek timeout; a signal dropped without firing is reported as an
/// interrupted decode.
#[derive(Debug)]
pub struct SeekSignal {
    target_secs: f64,
    tx: mpsc::SyncSender<SeekOutcome>,
}

impl SeekSignal {
    pub(crate) fn channel(target_secs: f64) -> (Self, mpsc::Receiver<SeekOutcome>) {
        let (tx, rx) = mpsc::sync_channel(1);
        (Self { target_secs, tx }, rx)
    }

    /// Seek target in seconds, already clamped into `[0, duration]`.
    pub fn target_secs(&self) -> f64 {
        self.target_secs
    }

    /// Report that the seek landed; `raster` is the decoded frame at native resolution.
    pub fn complete(self, raster: FrameRGBA) {
        // The waiter may have timed out already.
        let _ = self.tx.send(Ok(raster));
    }

    /// Report that the seek failed.
    pub fn fail(self, msg: impl Into<String>) {
        let _ = self.tx.send(Err(msg.into()));
    }
}

/// One opened source, able to seek and decode.
///
/// Seeks are asynchronous: `request_seek` may return before the frame is decoded and report
/// through the signal from another thread.
pub trait Decoder: Send {
    /// Metadata resolved when the source was opened.
    fn info(&self) -> MediaInfo;

    /// Start a seek to `signal.target_secs()`.
    fn request_seek(&mut self, signal: SeekSignal);

    /// Give up on the in-flight seek, if any. Called after a seek timeout.
    fn abandon_seek(&mut self) {}
}

/// Factory that opens encoded bytes into a [`Decoder`].
pub trait DecodeService {
    /// Open `input`. Fails with [`FramecapError::UnsupportedFormat`] when the bytes cannot be
    /// decoded.
    fn open(&self, input: &SourceInput) -> FramecapResult<Box<dyn Decoder>>;
}

pub(crate) fn validate_info(info: &MediaInfo, name: &str) -> FramecapResult<()> {
    if info.width == 0 || info.height == 0 {
        return Err(FramecapError::unsupported(format!(
            "'{name}' reports zero dimensions ({}x{})",
            info.width, info.height
        )));
    }
    if !info.duration_secs.is_finite() || info.duration_secs < 0.0 {
        return Err(FramecapError::unsupported(format!(
            "'{name}' reports invalid duration {}",
            info.duration_secs
        )));
    }
    Ok(())
}
