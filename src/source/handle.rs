use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use crate::foundation::core::Dimensions;
use crate::foundation::error::{FramecapError, FramecapResult};
use crate::raster::frame::FrameRGBA;
use crate::source::decoder::{DecodeService, Decoder, SeekSignal, SourceInput, validate_info};

/// Default bound on a single seek.
pub const DEFAULT_SEEK_TIMEOUT: Duration = Duration::from_secs(15);

/// Opaque label of the bytes a source was opened from.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SourceOrigin {
    /// Caller-supplied name.
    pub name: String,
    /// Length of the encoded input.
    pub byte_len: usize,
}

/// Resolved, immutable metadata of one source.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SourceDescriptor {
    /// Where the bytes came from.
    pub origin: SourceOrigin,
    /// Native frame size.
    pub native: Dimensions,
    /// Duration in seconds.
    pub duration_secs: f64,
}

impl SourceDescriptor {
    /// Native width in pixels.
    pub fn native_width(&self) -> u32 {
        self.native.width
    }

    /// Native height in pixels.
    pub fn native_height(&self) -> u32 {
        self.native.height
    }
}

/// Wraps one opened source: metadata, seeking with a timeout, and the current raster.
pub struct SourceHandle {
    descriptor: SourceDescriptor,
    decoder: Box<dyn Decoder>,
    current: Option<FrameRGBA>,
    seek_timeout: Duration,
}

impl std::fmt::Debug for SourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceHandle")
            .field("descriptor", &self.descriptor)
            .field("has_raster", &self.current.is_some())
            .field("seek_timeout", &self.seek_timeout)
            .finish()
    }
}

impl SourceHandle {
    /// Open `input` through `service` and resolve its metadata.
    pub fn open(
        service: &dyn DecodeService,
        input: &SourceInput,
        seek_timeout: Duration,
    ) -> FramecapResult<Self> {
        if input.bytes.is_empty() {
            return Err(FramecapError::unsupported(format!(
                "'{}' is empty",
                input.name
            )));
        }
        if seek_timeout.is_zero() {
            return Err(FramecapError::validation("seek timeout must be non-zero"));
        }

        let decoder = service.open(input)?;
        let info = decoder.info();
        validate_info(&info, &input.name)?;

        let descriptor = SourceDescriptor {
            origin: SourceOrigin {
                name: input.name.clone(),
                byte_len: input.bytes.len(),
            },
            native: Dimensions::new(info.width, info.height)?,
            duration_secs: info.duration_secs,
        };
        tracing::debug!(
            source = %descriptor.origin.name,
            native = %descriptor.native,
            duration_secs = descriptor.duration_secs,
            "source metadata resolved"
        );

        Ok(Self {
            descriptor,
            decoder,
            current: None,
            seek_timeout,
        })
    }

    /// Resolved metadata.
    pub fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    /// Seek to `t` seconds and wait for the decoder to report the frame.
    ///
    /// `t` is clamped into `[0, duration]`.
    pub fn seek_to(&mut self, t: f64) -> FramecapResult<()> {
        if !t.is_finite() {
            return Err(FramecapError::validation(format!(
                "seek target must be finite, got {t}"
            )));
        }
        let target = t.clamp(0.0, self.descriptor.duration_secs);

        let (signal, rx) = SeekSignal::channel(target);
        self.decoder.request_seek(signal);

        match rx.recv_timeout(self.seek_timeout) {
            Ok(Ok(raster)) => {
                if raster.data.len() != raster.dimensions().rgba_len() {
                    return Err(FramecapError::decode(format!(
                        "decoder returned a malformed raster at {target:.3}s"
                    )));
                }
                tracing::trace!(at_secs = target, "seek complete");
                self.current = Some(raster);
                Ok(())
            }
            Ok(Err(msg)) => Err(FramecapError::decode(format!(
                "seek to {target:.3}s failed: {msg}"
            ))),
            Err(RecvTimeoutError::Timeout) => {
                self.decoder.abandon_seek();
                Err(FramecapError::SeekTimeout {
                    at_secs: target,
                    timeout: self.seek_timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(FramecapError::decode(format!(
                "decoder dropped the seek to {target:.3}s without reporting"
            ))),
        }
    }

    /// Frame decoded by the last successful seek, at native resolution.
    pub fn current_raster(&self) -> FramecapResult<&FrameRGBA> {
        self.current
            .as_ref()
            .ok_or_else(|| FramecapError::decode("no frame decoded yet (seek first)"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/handle.rs"]
mod tests;
