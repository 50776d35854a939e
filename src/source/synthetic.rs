use crate::foundation::core::Dimensions;
use crate::foundation::error::{FramecapError, FramecapResult};
use crate::raster::frame::FrameRGBA;
use crate::source::decoder::{DecodeService, Decoder, MediaInfo, SeekSignal, SourceInput};

/// Description of a generated test-pattern source, serialized as the source bytes.
///
/// Every decoded frame is a solid color `[tag, ms >> 8, ms & 0xff, 255]` where `ms` is the seek
/// target in milliseconds, so the timestamp of any drawn frame can be read back from its pixels
/// (exact up to ~65.5 s).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SyntheticSource {
    /// Native width in pixels.
    pub width: u32,
    /// Native height in pixels.
    pub height: u32,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Red channel of every frame, used to tell sources apart.
    #[serde(default)]
    pub tag: u8,
}

impl SyntheticSource {
    /// Serialize into a [`SourceInput`] that [`SyntheticDecodeService`] can open.
    pub fn to_input(&self, name: impl Into<String>) -> FramecapResult<SourceInput> {
        let bytes = serde_json::to_vec(self)
            .map_err(|e| FramecapError::validation(format!("synthetic source encode: {e}")))?;
        Ok(SourceInput::new(name, bytes))
    }

    /// Render the frame for `t` seconds.
    pub fn render(&self, t: f64) -> FramecapResult<FrameRGBA> {
        let ms = (t * 1000.0).round().clamp(0.0, f64::from(u16::MAX)) as u16;
        let [hi, lo] = ms.to_be_bytes();
        let dims = Dimensions::new(self.width, self.height)?;
        FrameRGBA::from_raw(
            dims.width,
            dims.height,
            [self.tag, hi, lo, 255].repeat(dims.width as usize * dims.height as usize),
        )
    }

    /// Read back `(tag, timestamp_secs)` from a frame rendered by [`SyntheticSource::render`].
    pub fn decode_pixel(px: [u8; 4]) -> (u8, f64) {
        let ms = u16::from_be_bytes([px[1], px[2]]);
        (px[0], f64::from(ms) / 1000.0)
    }
}

/// Decode service for [`SyntheticSource`] inputs. Seeks complete immediately.
#[derive(Clone, Copy, Debug, Default)]
pub struct SyntheticDecodeService;

impl DecodeService for SyntheticDecodeService {
    fn open(&self, input: &SourceInput) -> FramecapResult<Box<dyn Decoder>> {
        let source: SyntheticSource = serde_json::from_slice(&input.bytes).map_err(|e| {
            FramecapError::unsupported(format!(
                "'{}' is not a synthetic source description: {e}",
                input.name
            ))
        })?;
        Ok(Box::new(SyntheticDecoder { source }))
    }
}

struct SyntheticDecoder {
    source: SyntheticSource,
}

impl Decoder for SyntheticDecoder {
    fn info(&self) -> MediaInfo {
        MediaInfo {
            width: self.source.width,
            height: self.source.height,
            duration_secs: self.source.duration_secs,
        }
    }

    fn request_seek(&mut self, signal: SeekSignal) {
        match self.source.render(signal.target_secs()) {
            Ok(frame) => signal.complete(frame),
            Err(e) => signal.fail(e.to_string()),
        }
    }
}
