use crate::foundation::error::FramecapResult;
use crate::raster::surface::RasterSurface;

/// Still image taken from the surface at one timestamp.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSample {
    /// Timestamp in seconds.
    pub timestamp_secs: f64,
    /// PNG bytes.
    pub image_bytes: Vec<u8>,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl FrameSample {
    /// Timestamp rounded to whole milliseconds.
    pub fn timestamp_ms(&self) -> u64 {
        (self.timestamp_secs.max(0.0) * 1000.0).round() as u64
    }

    /// Download name for the `index`-th sample of `stem`, e.g. `clip-frame-0003-3000ms.png`.
    pub fn file_name(&self, stem: &str, index: usize) -> String {
        format!("{stem}-frame-{index:04}-{}ms.png", self.timestamp_ms())
    }
}

/// Copies the surface out as a PNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameSampler;

impl FrameSampler {
    /// Snapshot `surface` as the sample for `timestamp_secs`.
    pub fn sample(&self, surface: &RasterSurface, timestamp_secs: f64) -> FramecapResult<FrameSample> {
        let dims = surface.dimensions();
        let image_bytes = surface.snapshot_png()?;
        Ok(FrameSample {
            timestamp_secs,
            image_bytes,
            width: dims.width,
            height: dims.height,
        })
    }
}
