use image::ImageEncoder as _;
use image::imageops::FilterType;

use crate::foundation::core::Dimensions;
use crate::foundation::error::{FramecapError, FramecapResult};
use crate::raster::frame::FrameRGBA;

/// How a source raster of another size is placed on a [`RasterSurface`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrawMode {
    /// Scale to exactly the surface size.
    #[default]
    Fill,
    /// Keep the source aspect ratio without upscaling, centered on opaque black.
    Fit,
}

/// Fixed-size off-screen draw target.
///
/// Every [`RasterSurface::draw`] overwrites the previous contents in place. Consumers that need
/// a frame beyond the next draw must take a copy ([`RasterSurface::copy_frame`]) or a snapshot.
#[derive(Debug)]
pub struct RasterSurface {
    frame: FrameRGBA,
    mode: DrawMode,
    draws: u64,
}

impl RasterSurface {
    /// Allocate a surface of `dims`, cleared to opaque black.
    pub fn new(dims: Dimensions) -> Self {
        Self {
            frame: FrameRGBA::blank(dims),
            mode: DrawMode::default(),
            draws: 0,
        }
    }

    /// Use `mode` for sources whose size differs from the surface.
    pub fn with_mode(mut self, mode: DrawMode) -> Self {
        self.mode = mode;
        self
    }

    /// Placement used for differently sized sources.
    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    /// Current surface size.
    pub fn dimensions(&self) -> Dimensions {
        self.frame.dimensions()
    }

    /// Number of draws since the surface was created or last resized.
    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    /// Reallocate to `dims`. Contents are cleared.
    pub fn resize(&mut self, dims: Dimensions) {
        if dims == self.dimensions() {
            return;
        }
        tracing::debug!(from = %self.dimensions(), to = %dims, "resizing raster surface");
        self.frame = FrameRGBA::blank(dims);
        self.draws = 0;
    }

    /// Draw `src` scaled to the surface size, overwriting the current contents.
    pub fn draw(&mut self, src: &FrameRGBA) -> FramecapResult<()> {
        if src.data.len() != src.dimensions().rgba_len() {
            return Err(FramecapError::validation(format!(
                "source raster size mismatch: got {} bytes for {}",
                src.data.len(),
                src.dimensions()
            )));
        }

        let dims = self.dimensions();
        if src.dimensions() == dims {
            self.frame.data.copy_from_slice(&src.data);
        } else {
            match self.mode {
                DrawMode::Fill => {
                    let view = src.as_image_view()?;
                    let scaled =
                        image::imageops::resize(&view, dims.width, dims.height, FilterType::Triangle);
                    self.frame.data.copy_from_slice(scaled.as_raw());
                }
                DrawMode::Fit => self.draw_fitted(src)?,
            }
        }
        self.draws += 1;
        Ok(())
    }

    fn draw_fitted(&mut self, src: &FrameRGBA) -> FramecapResult<()> {
        let dims = self.dimensions();
        let placed = src.dimensions().fit_within(dims);
        let scaled;
        let pixels: &[u8] = if placed == src.dimensions() {
            &src.data
        } else {
            let view = src.as_image_view()?;
            scaled = image::imageops::resize(&view, placed.width, placed.height, FilterType::Triangle);
            scaled.as_raw()
        };

        for px in self.frame.data.chunks_exact_mut(4) {
            px.copy_from_slice(&[0, 0, 0, 255]);
        }
        let x0 = ((dims.width - placed.width) / 2) as usize;
        let y0 = ((dims.height - placed.height) / 2) as usize;
        let row = placed.width as usize * 4;
        let stride = dims.width as usize * 4;
        for (y, line) in pixels.chunks_exact(row).enumerate() {
            let off = (y0 + y) * stride + x0 * 4;
            self.frame.data[off..off + row].copy_from_slice(line);
        }
        Ok(())
    }

    /// Borrow the current contents.
    pub fn frame(&self) -> &FrameRGBA {
        &self.frame
    }

    /// Owned copy of the current contents, safe to hand to another thread.
    pub fn copy_frame(&self) -> FrameRGBA {
        self.frame.clone()
    }

    /// Encode the current contents as a PNG.
    pub fn snapshot_png(&self) -> FramecapResult<Vec<u8>> {
        let mut out = Vec::new();
        image::codecs::png::PngEncoder::new(&mut out)
            .write_image(
                &self.frame.data,
                self.frame.width,
                self.frame.height,
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| anyhow::anyhow!("png encode failed: {e}"))?;
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/surface.rs"]
mod tests;
