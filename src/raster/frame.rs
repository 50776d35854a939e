use crate::foundation::core::Dimensions;
use crate::foundation::error::{FramecapError, FramecapResult};

/// A raster frame as straight-alpha RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Allocate an opaque black frame.
    pub fn blank(dims: Dimensions) -> Self {
        let mut data = vec![0u8; dims.rgba_len()];
        for px in data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self {
            width: dims.width,
            height: dims.height,
            data,
        }
    }

    /// Wrap raw RGBA8 bytes, checking that the length matches `width * height * 4`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> FramecapResult<Self> {
        let dims = Dimensions::new(width, height)?;
        if data.len() != dims.rgba_len() {
            return Err(FramecapError::validation(format!(
                "frame data size mismatch: got {} bytes, expected {} for {dims}",
                data.len(),
                dims.rgba_len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Frame size.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// RGBA value of pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let off = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(off..off + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub(crate) fn as_image_view(
        &self,
    ) -> FramecapResult<image::ImageBuffer<image::Rgba<u8>, &[u8]>> {
        image::ImageBuffer::from_raw(self.width, self.height, self.data.as_slice()).ok_or_else(
            || FramecapError::validation("frame data is smaller than width*height*4"),
        )
    }
}
