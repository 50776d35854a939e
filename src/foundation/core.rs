use crate::foundation::error::{FramecapError, FramecapResult};
use crate::foundation::math::gcd_u32;

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32, // must be > 0
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> FramecapResult<Self> {
        if den == 0 {
            return Err(FramecapError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(FramecapError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert a floating-point rate (e.g. `29.97`) into a reduced rational with millis precision.
    pub fn from_f64(fps: f64) -> FramecapResult<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(FramecapError::validation(format!(
                "frame rate must be finite and > 0, got {fps}"
            )));
        }
        let scaled = (fps * 1000.0).round();
        if scaled < 1.0 || scaled > f64::from(u32::MAX) {
            return Err(FramecapError::validation(format!(
                "frame rate {fps} is out of range"
            )));
        }
        let num = scaled as u32;
        let g = gcd_u32(num, 1000);
        Self::new(num / g, 1000 / g)
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }
}

impl std::fmt::Display for Fps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Raster dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create validated non-zero dimensions.
    pub fn new(width: u32, height: u32) -> FramecapResult<Self> {
        if width == 0 || height == 0 {
            return Err(FramecapError::validation(format!(
                "dimensions must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Output size for `target_width` against a native size.
    ///
    /// The width is clamped to the native width (never upscale) and the height keeps the native
    /// aspect ratio: `round(width * native_height / native_width)`, at least 1.
    pub fn derive(native: Dimensions, target_width: u32) -> FramecapResult<Self> {
        if native.width == 0 || native.height == 0 {
            return Err(FramecapError::validation(
                "native dimensions must be non-zero",
            ));
        }
        if target_width == 0 {
            return Err(FramecapError::validation("target width must be > 0"));
        }
        let width = target_width.min(native.width);
        let height = (f64::from(width) * f64::from(native.height) / f64::from(native.width))
            .round()
            .max(1.0) as u32;
        Ok(Self { width, height })
    }

    /// Largest size with this aspect ratio that fits inside `bounds`, never larger than `self`.
    pub fn fit_within(self, bounds: Dimensions) -> Self {
        let scale = (f64::from(bounds.width) / f64::from(self.width))
            .min(f64::from(bounds.height) / f64::from(self.height))
            .min(1.0);
        let side = |v: u32, max: u32| ((f64::from(v) * scale).round() as u32).clamp(1, max.max(1));
        Self {
            width: side(self.width, bounds.width),
            height: side(self.height, bounds.height),
        }
    }

    /// Byte length of a tightly packed RGBA8 buffer of this size.
    pub fn rgba_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
