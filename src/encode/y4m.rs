use crate::encode::sink::{ChunkEncoder, EncoderConfig};
use crate::foundation::core::{Dimensions, Fps};
use crate::foundation::error::{FramecapError, FramecapResult};
use crate::foundation::math::{mul_div255_u16, rgb_to_ycbcr};
use crate::raster::frame::FrameRGBA;

const MAGIC: &[u8] = b"YUV4MPEG2";
const FRAME_TAG: &[u8] = b"FRAME";

/// Pure-Rust YUV4MPEG2 writer (4:4:4, full-range BT.601).
///
/// Always constructible, so it is the usual last entry of a codec list. The stream header is
/// emitted with the first frame (or on finish for an empty stream); each frame is one chunk.
#[derive(Debug)]
pub struct Y4mEncoder {
    cfg: EncoderConfig,
    header_written: bool,
}

impl Y4mEncoder {
    /// Create an encoder for `cfg`.
    pub fn new(cfg: EncoderConfig) -> FramecapResult<Self> {
        Dimensions::new(cfg.dims.width, cfg.dims.height)?;
        Fps::new(cfg.fps.num, cfg.fps.den)?;
        Ok(Self {
            cfg,
            header_written: false,
        })
    }

    fn header(&self) -> Vec<u8> {
        format!(
            "YUV4MPEG2 W{} H{} F{}:{} Ip A1:1 C444 XCOLORRANGE=FULL\n",
            self.cfg.dims.width, self.cfg.dims.height, self.cfg.fps.num, self.cfg.fps.den
        )
        .into_bytes()
    }
}

impl ChunkEncoder for Y4mEncoder {
    fn encode_frame(
        &mut self,
        _timestamp_secs: f64,
        frame: &FrameRGBA,
    ) -> FramecapResult<Vec<Vec<u8>>> {
        if frame.dimensions() != self.cfg.dims {
            return Err(FramecapError::validation(format!(
                "frame size mismatch: got {}, expected {}",
                frame.dimensions(),
                self.cfg.dims
            )));
        }

        let px = self.cfg.dims.width as usize * self.cfg.dims.height as usize;
        let mut out = Vec::with_capacity(FRAME_TAG.len() + 1 + px * 3);
        out.extend_from_slice(FRAME_TAG);
        out.push(b'\n');
        let plane_start = out.len();
        out.resize(plane_start + px * 3, 0);
        let (y_plane, rest) = out[plane_start..].split_at_mut(px);
        let (cb_plane, cr_plane) = rest.split_at_mut(px);

        // Flatten straight alpha over black.
        for (i, s) in frame.data.chunks_exact(4).enumerate() {
            let a = u16::from(s[3]);
            let r = mul_div255_u16(u16::from(s[0]), a) as u8;
            let g = mul_div255_u16(u16::from(s[1]), a) as u8;
            let b = mul_div255_u16(u16::from(s[2]), a) as u8;
            let [y, cb, cr] = rgb_to_ycbcr(r, g, b);
            y_plane[i] = y;
            cb_plane[i] = cb;
            cr_plane[i] = cr;
        }

        let mut chunks = Vec::with_capacity(2);
        if !self.header_written {
            chunks.push(self.header());
            self.header_written = true;
        }
        chunks.push(out);
        Ok(chunks)
    }

    fn finish(&mut self) -> FramecapResult<Vec<Vec<u8>>> {
        if self.header_written {
            return Ok(Vec::new());
        }
        self.header_written = true;
        Ok(vec![self.header()])
    }
}

/// Structural summary of a YUV4MPEG2 stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Y4mStreamInfo {
    /// Frame size.
    pub dims: Dimensions,
    /// Declared frame rate.
    pub fps: Fps,
    /// Number of complete frames.
    pub frames: u64,
}

impl Y4mStreamInfo {
    /// Nominal playback duration (`frames / fps`).
    pub fn duration_secs(&self) -> f64 {
        self.fps.frames_to_secs(self.frames)
    }
}

/// Parse the header and count frames of a 4:4:4 YUV4MPEG2 stream.
pub fn inspect(bytes: &[u8]) -> FramecapResult<Y4mStreamInfo> {
    let bad = |msg: &str| FramecapError::unsupported(format!("y4m: {msg}"));

    let header_end = bytes
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| bad("missing header line"))?;
    let header = std::str::from_utf8(&bytes[..header_end]).map_err(|_| bad("header is not ascii"))?;
    let mut params = header.split(' ');
    if params.next().map(str::as_bytes) != Some(MAGIC) {
        return Err(bad("bad magic"));
    }

    let (mut width, mut height, mut fps) = (None, None, None);
    for p in params {
        let mut chars = p.chars();
        let Some(tag) = chars.next() else {
            continue;
        };
        if !tag.is_ascii_uppercase() {
            return Err(bad("malformed header parameter"));
        }
        let value = chars.as_str();
        match tag {
            'W' => width = value.parse::<u32>().ok(),
            'H' => height = value.parse::<u32>().ok(),
            'F' => {
                fps = value
                    .split_once(':')
                    .and_then(|(n, d)| Some((n.parse::<u32>().ok()?, d.parse::<u32>().ok()?)))
            }
            'C' if value != "444" => return Err(bad("only C444 streams are supported")),
            _ => {}
        }
    }
    let dims = Dimensions::new(
        width.ok_or_else(|| bad("missing W"))?,
        height.ok_or_else(|| bad("missing H"))?,
    )?;
    let (num, den) = fps.ok_or_else(|| bad("missing F"))?;
    let fps = Fps::new(num, den)?;

    let plane_bytes = dims.width as usize * dims.height as usize * 3;
    let mut pos = header_end + 1;
    let mut frames = 0u64;
    while pos < bytes.len() {
        let rest = &bytes[pos..];
        if !rest.starts_with(FRAME_TAG) {
            return Err(bad("expected FRAME marker"));
        }
        let line_end = rest
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| bad("unterminated FRAME line"))?;
        let data_start = pos + line_end + 1;
        if bytes.len() < data_start + plane_bytes {
            return Err(bad("truncated frame"));
        }
        pos = data_start + plane_bytes;
        frames += 1;
    }

    Ok(Y4mStreamInfo { dims, fps, frames })
}

#[cfg(test)]
#[path = "../../tests/unit/encode/y4m.rs"]
mod tests;
