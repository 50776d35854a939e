use std::str::FromStr;

use crate::foundation::error::{FramecapError, FramecapResult};

/// Output container of an encoded stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// Matroska/WebM, streamable.
    Webm,
    /// Fragmented MP4.
    Mp4,
    /// Uncompressed YUV4MPEG2.
    Y4m,
}

impl Container {
    /// Declared MIME type of artifacts in this container.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Webm => "video/webm",
            Self::Mp4 => "video/mp4",
            Self::Y4m => "video/x-yuv4mpeg",
        }
    }

    /// File extension (without the dot).
    pub fn extension(self) -> &'static str {
        match self {
            Self::Webm => "webm",
            Self::Mp4 => "mp4",
            Self::Y4m => "y4m",
        }
    }
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Container {
    type Err = FramecapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webm" => Ok(Self::Webm),
            "mp4" => Ok(Self::Mp4),
            "y4m" => Ok(Self::Y4m),
            other => Err(FramecapError::validation(format!(
                "unknown container '{other}' (expected webm, mp4 or y4m)"
            ))),
        }
    }
}

/// One codec choice: codec name plus the container it is written into.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CodecDescriptor {
    /// Codec name (`vp9`, `vp8`, `h264`, `av1`, `y4m`) or a raw `ffmpeg` encoder name.
    pub name: String,
    /// Output container.
    pub container: Container,
}

impl CodecDescriptor {
    /// Build a descriptor.
    pub fn new(name: impl Into<String>, container: Container) -> Self {
        Self {
            name: name.into(),
            container,
        }
    }

    /// VP9 in WebM.
    pub fn vp9() -> Self {
        Self::new("vp9", Container::Webm)
    }

    /// VP8 in WebM.
    pub fn vp8() -> Self {
        Self::new("vp8", Container::Webm)
    }

    /// H.264 in fragmented MP4.
    pub fn h264() -> Self {
        Self::new("h264", Container::Mp4)
    }

    /// Uncompressed YUV4MPEG2, always constructible.
    pub fn y4m() -> Self {
        Self::new("y4m", Container::Y4m)
    }

    /// `ffmpeg` encoder implementing this codec.
    pub fn ffmpeg_encoder(&self) -> &str {
        match self.name.as_str() {
            "vp9" => "libvpx-vp9",
            "vp8" => "libvpx",
            "h264" => "libx264",
            "av1" => "libaom-av1",
            other => other,
        }
    }

    /// Declared MIME type of the output.
    pub fn mime_type(&self) -> &'static str {
        self.container.mime_type()
    }
}

impl std::fmt::Display for CodecDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.name, self.container)
    }
}

impl FromStr for CodecDescriptor {
    type Err = FramecapError;

    /// Parse `name` or `name/container`. Well-known names pick their usual container.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((name, container)) = s.split_once('/') {
            if name.is_empty() {
                return Err(FramecapError::validation("codec name must not be empty"));
            }
            return Ok(Self::new(name, container.parse()?));
        }
        match s {
            "" => Err(FramecapError::validation("codec name must not be empty")),
            "vp9" => Ok(Self::vp9()),
            "vp8" => Ok(Self::vp8()),
            "h264" => Ok(Self::h264()),
            "av1" => Ok(Self::new("av1", Container::Mp4)),
            "y4m" => Ok(Self::y4m()),
            other => Err(FramecapError::validation(format!(
                "codec '{other}' needs an explicit container, e.g. '{other}/mp4'"
            ))),
        }
    }
}

/// Ordered codec preference list. Codecs are tried front to back.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CodecList(Vec<CodecDescriptor>);

impl CodecList {
    /// Build a list, rejecting an empty one.
    pub fn new(codecs: Vec<CodecDescriptor>) -> FramecapResult<Self> {
        if codecs.is_empty() {
            return Err(FramecapError::validation("codec list must not be empty"));
        }
        Ok(Self(codecs))
    }

    /// Two-tier list: `preferred`, then `fallback`.
    pub fn preferred_then(preferred: CodecDescriptor, fallback: CodecDescriptor) -> Self {
        Self(vec![preferred, fallback])
    }

    /// Codecs in preference order.
    pub fn iter(&self) -> std::slice::Iter<'_, CodecDescriptor> {
        self.0.iter()
    }

    /// Number of codecs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return `true` when the list has no codecs.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for CodecList {
    fn default() -> Self {
        Self(vec![
            CodecDescriptor::vp9(),
            CodecDescriptor::vp8(),
            CodecDescriptor::y4m(),
        ])
    }
}

impl<'a> IntoIterator for &'a CodecList {
    type Item = &'a CodecDescriptor;
    type IntoIter = std::slice::Iter<'a, CodecDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
