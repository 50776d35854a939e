use crate::encode::codec::CodecDescriptor;
use crate::encode::session::EncodedStream;

/// Final encoded output of `compress` or `merge`. Immutable once returned.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputArtifact {
    /// Encoded container bytes.
    pub bytes: Vec<u8>,
    /// `video/<container>` type matching the codec that produced the bytes.
    pub mime_type: String,
    /// Download name.
    pub suggested_name: String,
    /// Frames encoded.
    pub frame_count: u64,
    /// Nominal duration: the summed duration of the captured sources. The stream also carries
    /// the frame sampled at the end, so `frame_count / fps` can exceed it by about one frame.
    pub duration_secs: f64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Codec that produced the bytes.
    pub codec: CodecDescriptor,
}

impl OutputArtifact {
    pub(crate) fn assemble(stream: EncodedStream, stem: &str, duration_secs: f64) -> Self {
        let codec = stream.codec.clone();
        let dims = stream.config.dims;
        let frame_count = stream.frames;
        Self {
            mime_type: codec.mime_type().to_string(),
            suggested_name: format!("{stem}.{}", codec.container.extension()),
            frame_count,
            duration_secs,
            width: dims.width,
            height: dims.height,
            codec,
            bytes: stream.into_bytes(),
        }
    }

    /// Size of the encoded bytes.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}
