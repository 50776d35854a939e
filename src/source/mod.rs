//! Source decoding: the decode-service collaborator and the handle that drives it.

/// Decoder and decode-service collaborator traits.
pub mod decoder;
/// `ffprobe`/`ffmpeg` backed decode service (feature `media-ffmpeg`).
pub mod ffmpeg;
/// Metadata resolution and seeking with a timeout.
pub mod handle;
/// Generated test-pattern sources.
pub mod synthetic;
