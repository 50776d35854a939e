//! Encoder sessions and the encoders behind them.
//!
//! A session picks the first constructible codec from an ordered [`codec::CodecList`] and feeds
//! it owned frame copies over a bounded channel.

/// Codec and container descriptors.
pub mod codec;
/// System `ffmpeg` encoder.
pub mod ffmpeg;
/// Encoder session: codec fallback, encoder thread, ordered chunks.
pub mod session;
/// Encoder collaborator traits and the default factory.
pub mod sink;
/// Pure-Rust YUV4MPEG2 encoder.
pub mod y4m;
