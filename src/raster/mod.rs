//! Off-screen raster buffers.

/// Owned RGBA8 frames.
pub mod frame;
/// Fixed-size draw target with scale-on-draw and PNG snapshots.
pub mod surface;
