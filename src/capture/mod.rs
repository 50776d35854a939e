//! Stepping a source through a timestamp list and taking frames off the surface.

/// Cooperative cancellation.
pub mod cancel;
/// PNG snapshots of the surface.
pub mod sampler;
/// Seek, draw and hand-off loop.
pub mod stepper;
/// Timestamp generation.
pub mod timeline;
