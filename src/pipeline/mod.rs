//! Run lifecycle and the three capture operations.

/// Final encoded output.
pub mod artifact;
/// Capture and runtime configuration.
pub mod config;
/// `compress`, `extract_frames` and `merge`.
pub mod orchestrator;
/// Run state machine.
pub mod state;
