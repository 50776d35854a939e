use std::time::Duration;

use crate::capture::cancel::CancelToken;
use crate::foundation::error::{FramecapError, FramecapResult};
use crate::raster::surface::RasterSurface;
use crate::source::handle::SourceHandle;

/// One drawn step handed to the consumer.
#[derive(Debug)]
pub struct StepFrame<'a> {
    /// Position in the timestamp list.
    pub index: usize,
    /// Timestamp the source was seeked to.
    pub timestamp_secs: f64,
    /// Surface holding the drawn frame. Valid until the next step.
    pub surface: &'a RasterSurface,
}

/// Summary of one stepper run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepStats {
    /// Frames drawn and handed off.
    pub frames: u64,
    /// First timestamp visited.
    pub first_ts: Option<f64>,
    /// Last timestamp visited.
    pub last_ts: Option<f64>,
}

/// Drives a source through a timestamp list: seek, draw into the surface, hand off.
///
/// Every seek is awaited (bounded by the source's seek timeout) before the frame is drawn, and
/// the hand-off returns before the next seek starts, so each step sees exactly one frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct SeekStepper {
    pacing: Option<Duration>,
}

impl SeekStepper {
    /// Stepper without pacing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep `fraction * interval_secs` after each draw. A fraction of `0` disables pacing.
    pub fn with_pacing(fraction: f64, interval_secs: f64) -> FramecapResult<Self> {
        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            return Err(FramecapError::validation(format!(
                "pacing fraction must be within [0, 1], got {fraction}"
            )));
        }
        if !interval_secs.is_finite() || interval_secs <= 0.0 {
            return Err(FramecapError::validation(format!(
                "pacing interval must be finite and > 0, got {interval_secs}"
            )));
        }
        let pacing = (fraction > 0.0).then(|| Duration::from_secs_f64(fraction * interval_secs));
        Ok(Self { pacing })
    }

    /// Configured pacing delay, if any.
    pub fn pacing(&self) -> Option<Duration> {
        self.pacing
    }

    /// Visit every timestamp of `times` in order.
    ///
    /// Cancellation is checked before each seek. The first failing seek, draw or hand-off aborts
    /// the run.
    pub fn run<F>(
        &self,
        source: &mut SourceHandle,
        surface: &mut RasterSurface,
        times: &[f64],
        cancel: &CancelToken,
        mut on_frame: F,
    ) -> FramecapResult<StepStats>
    where
        F: FnMut(StepFrame<'_>) -> FramecapResult<()>,
    {
        let mut stats = StepStats::default();
        for (index, &t) in times.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::debug!(index, at_secs = t, "stepper cancelled");
                return Err(FramecapError::Cancelled);
            }
            if let Some(prev) = stats.last_ts
                && t < prev
            {
                return Err(FramecapError::validation(format!(
                    "timestamps must be non-decreasing: {t} after {prev}"
                )));
            }

            source.seek_to(t)?;
            surface.draw(source.current_raster()?)?;
            tracing::trace!(index, at_secs = t, "frame drawn");

            if let Some(delay) = self.pacing {
                std::thread::sleep(delay);
            }

            on_frame(StepFrame {
                index,
                timestamp_secs: t,
                surface,
            })?;

            stats.frames += 1;
            stats.first_ts = stats.first_ts.or(Some(t));
            stats.last_ts = Some(t);
        }

        tracing::debug!(
            source = %source.descriptor().origin.name,
            frames = stats.frames,
            "stepper finished"
        );
        Ok(stats)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/stepper.rs"]
mod tests;
