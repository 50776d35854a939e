use crate::foundation::error::{FramecapError, FramecapResult};

const EPSILON: f64 = 1e-9;

/// Upper bound on timestamps generated for one source.
pub const MAX_STEPS: usize = 10_000_000;

/// Timestamps visited for a source of `duration_secs` at `interval_secs`.
///
/// `t_i = i * interval` for every `t_i < duration`, then `duration` itself. The sequence always
/// starts at `0`, ends at `duration` and is non-decreasing; a zero-length source yields `[0]`.
pub fn sample_times(duration_secs: f64, interval_secs: f64) -> FramecapResult<Vec<f64>> {
    if !duration_secs.is_finite() || duration_secs < 0.0 {
        return Err(FramecapError::validation(format!(
            "duration must be finite and >= 0, got {duration_secs}"
        )));
    }
    if !interval_secs.is_finite() || interval_secs <= 0.0 {
        return Err(FramecapError::validation(format!(
            "sampling interval must be finite and > 0, got {interval_secs}"
        )));
    }
    if duration_secs == 0.0 {
        return Ok(vec![0.0]);
    }

    let expected = (duration_secs / interval_secs).ceil() + 1.0;
    if expected > MAX_STEPS as f64 {
        return Err(FramecapError::validation(format!(
            "{duration_secs}s at {interval_secs}s steps exceeds {MAX_STEPS} frames"
        )));
    }

    let mut times = Vec::with_capacity(expected as usize);
    let mut i = 0u64;
    loop {
        // Multiply instead of accumulating so error does not drift.
        let t = i as f64 * interval_secs;
        if t >= duration_secs - EPSILON {
            break;
        }
        times.push(t);
        i += 1;
    }
    times.push(duration_secs);
    Ok(times)
}

#[cfg(test)]
#[path = "../../tests/unit/capture/timeline.rs"]
mod tests;
