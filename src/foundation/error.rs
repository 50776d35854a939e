use std::time::Duration;

/// Convenience result type used across framecap.
pub type FramecapResult<T> = Result<T, FramecapError>;

/// Top-level error taxonomy used by capture APIs.
///
/// None of these are retried automatically: a failed seek or encoder step aborts the whole run.
#[derive(thiserror::Error, Debug)]
pub enum FramecapError {
    /// Invalid caller-provided configuration or input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The source could not be opened or its metadata is unusable.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A seek did not report completion within the per-seek timeout.
    #[error("seek to {at_secs:.3}s timed out after {timeout:?}")]
    SeekTimeout {
        /// Requested seek target in seconds.
        at_secs: f64,
        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// The decoder reported an error for a seek instead of completing it.
    #[error("decode interrupted: {0}")]
    DecodeInterrupted(String),

    /// No codec in the configured list could be constructed.
    #[error("codec unavailable: {0}")]
    CodecUnavailable(String),

    /// Encoding or the final flush did not complete.
    #[error("encoder flush failed: {0}")]
    EncodeFlushFailed(String),

    /// The run was cancelled through its cancel token.
    #[error("capture cancelled")]
    Cancelled,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FramecapError {
    /// Build a [`FramecapError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FramecapError::UnsupportedFormat`] value.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Build a [`FramecapError::DecodeInterrupted`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeInterrupted(msg.into())
    }

    /// Build a [`FramecapError::CodecUnavailable`] value.
    pub fn codec_unavailable(msg: impl Into<String>) -> Self {
        Self::CodecUnavailable(msg.into())
    }

    /// Build a [`FramecapError::EncodeFlushFailed`] value.
    pub fn flush(msg: impl Into<String>) -> Self {
        Self::EncodeFlushFailed(msg.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::Validation,
            Self::UnsupportedFormat(_) => FailureKind::UnsupportedFormat,
            Self::SeekTimeout { .. } => FailureKind::SeekTimeout,
            Self::DecodeInterrupted(_) => FailureKind::DecodeInterrupted,
            Self::CodecUnavailable(_) => FailureKind::CodecUnavailable,
            Self::EncodeFlushFailed(_) => FailureKind::EncodeFlushFailed,
            Self::Cancelled => FailureKind::Cancelled,
            Self::Other(_) => FailureKind::Io,
        }
    }

    /// Snapshot this error as a cloneable [`FailureReason`].
    pub fn reason(&self) -> FailureReason {
        FailureReason {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Error classification carried by a failed pipeline state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// See [`FramecapError::Validation`].
    Validation,
    /// See [`FramecapError::UnsupportedFormat`].
    UnsupportedFormat,
    /// See [`FramecapError::SeekTimeout`].
    SeekTimeout,
    /// See [`FramecapError::DecodeInterrupted`].
    DecodeInterrupted,
    /// See [`FramecapError::CodecUnavailable`].
    CodecUnavailable,
    /// See [`FramecapError::EncodeFlushFailed`].
    EncodeFlushFailed,
    /// See [`FramecapError::Cancelled`].
    Cancelled,
    /// IO or other wrapped errors.
    Io,
}

/// Structured failure reason returned to callers and stored in `PipelineState::Failed`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FailureReason {
    /// Error class.
    pub kind: FailureKind,
    /// Human-readable message.
    pub message: String,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
