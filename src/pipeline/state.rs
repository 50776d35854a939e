use crate::foundation::error::{FailureReason, FramecapError, FramecapResult};

/// Lifecycle of one orchestrator run.
///
/// Transitions only move forward. `Capturing -> Capturing` (one step per source) is the only
/// loop, and every non-terminal state may fail. `Complete` and `Failed` accept nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineState {
    /// Nothing opened yet.
    #[default]
    Idle,
    /// Every source's metadata is known.
    MetadataResolved,
    /// Stepping through a source.
    Capturing,
    /// Flushing the encoder / assembling output.
    Finalizing,
    /// Output returned to the caller.
    Complete,
    /// Run aborted; resources released.
    Failed(FailureReason),
}

impl PipelineState {
    fn rank(&self) -> Option<u8> {
        match self {
            Self::Idle => Some(0),
            Self::MetadataResolved => Some(1),
            Self::Capturing => Some(2),
            Self::Finalizing => Some(3),
            Self::Complete => Some(4),
            Self::Failed(_) => None,
        }
    }

    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::MetadataResolved => "metadata_resolved",
            Self::Capturing => "capturing",
            Self::Finalizing => "finalizing",
            Self::Complete => "complete",
            Self::Failed(_) => "failed",
        }
    }

    /// Return `true` for `Complete` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed(_))
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: &PipelineState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(2), Some(2)) => true,
            (Some(cur), Some(n)) => n == cur + 1,
            (None, _) => false,
        }
    }

    /// Move to `next`, refusing illegal transitions.
    pub fn advance(&mut self, next: PipelineState) -> FramecapResult<()> {
        if !self.can_transition_to(&next) {
            return Err(FramecapError::validation(format!(
                "illegal pipeline transition {} -> {}",
                self.name(),
                next.name()
            )));
        }
        tracing::trace!(from = self.name(), to = next.name(), "pipeline state");
        *self = next;
        Ok(())
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/state.rs"]
mod tests;
