use crate::gfx::FrameOutcome;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

impl SurfaceErrorAction {
    /// What the frame that hit this error amounts to.
    pub fn outcome(self) -> FrameOutcome {
        match self {
            Self::Reconfigured | Self::SkipFrame => FrameOutcome::Skipped,
            Self::Fatal => FrameOutcome::Fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_fatal_errors_stop_rendering() {
        assert_eq!(SurfaceErrorAction::Reconfigured.outcome(), FrameOutcome::Skipped);
        assert_eq!(SurfaceErrorAction::SkipFrame.outcome(), FrameOutcome::Skipped);
        assert_eq!(SurfaceErrorAction::Fatal.outcome(), FrameOutcome::Fatal);
    }
}
