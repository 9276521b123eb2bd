use std::time::Instant;

use winit::dpi::PhysicalSize;

use crate::gfx::{FrameOutcome, RenderError, RenderingContext};
use crate::input::PointerState;

use super::field::PointField;

/// Inputs for one tick.
#[derive(Debug, Copy, Clone)]
pub struct FrameInput {
    pub now: Instant,
    pub size: PhysicalSize<u32>,
    pub pointer: PointerState,
}

/// Supplies frames to a [`FrameLoop`].
pub trait FrameHost {
    /// Inputs for the next frame, or `None` when the host has no more frames.
    fn next_frame(&mut self) -> Option<FrameInput>;

    /// Called after each tick with its outcome.
    fn frame_done(&mut self, outcome: FrameOutcome) {
        let _ = outcome;
    }
}

/// Totals reported when a [`FrameLoop`] returns.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct LoopSummary {
    pub presented: u64,
    pub skipped: u64,
}

/// Explicit frame pump: ticks while the field is running and the host has frames.
pub struct FrameLoop;

impl FrameLoop {
    pub fn run<C, H>(field: &mut PointField<C>, host: &mut H) -> Result<LoopSummary, RenderError>
    where
        C: RenderingContext,
        H: FrameHost,
    {
        let mut summary = LoopSummary::default();

        while field.is_running() {
            let Some(frame) = host.next_frame() else {
                log::debug!("frame host exhausted");
                break;
            };

            let outcome = field.tick(frame.now, frame.size, &frame.pointer)?;
            match outcome {
                FrameOutcome::Presented => summary.presented += 1,
                FrameOutcome::Skipped => summary.skipped += 1,
                FrameOutcome::Fatal => {}
            }
            host.frame_done(outcome);
        }

        Ok(summary)
    }
}

/// A host that replays a fixed number of frames at a steady interval.
#[derive(Debug, Clone)]
pub struct ScriptedHost {
    remaining: u32,
    next: Instant,
    interval: std::time::Duration,
    size: PhysicalSize<u32>,
    pointer: PointerState,
}

impl ScriptedHost {
    pub fn new(frames: u32, start: Instant, interval: std::time::Duration, size: PhysicalSize<u32>) -> Self {
        Self {
            remaining: frames,
            next: start,
            interval,
            size,
            pointer: PointerState::default(),
        }
    }

    pub fn with_pointer(mut self, pointer: PointerState) -> Self {
        self.pointer = pointer;
        self
    }
}

impl FrameHost for ScriptedHost {
    fn next_frame(&mut self) -> Option<FrameInput> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let frame = FrameInput {
            now: self.next,
            size: self.size,
            pointer: self.pointer,
        };
        self.next += self.interval;
        Some(frame)
    }
}
