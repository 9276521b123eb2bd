use std::time::Instant;

use crate::input::PointerState;

/// Per-frame context passed to `core::App::on_frame`.
///
/// `'a` is the duration of the callback invocation.
pub struct FrameCtx<'a> {
    /// Pointer state after every event delivered before this redraw.
    pub pointer: &'a PointerState,
    /// Timestamp taken when the redraw was dispatched.
    pub now: Instant,
}
