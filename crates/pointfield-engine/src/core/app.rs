use winit::dpi::PhysicalSize;

use crate::backend::WgpuContext;
use crate::input::InputEvent;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`Runtime`](crate::window::Runtime).
pub trait App {
    /// Called once the window and GPU are up. The app owns the context from here on.
    ///
    /// An error stops the runtime and is returned from `Runtime::run`.
    fn on_ready(&mut self, ctx: WgpuContext) -> anyhow::Result<()>;

    /// Called for every translated input event, after the pointer state is updated.
    fn on_input(&mut self, event: &InputEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called when the drawable size changes.
    fn on_resize(&mut self, size: PhysicalSize<u32>) {
        let _ = size;
    }

    /// Whether the runtime should request another redraw. Checked each time
    /// the event loop runs dry; `false` lets it sleep until the next event.
    fn wants_redraw(&self) -> bool {
        true
    }

    /// Called once per redraw.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;
}
