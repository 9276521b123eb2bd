//! Time subsystem.
//!
//! Frame timing without coupling to the runtime:
//! - one `FrameClock` per render loop, started when the scene is set up
//! - call `tick_at()` with the host timestamp once per frame

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
