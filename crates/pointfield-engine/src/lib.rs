//! Pointfield engine crate.
//!
//! Renders an animated cloud of points through a GL-style rendering context
//! (`gfx`), backed either by wgpu on a winit window or by a headless recorder
//! (`backend`). The `scene` module owns the point field itself; `window` and
//! `core` drive it from the platform event loop.

pub mod backend;
pub mod core;
pub mod device;
pub mod gfx;
pub mod input;
pub mod logging;
pub mod scene;
pub mod time;
pub mod window;
