//! Core engine-facing contracts.
//!
//! This module defines the interface between the runtime (platform loop) and
//! the application driving a scene, without leaking winit plumbing into it.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
