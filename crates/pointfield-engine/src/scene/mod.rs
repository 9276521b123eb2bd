//! The point cloud scene and its frame loop.
//!
//! [`PointField`] owns a rendering context and walks it through
//! `initialize → setup → tick…`, drawing one shared buffer once per
//! [`ModelInstance`] each frame. [`FrameLoop`] pumps ticks from a
//! [`FrameHost`] when no window event loop is driving them.

mod config;
mod field;
mod frame_loop;
mod instance;
pub mod shaders;

pub use config::SceneConfig;
pub use field::{FieldState, PointField};
pub use frame_loop::{FrameHost, FrameInput, FrameLoop, LoopSummary, ScriptedHost};
pub use instance::{InstanceTransform, ModelInstance, REFERENCE_INSTANCES};
pub use shaders::REFERENCE_INTERFACE;

#[cfg(test)]
mod tests;
