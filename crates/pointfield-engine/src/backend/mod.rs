//! `RenderingContext` implementations.
//!
//! - [`WgpuContext`] draws to a window surface through wgpu.
//! - [`HeadlessContext`] validates shaders and records commands, for tests
//!   and `--check` runs.
//!
//! Both share the WGSL front end in `reflect` and the object bookkeeping in
//! `objects`, so compile logs and name lookups agree between them.

mod gpu;
mod headless;
mod layout;
mod objects;
mod reflect;
mod uniforms;

pub use gpu::WgpuContext;
pub use headless::{Call, HeadlessContext};
pub use objects::{BufferId, ProgramId, ShaderId, UniformSlot};
