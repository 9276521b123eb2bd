//! Shader program build pipeline and vertex/uniform binding.
//!
//! Everything here is written against [`RenderingContext`], so the same
//! code drives the wgpu backend and the headless recorder.
//!
//! Build order:
//! - [`compile`] each stage
//! - [`link`] the pair into a program
//! - [`BindingTable::resolve`] the declared names
//! - [`upload`] the interleaved vertices

mod binding;
mod context;
mod error;
mod program;
mod shader;
mod vertex;

pub use binding::{
    AttributeBinding, AttributeDescriptor, AttributeSpec, BindingTable, ShaderInterface,
    UniformBinding, UniformKind, UniformSpec, UniformValue, VertexLayout,
};
pub use context::{AttribPointer, FrameOutcome, Primitive, RenderingContext};
pub use error::{BindingKind, RenderError};
pub use program::{link, resolve_attribute, resolve_uniform};
pub use shader::{compile, ShaderKind};
pub use vertex::{generate_disk, upload, InterleavedVertex, VertexBuffer};
