//! Bundled WGSL sources for the point cloud program.

use crate::gfx::{InterleavedVertex, ShaderInterface, UniformKind, UniformSpec};

pub const VERTEX_SOURCE: &str = include_str!("shaders/points.vert.wgsl");
pub const FRAGMENT_SOURCE: &str = include_str!("shaders/points.frag.wgsl");

/// Uniforms in push order.
pub const UNIFORMS: [UniformSpec; 6] = [
    UniformSpec::new("uColor", UniformKind::Vec4),
    UniformSpec::new("uResolution", UniformKind::Vec2),
    UniformSpec::new("uMouse", UniformKind::Vec2),
    UniformSpec::new("uClientX", UniformKind::Scalar),
    UniformSpec::new("modelMatrix", UniformKind::Mat4),
    UniformSpec::new("uFlag", UniformKind::Scalar),
];

/// Names any point cloud program must expose.
pub const REFERENCE_INTERFACE: ShaderInterface = ShaderInterface {
    attributes: &InterleavedVertex::ATTRIBUTES,
    uniforms: &UNIFORMS,
};
