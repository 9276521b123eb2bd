//! Attribute and uniform bindings resolved once after link.
//!
//! The table is built from an explicit descriptor list; nothing is re-queried
//! from the context while frames are drawn.

use std::mem::size_of;

use super::context::{AttribPointer, RenderingContext};
use super::error::RenderError;
use super::program::{resolve_attribute, resolve_uniform};
use super::vertex::VertexBuffer;

/// A named float attribute and its component count.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub components: u32,
}

impl AttributeSpec {
    pub const fn new(name: &'static str, components: u32) -> Self {
        Self { name, components }
    }
}

/// Placement of one attribute inside an interleaved record.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AttributeDescriptor {
    pub name: &'static str,
    pub components: u32,
    pub byte_offset: u32,
}

/// Interleaved record layout derived from an ordered attribute list.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VertexLayout {
    pub attributes: Vec<AttributeDescriptor>,
    /// Record size in bytes.
    pub stride: u32,
}

impl VertexLayout {
    /// Packs attributes back to back, in order, as `f32` components.
    pub fn interleaved(specs: &[AttributeSpec]) -> Self {
        let mut offset = 0u32;
        let attributes = specs
            .iter()
            .map(|spec| {
                let desc = AttributeDescriptor {
                    name: spec.name,
                    components: spec.components,
                    byte_offset: offset,
                };
                offset += spec.components * size_of::<f32>() as u32;
                desc
            })
            .collect();

        Self {
            attributes,
            stride: offset,
        }
    }
}

/// Declared shape of a uniform.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformKind {
    Vec4,
    Vec2,
    Scalar,
    Mat4,
}

/// A value pushed to a uniform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Vec4([f32; 4]),
    Vec2([f32; 2]),
    Scalar(f32),
    /// Column-major.
    Mat4([f32; 16]),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Scalar(_) => UniformKind::Scalar,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }
}

/// A named uniform and its declared kind.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformSpec {
    pub name: &'static str,
    pub kind: UniformKind,
}

impl UniformSpec {
    pub const fn new(name: &'static str, kind: UniformKind) -> Self {
        Self { name, kind }
    }
}

/// Names a program must expose, in the order values will be supplied.
#[derive(Debug, Copy, Clone)]
pub struct ShaderInterface {
    pub attributes: &'static [AttributeSpec],
    pub uniforms: &'static [UniformSpec],
}

/// A resolved vertex input.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AttributeBinding {
    pub name: &'static str,
    pub location: u32,
    pub components: u32,
    pub byte_offset: u32,
}

/// Pushes one value; returns `false` if the value does not fit the kind.
type PushFn<C> = fn(
    &mut C,
    <C as RenderingContext>::Program,
    &<C as RenderingContext>::UniformLocation,
    &UniformValue,
) -> bool;

/// A resolved uniform with its push routine.
pub struct UniformBinding<C: RenderingContext> {
    pub name: &'static str,
    pub location: C::UniformLocation,
    pub kind: UniformKind,
    push: PushFn<C>,
}

impl UniformKind {
    fn push_fn<C: RenderingContext>(self) -> PushFn<C> {
        match self {
            UniformKind::Vec4 => push_vec4::<C>,
            UniformKind::Vec2 => push_vec2::<C>,
            UniformKind::Scalar => push_scalar::<C>,
            UniformKind::Mat4 => push_mat4::<C>,
        }
    }
}

fn push_vec4<C: RenderingContext>(
    ctx: &mut C,
    program: C::Program,
    location: &C::UniformLocation,
    value: &UniformValue,
) -> bool {
    let UniformValue::Vec4(v) = value else { return false };
    ctx.uniform_4_f32_slice(program, location, v);
    true
}

fn push_vec2<C: RenderingContext>(
    ctx: &mut C,
    program: C::Program,
    location: &C::UniformLocation,
    value: &UniformValue,
) -> bool {
    let UniformValue::Vec2(v) = value else { return false };
    ctx.uniform_2_f32_slice(program, location, v);
    true
}

fn push_scalar<C: RenderingContext>(
    ctx: &mut C,
    program: C::Program,
    location: &C::UniformLocation,
    value: &UniformValue,
) -> bool {
    let UniformValue::Scalar(x) = value else { return false };
    ctx.uniform_1_f32(program, location, *x);
    true
}

fn push_mat4<C: RenderingContext>(
    ctx: &mut C,
    program: C::Program,
    location: &C::UniformLocation,
    value: &UniformValue,
) -> bool {
    let UniformValue::Mat4(m) = value else { return false };
    ctx.uniform_matrix_4_f32_slice(program, location, false, m);
    true
}

/// Attribute and uniform bindings for one program.
pub struct BindingTable<C: RenderingContext> {
    attributes: Vec<AttributeBinding>,
    stride: u32,
    uniforms: Vec<UniformBinding<C>>,
}

impl<C: RenderingContext> BindingTable<C> {
    /// Resolves every declared name; the first missing one is returned as an error.
    pub fn resolve(
        ctx: &C,
        program: C::Program,
        interface: &ShaderInterface,
    ) -> Result<Self, RenderError> {
        let layout = VertexLayout::interleaved(interface.attributes);

        let attributes = layout
            .attributes
            .iter()
            .map(|desc| {
                Ok(AttributeBinding {
                    name: desc.name,
                    location: resolve_attribute(ctx, program, desc.name)?,
                    components: desc.components,
                    byte_offset: desc.byte_offset,
                })
            })
            .collect::<Result<Vec<_>, RenderError>>()?;

        let uniforms = interface
            .uniforms
            .iter()
            .map(|spec| {
                Ok(UniformBinding {
                    name: spec.name,
                    location: resolve_uniform(ctx, program, spec.name)?,
                    kind: spec.kind,
                    push: spec.kind.push_fn::<C>(),
                })
            })
            .collect::<Result<Vec<_>, RenderError>>()?;

        log::debug!(
            "resolved {} attributes (stride {} bytes) and {} uniforms",
            attributes.len(),
            layout.stride,
            uniforms.len()
        );

        Ok(Self {
            attributes,
            stride: layout.stride,
            uniforms,
        })
    }

    pub fn attributes(&self) -> &[AttributeBinding] {
        &self.attributes
    }

    pub fn uniforms(&self) -> &[UniformBinding<C>] {
        &self.uniforms
    }

    /// Record size in bytes.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Binds `buffer` once and points every attribute into it.
    pub fn bind(&self, ctx: &mut C, buffer: &VertexBuffer<C::Buffer>) {
        ctx.bind_array_buffer(Some(buffer.handle));
        for attr in &self.attributes {
            ctx.enable_vertex_attrib_array(attr.location);
            ctx.vertex_attrib_pointer_f32(
                buffer.handle,
                attr.location,
                AttribPointer {
                    components: attr.components,
                    normalized: false,
                    stride: self.stride,
                    offset: attr.byte_offset,
                },
            );
        }
    }

    /// Pushes `values` pairwise onto the uniforms, in declaration order.
    pub fn push_uniforms(&self, ctx: &mut C, program: C::Program, values: &[UniformValue]) {
        if values.len() != self.uniforms.len() {
            log::warn!(
                "{} uniform values supplied for {} uniforms",
                values.len(),
                self.uniforms.len()
            );
        }

        for (binding, value) in self.uniforms.iter().zip(values) {
            if !(binding.push)(ctx, program, &binding.location, value) {
                log::warn!(
                    "uniform `{}` is {:?} but got a {:?} value; skipped",
                    binding.name,
                    binding.kind,
                    value.kind()
                );
            }
        }
    }
}
