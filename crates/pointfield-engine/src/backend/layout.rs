//! Turns attribute pointer state into wgpu vertex buffer layouts.

use std::collections::{BTreeMap, BTreeSet};

use crate::gfx::AttribPointer;

use super::objects::BufferId;
use super::reflect::VertexInput;

const FLOAT_BYTES: u64 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct AttributeKey {
    pub location: u32,
    pub components: u32,
    /// Offset relative to the group's base.
    pub offset: u64,
}

impl AttributeKey {
    pub fn format(&self) -> wgpu::VertexFormat {
        match self.components {
            1 => wgpu::VertexFormat::Float32,
            2 => wgpu::VertexFormat::Float32x2,
            3 => wgpu::VertexFormat::Float32x3,
            _ => wgpu::VertexFormat::Float32x4,
        }
    }

    fn end(&self) -> u64 {
        self.offset + self.components as u64 * FLOAT_BYTES
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct BufferLayoutKey {
    pub stride: u64,
    pub attributes: Vec<AttributeKey>,
}

impl BufferLayoutKey {
    /// Bytes one vertex touches past the group base.
    fn span(&self) -> u64 {
        self.attributes.iter().map(AttributeKey::end).max().unwrap_or(0)
    }

    pub fn wgpu_attributes(&self) -> Vec<wgpu::VertexAttribute> {
        self.attributes
            .iter()
            .map(|a| wgpu::VertexAttribute {
                format: a.format(),
                offset: a.offset,
                shader_location: a.location,
            })
            .collect()
    }
}

/// One `set_vertex_buffer` slot: a buffer read from `base` with one stride.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VertexGroup {
    pub buffer: BufferId,
    pub base: u64,
    pub layout: BufferLayoutKey,
}

impl VertexGroup {
    /// Bytes the buffer must hold to serve vertices `first..first + count`.
    pub fn required_len(&self, first: u32, count: u32) -> u64 {
        if count == 0 {
            return 0;
        }
        let last = (first as u64) + (count as u64) - 1;
        self.base + last * self.layout.stride + self.layout.span()
    }
}

/// Groups the pointers feeding `inputs` into vertex buffer slots.
///
/// Attributes sharing a buffer and stride land in one slot when they fit
/// inside a single stride; otherwise they get their own slot.
pub(crate) fn plan_vertex_buffers(
    inputs: &[VertexInput],
    pointers: &BTreeMap<u32, (BufferId, AttribPointer)>,
    enabled: &BTreeSet<u32>,
) -> Result<Vec<VertexGroup>, String> {
    let mut sources = Vec::with_capacity(inputs.len());

    for input in inputs {
        if !enabled.contains(&input.location) {
            return Err(format!(
                "vertex attribute array {} (`{}`) is not enabled",
                input.location, input.name
            ));
        }
        let Some((buffer, pointer)) = pointers.get(&input.location) else {
            return Err(format!(
                "vertex attribute {} (`{}`) has no buffer pointer",
                input.location, input.name
            ));
        };
        if !(1..=4).contains(&pointer.components) || pointer.components != input.components {
            return Err(format!(
                "vertex attribute {} (`{}`) expects {} floats, pointer supplies {}",
                input.location, input.name, input.components, pointer.components
            ));
        }

        let stride = match pointer.stride {
            0 => pointer.components as u64 * FLOAT_BYTES,
            s => s as u64,
        };
        if stride % FLOAT_BYTES != 0 || pointer.offset as u64 % FLOAT_BYTES != 0 {
            return Err(format!(
                "vertex attribute {} (`{}`) is not 4-byte aligned",
                input.location, input.name
            ));
        }

        sources.push((*buffer, stride, pointer.offset as u64, input.location, pointer.components));
    }

    sources.sort_by_key(|&(buffer, stride, offset, location, _)| (buffer, stride, offset, location));

    let mut groups: Vec<VertexGroup> = Vec::new();
    for (buffer, stride, offset, location, components) in sources {
        if let Some(group) = groups.last_mut() {
            let attr = AttributeKey {
                location,
                components,
                offset: offset - group.base.min(offset),
            };
            if group.buffer == buffer && group.layout.stride == stride && attr.end() <= stride {
                group.layout.attributes.push(attr);
                continue;
            }
        }

        groups.push(VertexGroup {
            buffer,
            base: offset,
            layout: BufferLayoutKey {
                stride,
                attributes: vec![AttributeKey {
                    location,
                    components,
                    offset: 0,
                }],
            },
        });
    }

    Ok(groups)
}
