//! WGSL front end shared by the backends.
//!
//! Stages are parsed and validated with naga; linking checks that the two
//! stages fit together and collects the names the program exposes.

use std::collections::BTreeSet;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, EntryPoint, Module, ShaderStage, TypeInner};

use crate::gfx::ShaderKind;

/// A parsed, validated shader stage.
#[derive(Debug, Clone)]
pub(crate) struct StageModule {
    pub kind: ShaderKind,
    pub source: String,
    pub module: Module,
    pub entry_point: String,
    entry_index: usize,
}

/// A vertex input exposed by a program.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct VertexInput {
    pub name: String,
    pub location: u32,
    pub components: u32,
}

/// A `var<uniform>` binding in `@group(0)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct UniformBlock {
    pub binding: u32,
    /// Largest size any stage declares for the block, in bytes.
    pub size: u32,
}

/// A named uniform inside a block.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct UniformField {
    pub name: String,
    pub binding: u32,
    pub offset: u32,
    pub size: u32,
}

/// Everything a linked program exposes.
#[derive(Debug, Clone)]
pub(crate) struct ProgramInterface {
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub inputs: Vec<VertexInput>,
    /// Sorted by binding index.
    pub blocks: Vec<UniformBlock>,
    pub fields: Vec<UniformField>,
}

impl ProgramInterface {
    pub fn input(&self, name: &str) -> Option<&VertexInput> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn block_index(&self, binding: u32) -> Option<usize> {
        self.blocks.iter().position(|b| b.binding == binding)
    }
}

fn naga_stage(kind: ShaderKind) -> ShaderStage {
    match kind {
        ShaderKind::Vertex => ShaderStage::Vertex,
        ShaderKind::Fragment => ShaderStage::Fragment,
    }
}

/// Parses and validates one stage. The error string is the compile log.
pub(crate) fn compile_stage(source: &str, kind: ShaderKind) -> Result<StageModule, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| format!("error: {}", e.into_inner()))?;

    let stage = naga_stage(kind);
    let entry_index = module
        .entry_points
        .iter()
        .position(|ep| ep.stage == stage)
        .ok_or_else(|| format!("error: no @{kind} entry point in module"))?;

    Ok(StageModule {
        kind,
        source: source.to_string(),
        entry_point: module.entry_points[entry_index].name.clone(),
        module,
        entry_index,
    })
}

/// Checks that `vertex` and `fragment` form a program. The error string is the link log.
pub(crate) fn link_stages(
    vertex: &StageModule,
    fragment: &StageModule,
) -> Result<ProgramInterface, String> {
    let mut problems = Vec::new();

    if vertex.kind != ShaderKind::Vertex {
        problems.push(format!("error: {} shader attached as the vertex stage", vertex.kind));
    }
    if fragment.kind != ShaderKind::Fragment {
        problems.push(format!("error: {} shader attached as the fragment stage", fragment.kind));
    }
    if !problems.is_empty() {
        return Err(problems.join("\n"));
    }

    let vs_entry = entry(vertex);
    let fs_entry = entry(fragment);

    let produced = vertex_outputs(&vertex.module, vs_entry);
    for (location, name) in fragment_inputs(&fragment.module, fs_entry) {
        if !produced.contains(&location) {
            problems.push(format!(
                "error: fragment input @location({location}) `{name}` is not written by the vertex stage"
            ));
        }
    }

    let mut blocks = Vec::new();
    let mut fields = Vec::new();
    for stage in [vertex, fragment] {
        collect_uniforms(stage, &mut blocks, &mut fields, &mut problems);
    }

    if !problems.is_empty() {
        return Err(problems.join("\n"));
    }

    blocks.sort_by_key(|b: &UniformBlock| b.binding);

    Ok(ProgramInterface {
        vertex_entry: vertex.entry_point.clone(),
        fragment_entry: fragment.entry_point.clone(),
        inputs: vertex_inputs(&vertex.module, vs_entry),
        blocks,
        fields,
    })
}

fn entry(stage: &StageModule) -> &EntryPoint {
    &stage.module.entry_points[stage.entry_index]
}

fn components(inner: &TypeInner) -> u32 {
    match inner {
        TypeInner::Scalar(_) => 1,
        TypeInner::Vector { size, .. } => *size as u32,
        TypeInner::Matrix { columns, rows, .. } => *columns as u32 * *rows as u32,
        _ => 0,
    }
}

/// Location-bound values carried by an argument or result of type `ty`.
fn located(
    module: &Module,
    name: Option<&String>,
    ty: naga::Handle<naga::Type>,
    binding: Option<&Binding>,
    out: &mut Vec<(u32, String, u32)>,
) {
    let inner = &module.types[ty].inner;
    match binding {
        Some(Binding::Location { location, .. }) => {
            out.push((*location, name.cloned().unwrap_or_default(), components(inner)));
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = inner {
                for member in members {
                    if let Some(Binding::Location { location, .. }) = &member.binding {
                        out.push((
                            *location,
                            member.name.clone().unwrap_or_default(),
                            components(&module.types[member.ty].inner),
                        ));
                    }
                }
            }
        }
    }
}

fn vertex_inputs(module: &Module, ep: &EntryPoint) -> Vec<VertexInput> {
    let mut found = Vec::new();
    for arg in &ep.function.arguments {
        located(module, arg.name.as_ref(), arg.ty, arg.binding.as_ref(), &mut found);
    }
    found
        .into_iter()
        .map(|(location, name, components)| VertexInput {
            name,
            location,
            components,
        })
        .collect()
}

fn vertex_outputs(module: &Module, ep: &EntryPoint) -> BTreeSet<u32> {
    let mut found = Vec::new();
    if let Some(result) = &ep.function.result {
        located(module, None, result.ty, result.binding.as_ref(), &mut found);
    }
    found.into_iter().map(|(location, _, _)| location).collect()
}

fn fragment_inputs(module: &Module, ep: &EntryPoint) -> Vec<(u32, String)> {
    let mut found = Vec::new();
    for arg in &ep.function.arguments {
        located(module, arg.name.as_ref(), arg.ty, arg.binding.as_ref(), &mut found);
    }
    found
        .into_iter()
        .map(|(location, name, _)| (location, name))
        .collect()
}

fn collect_uniforms(
    stage: &StageModule,
    blocks: &mut Vec<UniformBlock>,
    fields: &mut Vec<UniformField>,
    problems: &mut Vec<String>,
) {
    let module = &stage.module;
    let gctx = module.to_ctx();

    for (_, var) in module.global_variables.iter() {
        let var_name = var.name.as_deref().unwrap_or("<unnamed>");
        match var.space {
            AddressSpace::Uniform => {}
            AddressSpace::Handle => {
                problems.push(format!(
                    "error: {} stage binds resource `{var_name}`; only uniform blocks are supported",
                    stage.kind
                ));
                continue;
            }
            _ => continue,
        }

        let Some(rb) = &var.binding else { continue };
        if rb.group != 0 {
            problems.push(format!(
                "error: uniform `{var_name}` is in @group({}); only @group(0) is supported",
                rb.group
            ));
            continue;
        }

        let inner = &module.types[var.ty].inner;
        let size = inner.size(gctx);
        match blocks.iter_mut().find(|b| b.binding == rb.binding) {
            Some(block) => block.size = block.size.max(size),
            None => blocks.push(UniformBlock {
                binding: rb.binding,
                size,
            }),
        }

        let mut add = |name: &str, offset: u32, size: u32| {
            let field = UniformField {
                name: name.to_string(),
                binding: rb.binding,
                offset,
                size,
            };
            match fields.iter().find(|f| f.name == name) {
                Some(existing) if *existing == field => {}
                Some(existing) => problems.push(format!(
                    "error: uniform `{name}` declared at @binding({}) offset {} in one stage \
                     and @binding({}) offset {} in another",
                    existing.binding, existing.offset, field.binding, field.offset
                )),
                None => fields.push(field),
            }
        };

        match inner {
            TypeInner::Struct { members, .. } => {
                for member in members {
                    if let Some(name) = &member.name {
                        add(name, member.offset, module.types[member.ty].inner.size(gctx));
                    }
                }
            }
            _ => {
                if let Some(name) = &var.name {
                    add(name, 0, size);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::shaders;

    fn reference() -> ProgramInterface {
        let vs = compile_stage(shaders::VERTEX_SOURCE, ShaderKind::Vertex).unwrap();
        let fs = compile_stage(shaders::FRAGMENT_SOURCE, ShaderKind::Fragment).unwrap();
        link_stages(&vs, &fs).unwrap()
    }

    #[test]
    fn reference_inputs_come_from_the_input_struct() {
        let iface = reference();
        assert_eq!(iface.input("position").map(|i| (i.location, i.components)), Some((0, 3)));
        assert_eq!(iface.input("color").map(|i| (i.location, i.components)), Some((1, 4)));
    }

    #[test]
    fn reference_uniform_offsets_follow_wgsl_layout() {
        let iface = reference();
        let at = |name| iface.field(name).map(|f| (f.offset, f.size));
        assert_eq!(at("uColor"), Some((0, 16)));
        assert_eq!(at("uResolution"), Some((16, 8)));
        assert_eq!(at("uMouse"), Some((24, 8)));
        assert_eq!(at("uClientX"), Some((32, 4)));
        assert_eq!(at("modelMatrix"), Some((48, 64)));
        assert_eq!(at("uFlag"), Some((112, 4)));
        assert_eq!(iface.blocks, [UniformBlock { binding: 0, size: 128 }]);
    }

    #[test]
    fn standalone_uniform_globals_are_fields() {
        const VS: &str = r#"
            @group(0) @binding(3) var<uniform> uScale: f32;

            @vertex
            fn main(@location(0) p: vec2<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(p * uScale, 0.0, 1.0);
            }
        "#;
        const FS: &str = r#"
            @fragment
            fn main() -> @location(0) vec4<f32> {
                return vec4<f32>(1.0);
            }
        "#;

        let vs = compile_stage(VS, ShaderKind::Vertex).unwrap();
        let fs = compile_stage(FS, ShaderKind::Fragment).unwrap();
        let iface = link_stages(&vs, &fs).unwrap();
        assert_eq!(
            iface.field("uScale"),
            Some(&UniformField { name: "uScale".into(), binding: 3, offset: 0, size: 4 })
        );
        assert_eq!(iface.input("p").map(|i| i.components), Some(2));
    }

    #[test]
    fn textures_are_rejected_at_link() {
        const FS: &str = r#"
            @group(0) @binding(1) var tex: texture_2d<f32>;

            @fragment
            fn fs_main(@location(0) color: vec4<f32>) -> @location(0) vec4<f32> {
                return color * textureLoad(tex, vec2<i32>(0, 0), 0);
            }
        "#;

        let vs = compile_stage(shaders::VERTEX_SOURCE, ShaderKind::Vertex).unwrap();
        let fs = compile_stage(FS, ShaderKind::Fragment).unwrap();
        let log = link_stages(&vs, &fs).unwrap_err();
        assert!(log.contains("`tex`"), "{log}");
    }

    #[test]
    fn swapped_stages_fail_to_link() {
        let vs = compile_stage(shaders::VERTEX_SOURCE, ShaderKind::Vertex).unwrap();
        let fs = compile_stage(shaders::FRAGMENT_SOURCE, ShaderKind::Fragment).unwrap();
        assert!(link_stages(&fs, &vs).is_err());
    }
}
