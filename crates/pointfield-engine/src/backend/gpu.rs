use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::num::NonZeroU64;

use winit::dpi::PhysicalSize;

use crate::device::{Gpu, SurfaceErrorAction};
use crate::gfx::{AttribPointer, FrameOutcome, Primitive, RenderingContext, ShaderKind};

use super::layout::{plan_vertex_buffers, BufferLayoutKey, VertexGroup};
use super::objects::{BufferId, ProgramId, ProgramStore, ShaderId, Slots, UniformSlot};
use super::uniforms::{transpose4, ArenaStaging, ShadowBlocks, UniformArena};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    primitive: Primitive,
    buffers: Vec<BufferLayoutKey>,
}

/// wgpu objects derived from a linked program, built on first draw.
struct ProgramResources {
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

struct GpuBuffer {
    raw: Option<wgpu::Buffer>,
    len: u64,
}

struct DrawRecord {
    program: ProgramId,
    pipeline: wgpu::RenderPipeline,
    vertex_buffers: Vec<(wgpu::Buffer, u64)>,
    uniform_offsets: Vec<u32>,
    viewport: [f32; 4],
    first: u32,
    count: u32,
}

struct PassRecord {
    clear: Option<wgpu::Color>,
    draws: Vec<DrawRecord>,
}

/// On-screen rendering context backed by wgpu.
///
/// Commands are recorded between presents and replayed into one encoder:
/// every `clear` opens a render pass that clears the target, draws append to
/// the open pass. Uniform values are snapshotted per draw into a
/// dynamic-offset arena uploaded once per frame.
pub struct WgpuContext {
    gpu: Gpu,
    store: ProgramStore,
    resources: HashMap<ProgramId, ProgramResources>,
    shadows: HashMap<ProgramId, ShadowBlocks>,
    buffers: Slots<GpuBuffer>,

    current_program: Option<ProgramId>,
    bound_array: Option<BufferId>,
    enabled: BTreeSet<u32>,
    pointers: BTreeMap<u32, (BufferId, AttribPointer)>,
    viewport: Option<(i32, i32, u32, u32)>,
    clear_color: wgpu::Color,

    passes: Vec<PassRecord>,
    staging: ArenaStaging,
    arena: UniformArena,
}

impl WgpuContext {
    pub fn new(gpu: Gpu) -> Self {
        Self {
            gpu,
            store: ProgramStore::default(),
            resources: HashMap::new(),
            shadows: HashMap::new(),
            buffers: Slots::default(),
            current_program: None,
            bound_array: None,
            enabled: BTreeSet::new(),
            pointers: BTreeMap::new(),
            viewport: None,
            clear_color: wgpu::Color::TRANSPARENT,
            passes: Vec::new(),
            staging: ArenaStaging::default(),
            arena: UniformArena::default(),
        }
    }

    /// Drawable size in physical pixels.
    pub fn size(&self) -> PhysicalSize<u32> {
        self.gpu.size()
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
    }

    fn write_uniform(&mut self, slot: &UniformSlot, bytes: &[u8]) {
        let Some(iface) = self.store.interface(slot.program) else {
            log::warn!("uniform write to unlinked program {:?}", slot.program);
            return;
        };
        let Some(index) = iface.block_index(slot.binding) else { return };

        let shadow = self
            .shadows
            .entry(slot.program)
            .or_insert_with(|| ShadowBlocks::new(iface.blocks.iter().map(|b| b.size)));
        shadow.write(index, slot.offset, slot.size, bytes);
    }

    fn ensure_resources(&mut self, program: ProgramId) -> Option<&mut ProgramResources> {
        if !self.resources.contains_key(&program) {
            let prog = self.store.program(program)?;
            let iface = prog.interface.as_ref()?;
            let vs = prog.stage(ShaderKind::Vertex)?;
            let fs = prog.stage(ShaderKind::Fragment)?;
            let device = self.gpu.device();

            let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("pointfield vertex shader"),
                source: wgpu::ShaderSource::Wgsl(vs.source.as_str().into()),
            });
            let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("pointfield fragment shader"),
                source: wgpu::ShaderSource::Wgsl(fs.source.as_str().into()),
            });

            let entries: Vec<_> = iface
                .blocks
                .iter()
                .map(|block| wgpu::BindGroupLayoutEntry {
                    binding: block.binding,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: NonZeroU64::new(block.size as u64),
                    },
                    count: None,
                })
                .collect();

            let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("pointfield uniforms bgl"),
                entries: &entries,
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("pointfield pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

            log::debug!("built gpu resources for {program:?}");
            self.resources.insert(
                program,
                ProgramResources {
                    vertex,
                    fragment,
                    bind_group_layout,
                    pipeline_layout,
                    pipelines: HashMap::new(),
                },
            );
        }
        self.resources.get_mut(&program)
    }

    fn pipeline(&mut self, program: ProgramId, key: PipelineKey) -> Option<wgpu::RenderPipeline> {
        let format = self.gpu.surface_format();
        let (vertex_entry, fragment_entry) = {
            let iface = self.store.interface(program)?;
            (iface.vertex_entry.clone(), iface.fragment_entry.clone())
        };
        let device = self.gpu.device().clone();
        let res = self.ensure_resources(program)?;

        if let Some(pipeline) = res.pipelines.get(&key) {
            return Some(pipeline.clone());
        }

        let attributes: Vec<Vec<wgpu::VertexAttribute>> =
            key.buffers.iter().map(BufferLayoutKey::wgpu_attributes).collect();
        let buffers: Vec<wgpu::VertexBufferLayout> = key
            .buffers
            .iter()
            .zip(&attributes)
            .map(|(layout, attrs)| wgpu::VertexBufferLayout {
                array_stride: layout.stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("pointfield pipeline"),
            layout: Some(&res.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &res.vertex,
                entry_point: Some(&vertex_entry),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &res.fragment,
                entry_point: Some(&fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: topology(key.primitive),
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("created {:?} pipeline for {program:?}", key.primitive);
        res.pipelines.insert(key, pipeline.clone());
        Some(pipeline)
    }

    /// The current viewport in wgpu's top-left convention, clamped to the target.
    fn viewport_rect(&self) -> Option<[f32; 4]> {
        let PhysicalSize { width, height } = self.gpu.size();
        let (x, y, w, h) = self.viewport.unwrap_or((0, 0, width, height));
        let (tw, th) = (width as i64, height as i64);

        let x0 = (x as i64).clamp(0, tw);
        let x1 = (x as i64 + w as i64).clamp(0, tw);
        // GL viewports are anchored bottom-left.
        let top = (th - (y as i64 + h as i64)).clamp(0, th);
        let bottom = (th - y as i64).clamp(0, th);

        (x1 > x0 && bottom > top).then(|| {
            [x0 as f32, top as f32, (x1 - x0) as f32, (bottom - top) as f32]
        })
    }

    fn record_draw(&mut self, program: ProgramId, mode: Primitive, first: u32, count: u32) -> Result<(), String> {
        if count == 0 {
            return Ok(());
        }
        if self.current_program != Some(program) {
            return Err(format!("{program:?} is not the program in use"));
        }

        let inputs = match self.store.interface(program) {
            Some(iface) => iface.inputs.clone(),
            None => return Err(format!("{program:?} is not a linked program")),
        };
        let groups = plan_vertex_buffers(&inputs, &self.pointers, &self.enabled)?;

        let mut vertex_buffers = Vec::with_capacity(groups.len());
        for VertexGroup { buffer, base, .. } in &groups {
            let Some(GpuBuffer { raw: Some(raw), len }) = self.buffers.get(buffer.0) else {
                return Err(format!("{buffer:?} has no data"));
            };
            vertex_buffers.push((raw.clone(), *base, *len));
        }
        for (group, (_, _, len)) in groups.iter().zip(&vertex_buffers) {
            let needed = group.required_len(first, count);
            if needed > *len {
                return Err(format!(
                    "drawing {count} vertices from {first} reads {needed} bytes of a {len}-byte buffer"
                ));
            }
        }

        let Some(viewport) = self.viewport_rect() else {
            return Ok(());
        };

        let key = PipelineKey {
            primitive: mode,
            buffers: groups.into_iter().map(|g| g.layout).collect(),
        };
        let pipeline = self
            .pipeline(program, key)
            .ok_or_else(|| format!("no gpu resources for {program:?}"))?;

        let alignment = self.gpu.device().limits().min_uniform_buffer_offset_alignment;
        let uniform_offsets = match self.store.interface(program) {
            Some(iface) => {
                let shadow = self
                    .shadows
                    .entry(program)
                    .or_insert_with(|| ShadowBlocks::new(iface.blocks.iter().map(|b| b.size)));
                shadow
                    .blocks()
                    .map(|block| self.staging.push(block, alignment))
                    .collect()
            }
            None => Vec::new(),
        };

        let draw = DrawRecord {
            program,
            pipeline,
            vertex_buffers: vertex_buffers.into_iter().map(|(b, base, _)| (b, base)).collect(),
            uniform_offsets,
            viewport,
            first,
            count,
        };

        match self.passes.last_mut() {
            Some(pass) => pass.draws.push(draw),
            None => self.passes.push(PassRecord {
                clear: None,
                draws: vec![draw],
            }),
        }
        Ok(())
    }

    fn bind_groups(&self, passes: &[PassRecord]) -> HashMap<ProgramId, wgpu::BindGroup> {
        let mut groups = HashMap::new();
        let Some(arena) = self.arena.buffer() else { return groups };

        for draw in passes.iter().flat_map(|p| &p.draws) {
            if groups.contains_key(&draw.program) {
                continue;
            }
            let (Some(res), Some(iface)) =
                (self.resources.get(&draw.program), self.store.interface(draw.program))
            else {
                continue;
            };
            let entries: Vec<_> = iface
                .blocks
                .iter()
                .map(|block| wgpu::BindGroupEntry {
                    binding: block.binding,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: arena,
                        offset: 0,
                        size: NonZeroU64::new(block.size as u64),
                    }),
                })
                .collect();

            let group = self.gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("pointfield uniforms bind group"),
                layout: &res.bind_group_layout,
                entries: &entries,
            });
            groups.insert(draw.program, group);
        }
        groups
    }
}

fn topology(mode: Primitive) -> wgpu::PrimitiveTopology {
    match mode {
        Primitive::Points => wgpu::PrimitiveTopology::PointList,
    }
}

impl RenderingContext for WgpuContext {
    type Shader = ShaderId;
    type Program = ProgramId;
    type Buffer = BufferId;
    type UniformLocation = UniformSlot;

    fn create_shader(&mut self, kind: ShaderKind) -> ShaderId {
        self.store.create_shader(kind)
    }

    fn shader_source(&mut self, shader: ShaderId, source: &str) {
        self.store.shader_source(shader, source);
    }

    fn compile_shader(&mut self, shader: ShaderId) {
        self.store.compile_shader(shader);
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        self.store.shader_compile_status(shader)
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        self.store.shader_info_log(shader)
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.store.delete_shader(shader);
    }

    fn create_program(&mut self) -> ProgramId {
        self.store.create_program()
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        self.store.attach_shader(program, shader);
    }

    fn link_program(&mut self, program: ProgramId) {
        self.resources.remove(&program);
        self.shadows.remove(&program);
        self.store.link_program(program);
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        self.store.program_link_status(program)
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        self.store.program_info_log(program)
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.current_program = program;
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.resources.remove(&program);
        self.shadows.remove(&program);
        self.store.delete_program(program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        self.store.attrib_location(program, name)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformSlot> {
        self.store.uniform_location(program, name)
    }

    fn create_buffer(&mut self) -> BufferId {
        BufferId(self.buffers.insert(GpuBuffer { raw: None, len: 0 }))
    }

    fn bind_array_buffer(&mut self, buffer: Option<BufferId>) {
        self.bound_array = buffer;
    }

    fn array_buffer_data(&mut self, buffer: BufferId, data: &[u8]) {
        use wgpu::util::DeviceExt;

        let device = self.gpu.device();
        let Some(slot) = self.buffers.get_mut(buffer.0) else {
            log::warn!("buffer data for deleted {buffer:?}");
            return;
        };

        if let Some(old) = slot.raw.take() {
            old.destroy();
        }
        if data.is_empty() {
            *slot = GpuBuffer { raw: None, len: 0 };
            return;
        }

        let raw = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("pointfield vertex buffer"),
            contents: data,
            usage: wgpu::BufferUsages::VERTEX,
        });
        *slot = GpuBuffer {
            raw: Some(raw),
            len: data.len() as u64,
        };
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(GpuBuffer { raw: Some(raw), .. }) = self.buffers.remove(buffer.0) {
            raw.destroy();
        }
        self.pointers.retain(|_, (b, _)| *b != buffer);
        if self.bound_array == Some(buffer) {
            self.bound_array = None;
        }
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        self.enabled.insert(location);
    }

    fn vertex_attrib_pointer_f32(&mut self, buffer: BufferId, location: u32, pointer: AttribPointer) {
        self.pointers.insert(location, (buffer, pointer));
    }

    fn uniform_1_f32(&mut self, _program: ProgramId, location: &UniformSlot, x: f32) {
        self.write_uniform(location, bytemuck::bytes_of(&x));
    }

    fn uniform_2_f32_slice(&mut self, _program: ProgramId, location: &UniformSlot, v: &[f32; 2]) {
        self.write_uniform(location, bytemuck::cast_slice(v));
    }

    fn uniform_4_f32_slice(&mut self, _program: ProgramId, location: &UniformSlot, v: &[f32; 4]) {
        self.write_uniform(location, bytemuck::cast_slice(v));
    }

    fn uniform_matrix_4_f32_slice(
        &mut self,
        _program: ProgramId,
        location: &UniformSlot,
        transpose: bool,
        m: &[f32; 16],
    ) {
        let m = if transpose { transpose4(m) } else { *m };
        self.write_uniform(location, bytemuck::cast_slice(&m));
    }

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.viewport = Some((x, y, width, height));
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        let [r, g, b, a] = rgba.map(f64::from);
        self.clear_color = wgpu::Color { r, g, b, a };
    }

    fn clear(&mut self) {
        self.passes.push(PassRecord {
            clear: Some(self.clear_color),
            draws: Vec::new(),
        });
    }

    fn draw_arrays(&mut self, program: ProgramId, mode: Primitive, first: u32, count: u32) {
        if let Err(reason) = self.record_draw(program, mode, first, count) {
            log::warn!("draw skipped: {reason}");
        }
    }

    fn present(&mut self) -> FrameOutcome {
        let passes = std::mem::take(&mut self.passes);

        let mut frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                self.staging.clear();
                let action = self.gpu.handle_surface_error(err);
                if action == SurfaceErrorAction::Fatal {
                    log::error!("surface can no longer present");
                }
                return action.outcome();
            }
        };

        if !self.staging.is_empty() {
            let len = self.staging.bytes().len() as u64;
            self.arena.ensure_capacity(self.gpu.device(), len);
            if let Some(arena) = self.arena.buffer() {
                self.gpu.queue().write_buffer(arena, 0, self.staging.bytes());
            }
        }
        let bind_groups = self.bind_groups(&passes);

        for pass in &passes {
            let load = match pass.clear {
                Some(color) => wgpu::LoadOp::Clear(color),
                None => wgpu::LoadOp::Load,
            };
            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("pointfield pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for draw in &pass.draws {
                let [x, y, w, h] = draw.viewport;
                rpass.set_viewport(x, y, w, h, 0.0, 1.0);
                rpass.set_pipeline(&draw.pipeline);
                if !draw.uniform_offsets.is_empty() {
                    let Some(group) = bind_groups.get(&draw.program) else { continue };
                    rpass.set_bind_group(0, group, &draw.uniform_offsets);
                }
                for (slot, (buffer, base)) in draw.vertex_buffers.iter().enumerate() {
                    rpass.set_vertex_buffer(slot as u32, buffer.slice(*base..));
                }
                rpass.draw(draw.first..draw.first + draw.count, 0..1);
            }
        }

        self.gpu.submit(frame);
        self.staging.clear();
        FrameOutcome::Presented
    }
}
