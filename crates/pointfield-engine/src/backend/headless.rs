use crate::gfx::{AttribPointer, FrameOutcome, Primitive, RenderingContext, ShaderKind};

use super::objects::{BufferId, ProgramId, ProgramStore, ShaderId, Slots, UniformSlot};

/// A state-changing command issued to a [`HeadlessContext`].
///
/// Object creation, compilation and queries are not recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    UseProgram(Option<ProgramId>),
    BindArrayBuffer(Option<BufferId>),
    BufferData {
        buffer: BufferId,
        bytes: usize,
    },
    DeleteBuffer(BufferId),
    EnableVertexAttribArray(u32),
    VertexAttribPointer {
        buffer: BufferId,
        location: u32,
        pointer: AttribPointer,
    },
    Uniform {
        location: UniformSlot,
        data: Vec<f32>,
    },
    UniformMatrix {
        location: UniformSlot,
        transpose: bool,
        data: Vec<f32>,
    },
    Viewport {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    ClearColor([f32; 4]),
    Clear,
    DrawArrays {
        program: ProgramId,
        mode: Primitive,
        first: u32,
        count: u32,
    },
    Present,
}

/// Rendering context that validates shaders and records commands without a GPU.
///
/// Shader compilation and linking go through the same WGSL front end as the
/// wgpu backend, so compile logs and name resolution behave identically.
#[derive(Debug, Default)]
pub struct HeadlessContext {
    store: ProgramStore,
    buffers: Slots<Vec<u8>>,
    calls: Vec<Call>,
    presents: usize,
    fatal_from: Option<usize>,
}

impl HeadlessContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the `nth` present (counting from 1) and every later one report
    /// [`FrameOutcome::Fatal`], as a lost device would.
    pub fn with_fatal_present(mut self, nth: usize) -> Self {
        self.fatal_from = Some(nth);
        self
    }

    /// Commands recorded so far, oldest first.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Bytes last uploaded to `buffer`.
    pub fn buffer_contents(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(buffer.0).map(Vec::as_slice)
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.live()
    }

    pub fn live_shaders(&self) -> usize {
        self.store.live_shaders()
    }

    pub fn live_programs(&self) -> usize {
        self.store.live_programs()
    }

    fn record_uniform(&mut self, location: &UniformSlot, data: &[f32]) {
        if (data.len() * 4) as u32 > location.size {
            log::warn!("{} bytes pushed into a {}-byte uniform", data.len() * 4, location.size);
        }
        self.calls.push(Call::Uniform {
            location: *location,
            data: data.to_vec(),
        });
    }
}

impl RenderingContext for HeadlessContext {
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
        self.store.link_program(program);
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        self.store.program_link_status(program)
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        self.store.program_info_log(program)
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.calls.push(Call::UseProgram(program));
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.store.delete_program(program);
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        self.store.attrib_location(program, name)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformSlot> {
        self.store.uniform_location(program, name)
    }

    fn create_buffer(&mut self) -> BufferId {
        BufferId(self.buffers.insert(Vec::new()))
    }

    fn bind_array_buffer(&mut self, buffer: Option<BufferId>) {
        self.calls.push(Call::BindArrayBuffer(buffer));
    }

    fn array_buffer_data(&mut self, buffer: BufferId, data: &[u8]) {
        if let Some(contents) = self.buffers.get_mut(buffer.0) {
            contents.clear();
            contents.extend_from_slice(data);
        }
        self.calls.push(Call::BufferData {
            buffer,
            bytes: data.len(),
        });
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(buffer.0);
        self.calls.push(Call::DeleteBuffer(buffer));
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        self.calls.push(Call::EnableVertexAttribArray(location));
    }

    fn vertex_attrib_pointer_f32(&mut self, buffer: BufferId, location: u32, pointer: AttribPointer) {
        self.calls.push(Call::VertexAttribPointer {
            buffer,
            location,
            pointer,
        });
    }

    fn uniform_1_f32(&mut self, _program: ProgramId, location: &UniformSlot, x: f32) {
        self.record_uniform(location, &[x]);
    }

    fn uniform_2_f32_slice(&mut self, _program: ProgramId, location: &UniformSlot, v: &[f32; 2]) {
        self.record_uniform(location, v);
    }

    fn uniform_4_f32_slice(&mut self, _program: ProgramId, location: &UniformSlot, v: &[f32; 4]) {
        self.record_uniform(location, v);
    }

    fn uniform_matrix_4_f32_slice(
        &mut self,
        _program: ProgramId,
        location: &UniformSlot,
        transpose: bool,
        m: &[f32; 16],
    ) {
        self.calls.push(Call::UniformMatrix {
            location: *location,
            transpose,
            data: m.to_vec(),
        });
    }

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.calls.push(Call::Viewport {
            x,
            y,
            width,
            height,
        });
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        self.calls.push(Call::ClearColor(rgba));
    }

    fn clear(&mut self) {
        self.calls.push(Call::Clear);
    }

    fn draw_arrays(&mut self, program: ProgramId, mode: Primitive, first: u32, count: u32) {
        self.calls.push(Call::DrawArrays {
            program,
            mode,
            first,
            count,
        });
    }

    fn present(&mut self) -> FrameOutcome {
        self.calls.push(Call::Present);
        self.presents += 1;
        match self.fatal_from {
            Some(nth) if self.presents >= nth => FrameOutcome::Fatal,
            _ => FrameOutcome::Presented,
        }
    }
}
