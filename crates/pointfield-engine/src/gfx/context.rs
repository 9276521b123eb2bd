use std::fmt::Debug;

use super::shader::ShaderKind;

/// Primitive assembly mode for a draw call.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Primitive {
    Points,
}

/// Layout of one float attribute inside a bound vertex buffer.
///
/// `stride` and `offset` are in bytes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AttribPointer {
    pub components: u32,
    pub normalized: bool,
    pub stride: u32,
    pub offset: u32,
}

/// Result of presenting a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    /// The frame reached the screen (or the recording).
    Presented,
    /// The frame was dropped; rendering may continue next tick.
    Skipped,
    /// The context cannot render any more frames.
    Fatal,
}

/// The graphics API surface consumed by the renderer.
///
/// The shape follows the classic shader/program/buffer object model.
/// Operations that act on a program or buffer take it as an explicit
/// argument instead of relying on whatever happens to be bound.
///
/// Handles are small `Copy` ids owned by the context; deleting one makes
/// later use of that id a no-op.
pub trait RenderingContext {
    type Shader: Copy + Debug;
    type Program: Copy + Debug;
    type Buffer: Copy + Debug;
    type UniformLocation: Clone + Debug;

    // ── shaders ──────────────────────────────────────────────────────────

    fn create_shader(&mut self, kind: ShaderKind) -> Self::Shader;
    fn shader_source(&mut self, shader: Self::Shader, source: &str);
    fn compile_shader(&mut self, shader: Self::Shader);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&mut self, shader: Self::Shader);

    // ── programs ─────────────────────────────────────────────────────────

    fn create_program(&mut self) -> Self::Program;
    fn attach_shader(&mut self, program: Self::Program, shader: Self::Shader);
    fn link_program(&mut self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn use_program(&mut self, program: Option<Self::Program>);
    fn delete_program(&mut self, program: Self::Program);

    /// Location of a vertex input, or `None` if the program has no such input.
    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;

    /// Location of a uniform, or `None` if the program has no such uniform.
    fn uniform_location(&self, program: Self::Program, name: &str)
    -> Option<Self::UniformLocation>;

    // ── buffers & vertex state ───────────────────────────────────────────

    fn create_buffer(&mut self) -> Self::Buffer;
    fn bind_array_buffer(&mut self, buffer: Option<Self::Buffer>);
    /// Replaces the buffer's contents. Uploads are static: written once, drawn many times.
    fn array_buffer_data(&mut self, buffer: Self::Buffer, data: &[u8]);
    fn delete_buffer(&mut self, buffer: Self::Buffer);
    fn enable_vertex_attrib_array(&mut self, location: u32);
    fn vertex_attrib_pointer_f32(
        &mut self,
        buffer: Self::Buffer,
        location: u32,
        pointer: AttribPointer,
    );

    // ── uniforms ─────────────────────────────────────────────────────────

    fn uniform_1_f32(&mut self, program: Self::Program, location: &Self::UniformLocation, x: f32);
    fn uniform_2_f32_slice(
        &mut self,
        program: Self::Program,
        location: &Self::UniformLocation,
        v: &[f32; 2],
    );
    fn uniform_4_f32_slice(
        &mut self,
        program: Self::Program,
        location: &Self::UniformLocation,
        v: &[f32; 4],
    );
    fn uniform_matrix_4_f32_slice(
        &mut self,
        program: Self::Program,
        location: &Self::UniformLocation,
        transpose: bool,
        m: &[f32; 16],
    );

    // ── frame ────────────────────────────────────────────────────────────

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32);
    fn clear_color(&mut self, rgba: [f32; 4]);
    /// Clears the color buffer with the current clear color.
    fn clear(&mut self);
    fn draw_arrays(&mut self, program: Self::Program, mode: Primitive, first: u32, count: u32);

    /// Finishes the frame started by the first command after the previous present.
    fn present(&mut self) -> FrameOutcome;
}
