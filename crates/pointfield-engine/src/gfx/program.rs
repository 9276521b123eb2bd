use super::context::RenderingContext;
use super::error::{BindingKind, RenderError};

/// Links a vertex/fragment pair into a program and makes it current.
///
/// Both stages are released afterwards, whether or not linking succeeded;
/// the program keeps what it needs.
pub fn link<C: RenderingContext>(
    ctx: &mut C,
    vertex: C::Shader,
    fragment: C::Shader,
) -> Result<C::Program, RenderError> {
    let program = ctx.create_program();
    ctx.attach_shader(program, vertex);
    ctx.attach_shader(program, fragment);
    ctx.link_program(program);

    ctx.delete_shader(vertex);
    ctx.delete_shader(fragment);

    if !ctx.program_link_status(program) {
        let log = ctx.program_info_log(program);
        ctx.delete_program(program);
        log::error!("shader program failed to link:\n{log}");
        return Err(RenderError::LinkFailure { log });
    }

    ctx.use_program(Some(program));
    log::debug!("shader program linked: {program:?}");

    Ok(program)
}

/// Resolves a vertex input by name.
pub fn resolve_attribute<C: RenderingContext>(
    ctx: &C,
    program: C::Program,
    name: &str,
) -> Result<u32, RenderError> {
    ctx.attrib_location(program, name)
        .ok_or_else(|| RenderError::missing(BindingKind::Attribute, name))
}

/// Resolves a uniform by name.
pub fn resolve_uniform<C: RenderingContext>(
    ctx: &C,
    program: C::Program,
    name: &str,
) -> Result<C::UniformLocation, RenderError> {
    ctx.uniform_location(program, name)
        .ok_or_else(|| RenderError::missing(BindingKind::Uniform, name))
}
