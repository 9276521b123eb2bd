use std::fmt;

use super::context::RenderingContext;
use super::error::RenderError;

/// Pipeline stage a shader is compiled for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderKind::Vertex => f.write_str("vertex"),
            ShaderKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Compiles one shader stage.
///
/// On failure the stage object is released and the context's info log is
/// returned inside [`RenderError::CompileFailure`].
pub fn compile<C: RenderingContext>(
    ctx: &mut C,
    source: &str,
    kind: ShaderKind,
) -> Result<C::Shader, RenderError> {
    let shader = ctx.create_shader(kind);
    ctx.shader_source(shader, source);
    ctx.compile_shader(shader);

    if ctx.shader_compile_status(shader) {
        log::debug!("{kind} shader compiled ({} bytes of source)", source.len());
        return Ok(shader);
    }

    let log = ctx.shader_info_log(shader);
    ctx.delete_shader(shader);
    log::error!("{kind} shader failed to compile:\n{log}");

    Err(RenderError::CompileFailure { stage: kind, log })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessContext;
    use crate::scene::shaders;

    #[test]
    fn compiles_reference_vertex_stage() {
        let mut ctx = HeadlessContext::new();
        assert!(compile(&mut ctx, shaders::VERTEX_SOURCE, ShaderKind::Vertex).is_ok());
    }

    #[test]
    fn compiles_reference_fragment_stage() {
        let mut ctx = HeadlessContext::new();
        assert!(compile(&mut ctx, shaders::FRAGMENT_SOURCE, ShaderKind::Fragment).is_ok());
    }

    #[test]
    fn syntax_error_surfaces_log() {
        let mut ctx = HeadlessContext::new();
        let err = compile(&mut ctx, "@vertex fn vs_main( {", ShaderKind::Vertex).unwrap_err();
        match err {
            RenderError::CompileFailure { stage, log } => {
                assert_eq!(stage, ShaderKind::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn source_without_matching_entry_point_is_rejected() {
        // A fragment-only module cannot serve as the vertex stage.
        let mut ctx = HeadlessContext::new();
        let err = compile(&mut ctx, shaders::FRAGMENT_SOURCE, ShaderKind::Vertex).unwrap_err();
        assert!(matches!(err, RenderError::CompileFailure { stage: ShaderKind::Vertex, .. }));
    }

    #[test]
    fn failed_stage_is_released() {
        let mut ctx = HeadlessContext::new();
        let _ = compile(&mut ctx, "not wgsl", ShaderKind::Fragment);
        assert_eq!(ctx.live_shaders(), 0);
    }
}
