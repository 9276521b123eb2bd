use std::fmt;

use thiserror::Error;

use super::shader::ShaderKind;

/// Which kind of named shader input failed to resolve.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BindingKind {
    Attribute,
    Uniform,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKind::Attribute => f.write_str("attribute"),
            BindingKind::Uniform => f.write_str("uniform"),
        }
    }
}

/// Errors raised while building the render pipeline.
///
/// Every variant is fatal to initialization. They stem from static inputs
/// (shader text, declared names), so retrying cannot succeed.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("rendering context unavailable: {0}")]
    ContextUnavailable(String),

    #[error("{stage} shader failed to compile:\n{log}")]
    CompileFailure { stage: ShaderKind, log: String },

    #[error("shader program failed to link:\n{log}")]
    LinkFailure { log: String },

    #[error("{kind} `{name}` not found in the linked program")]
    BindingResolutionFailure { kind: BindingKind, name: String },

    #[error("`{operation}` is not allowed while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
}

impl RenderError {
    pub fn context_unavailable<S: Into<String>>(reason: S) -> Self {
        Self::ContextUnavailable(reason.into())
    }

    pub(crate) fn missing(kind: BindingKind, name: &str) -> Self {
        Self::BindingResolutionFailure {
            kind,
            name: name.to_string(),
        }
    }
}
