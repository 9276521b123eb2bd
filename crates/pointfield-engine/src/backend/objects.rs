//! Shader and program objects shared by both backends.

use crate::gfx::ShaderKind;

use super::reflect::{self, ProgramInterface, StageModule};

/// Shader object id.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub(crate) u32);

/// Program object id.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub(crate) u32);

/// Buffer object id.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub(crate) u32);

/// Where a uniform lives: a byte range inside one uniform block of a program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformSlot {
    pub program: ProgramId,
    pub binding: u32,
    pub offset: u32,
    pub size: u32,
}

/// Id-indexed object table. Deleted slots are never reused.
#[derive(Debug)]
pub(crate) struct Slots<T> {
    items: Vec<Option<T>>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Slots<T> {
    pub fn insert(&mut self, item: T) -> u32 {
        self.items.push(Some(item));
        (self.items.len() - 1) as u32
    }

    pub fn get(&self, id: u32) -> Option<&T> {
        self.items.get(id as usize).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut T> {
        self.items.get_mut(id as usize).and_then(Option::as_mut)
    }

    pub fn remove(&mut self, id: u32) -> Option<T> {
        self.items.get_mut(id as usize).and_then(Option::take)
    }

    pub fn live(&self) -> usize {
        self.items.iter().filter(|s| s.is_some()).count()
    }
}

#[derive(Debug)]
struct ShaderObject {
    kind: ShaderKind,
    source: String,
    compiled: Option<StageModule>,
    log: String,
}

#[derive(Debug, Default)]
pub(crate) struct ProgramObject {
    vertex: Option<StageModule>,
    fragment: Option<StageModule>,
    pub interface: Option<ProgramInterface>,
    log: String,
}

impl ProgramObject {
    /// The stage a linked program was built from.
    pub fn stage(&self, kind: ShaderKind) -> Option<&StageModule> {
        match kind {
            ShaderKind::Vertex => self.vertex.as_ref(),
            ShaderKind::Fragment => self.fragment.as_ref(),
        }
    }
}

/// Compile/link state machine for shader and program objects.
///
/// Attaching copies the compiled stage into the program, so a shader may be
/// deleted right after attachment without affecting the link.
#[derive(Debug, Default)]
pub(crate) struct ProgramStore {
    shaders: Slots<ShaderObject>,
    programs: Slots<ProgramObject>,
}

impl ProgramStore {
    pub fn create_shader(&mut self, kind: ShaderKind) -> ShaderId {
        ShaderId(self.shaders.insert(ShaderObject {
            kind,
            source: String::new(),
            compiled: None,
            log: String::new(),
        }))
    }

    pub fn shader_source(&mut self, shader: ShaderId, source: &str) {
        if let Some(obj) = self.shaders.get_mut(shader.0) {
            obj.source = source.to_string();
        }
    }

    pub fn compile_shader(&mut self, shader: ShaderId) {
        let Some(obj) = self.shaders.get_mut(shader.0) else { return };
        match reflect::compile_stage(&obj.source, obj.kind) {
            Ok(stage) => {
                obj.compiled = Some(stage);
                obj.log.clear();
            }
            Err(log) => {
                obj.compiled = None;
                obj.log = log;
            }
        }
    }

    pub fn shader_compile_status(&self, shader: ShaderId) -> bool {
        self.shaders
            .get(shader.0)
            .is_some_and(|obj| obj.compiled.is_some())
    }

    pub fn shader_info_log(&self, shader: ShaderId) -> String {
        self.shaders
            .get(shader.0)
            .map(|obj| obj.log.clone())
            .unwrap_or_default()
    }

    pub fn delete_shader(&mut self, shader: ShaderId) {
        self.shaders.remove(shader.0);
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.live()
    }

    pub fn create_program(&mut self) -> ProgramId {
        ProgramId(self.programs.insert(ProgramObject::default()))
    }

    pub fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        let Some(obj) = self.shaders.get(shader.0) else { return };
        let Some(prog) = self.programs.get_mut(program.0) else { return };

        let stage = obj.compiled.clone();

        match obj.kind {
            ShaderKind::Vertex => prog.vertex = stage,
            ShaderKind::Fragment => prog.fragment = stage,
        }
    }

    pub fn link_program(&mut self, program: ProgramId) {
        let Some(prog) = self.programs.get_mut(program.0) else { return };

        let result = match (&prog.vertex, &prog.fragment) {
            (Some(vs), Some(fs)) => reflect::link_stages(vs, fs),
            (None, _) => Err("error: no compiled vertex shader attached".to_string()),
            (_, None) => Err("error: no compiled fragment shader attached".to_string()),
        };

        match result {
            Ok(interface) => {
                prog.interface = Some(interface);
                prog.log.clear();
            }
            Err(log) => {
                prog.interface = None;
                prog.log = log;
            }
        }
    }

    pub fn program_link_status(&self, program: ProgramId) -> bool {
        self.programs
            .get(program.0)
            .is_some_and(|p| p.interface.is_some())
    }

    pub fn program_info_log(&self, program: ProgramId) -> String {
        self.programs
            .get(program.0)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    pub fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(program.0);
    }

    pub fn live_programs(&self) -> usize {
        self.programs.live()
    }

    pub fn program(&self, program: ProgramId) -> Option<&ProgramObject> {
        self.programs.get(program.0)
    }

    /// Interface of a successfully linked program.
    pub fn interface(&self, program: ProgramId) -> Option<&ProgramInterface> {
        self.programs.get(program.0)?.interface.as_ref()
    }

    pub fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        self.interface(program)?.input(name).map(|i| i.location)
    }

    pub fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformSlot> {
        let field = self.interface(program)?.field(name)?;
        Some(UniformSlot {
            program,
            binding: field.binding,
            offset: field.offset,
            size: field.size,
        })
    }
}
