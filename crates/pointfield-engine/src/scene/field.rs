use std::time::Instant;

use glam::Mat4;
use rand::Rng;
use winit::dpi::PhysicalSize;

use crate::gfx::{
    compile, generate_disk, link, upload, BindingTable, FrameOutcome, InterleavedVertex, Primitive,
    RenderError, RenderingContext, ShaderInterface, ShaderKind, UniformValue, VertexBuffer,
};
use crate::input::PointerState;
use crate::time::{FrameClock, FrameTime};

use super::config::SceneConfig;
use super::shaders::REFERENCE_INTERFACE;

/// Lifecycle of a [`PointField`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FieldState {
    Uninitialized,
    /// Program linked and bindings resolved; no geometry yet.
    Ready,
    Running,
    Stopped,
}

impl FieldState {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldState::Uninitialized => "uninitialized",
            FieldState::Ready => "ready",
            FieldState::Running => "running",
            FieldState::Stopped => "stopped",
        }
    }
}

/// Program and bindings produced by `initialize`.
struct Linked<C: RenderingContext> {
    program: C::Program,
    bindings: BindingTable<C>,
}

/// The point cloud scene: one program, one interleaved buffer, drawn once per
/// model instance every tick.
///
/// Owns its rendering context for its whole lifetime.
pub struct PointField<C: RenderingContext> {
    ctx: C,
    config: SceneConfig,
    interface: ShaderInterface,
    state: FieldState,
    linked: Option<Linked<C>>,
    buffer: Option<VertexBuffer<C::Buffer>>,
    clock: Option<FrameClock>,
    last_frame: Option<FrameTime>,
    /// Pointer used by the most recent tick; repaints reuse it.
    last_pointer: PointerState,
    repaint_pending: bool,
}

impl<C: RenderingContext> PointField<C> {
    pub fn new(ctx: C, config: SceneConfig) -> Self {
        Self {
            ctx,
            config,
            interface: REFERENCE_INTERFACE,
            state: FieldState::Uninitialized,
            linked: None,
            buffer: None,
            clock: None,
            last_frame: None,
            last_pointer: PointerState::default(),
            repaint_pending: false,
        }
    }

    pub fn state(&self) -> FieldState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == FieldState::Running
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    pub fn program(&self) -> Option<C::Program> {
        self.linked.as_ref().map(|l| l.program)
    }

    pub fn vertex_buffer(&self) -> Option<&VertexBuffer<C::Buffer>> {
        self.buffer.as_ref()
    }

    /// Whether the host should schedule another frame: always while running,
    /// and once after [`invalidate`] or [`regenerate`] while stopped.
    ///
    /// [`invalidate`]: PointField::invalidate
    /// [`regenerate`]: PointField::regenerate
    pub fn needs_frame(&self) -> bool {
        match self.state {
            FieldState::Running => true,
            FieldState::Stopped => self.repaint_pending,
            FieldState::Uninitialized | FieldState::Ready => false,
        }
    }

    /// Marks the presented frame as stale (e.g. the target was resized).
    pub fn invalidate(&mut self) {
        self.repaint_pending = true;
    }

    /// Timing of the most recent tick.
    pub fn last_frame(&self) -> Option<FrameTime> {
        self.last_frame
    }

    fn expect_state(&self, operation: &'static str, allowed: &[FieldState]) -> Result<(), RenderError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(RenderError::InvalidState {
                operation,
                state: self.state.as_str(),
            })
        }
    }

    /// Compiles and links the program and resolves every binding.
    ///
    /// Any failure leaves the field uninitialized with nothing allocated.
    pub fn initialize(&mut self, vertex_src: &str, fragment_src: &str) -> Result<(), RenderError> {
        self.expect_state("initialize", &[FieldState::Uninitialized])?;

        let vs = compile(&mut self.ctx, vertex_src, ShaderKind::Vertex)?;
        let fs = match compile(&mut self.ctx, fragment_src, ShaderKind::Fragment) {
            Ok(fs) => fs,
            Err(e) => {
                self.ctx.delete_shader(vs);
                return Err(e);
            }
        };
        let program = link(&mut self.ctx, vs, fs)?;

        let bindings = match BindingTable::resolve(&self.ctx, program, &self.interface) {
            Ok(table) => table,
            Err(e) => {
                log::error!("{e}");
                self.ctx.delete_program(program);
                return Err(e);
            }
        };

        self.linked = Some(Linked { program, bindings });
        self.state = FieldState::Ready;
        log::info!("point field initialized");
        Ok(())
    }

    /// Uploads the cloud and starts the clock at `now`.
    ///
    /// Only valid once, right after `initialize`; use [`regenerate`] to
    /// replace the geometry later.
    ///
    /// [`regenerate`]: PointField::regenerate
    pub fn setup<R: Rng>(&mut self, rng: &mut R, now: Instant) -> Result<(), RenderError> {
        self.expect_state("setup", &[FieldState::Ready])?;

        self.ctx.clear_color(self.config.clear_color);
        self.clock = Some(FrameClock::starting_at(now));

        let vertices = self.generate(rng);
        self.buffer = Some(upload(&mut self.ctx, &vertices));

        self.state = FieldState::Running;
        log::info!("point field running with {} points", vertices.len());
        Ok(())
    }

    /// Replaces the cloud with a freshly generated one.
    ///
    /// The new buffer is uploaded before the old one is deleted.
    pub fn regenerate<R: Rng>(&mut self, rng: &mut R) -> Result<(), RenderError> {
        self.expect_state("regenerate", &[FieldState::Running, FieldState::Stopped])?;

        let vertices = self.generate(rng);
        let fresh = upload(&mut self.ctx, &vertices);
        if let Some(old) = self.buffer.replace(fresh) {
            self.ctx.delete_buffer(old.handle);
        }
        self.repaint_pending = true;
        log::debug!("point cloud regenerated");
        Ok(())
    }

    fn generate<R: Rng>(&self, rng: &mut R) -> Vec<InterleavedVertex> {
        generate_disk(
            self.config.point_count,
            self.config.radius,
            self.config.point_color,
            rng,
        )
    }

    /// Stops the frame loop. The tick in progress, if any, has already completed.
    pub fn stop(&mut self) -> Result<(), RenderError> {
        self.expect_state("stop", &[FieldState::Running])?;
        self.state = FieldState::Stopped;
        self.repaint_pending = false;
        log::info!("point field stopped");
        Ok(())
    }

    /// Draws one frame: every instance renders the whole cloud once.
    ///
    /// A zero-sized target (minimized window) skips the tick without
    /// advancing the clock. A fatal presentation failure stops the field;
    /// other outcomes are reported and the field keeps running.
    pub fn tick(
        &mut self,
        now: Instant,
        size: PhysicalSize<u32>,
        pointer: &PointerState,
    ) -> Result<FrameOutcome, RenderError> {
        self.expect_state("tick", &[FieldState::Running])?;
        if size.width == 0 || size.height == 0 {
            log::trace!("zero-sized target; tick skipped");
            return Ok(FrameOutcome::Skipped);
        }

        let Some(clock) = self.clock.as_mut() else {
            return Err(RenderError::InvalidState {
                operation: "tick",
                state: self.state.as_str(),
            });
        };

        let time = clock.tick_at(now);
        self.last_frame = Some(time);
        self.last_pointer = *pointer;
        log::trace!(
            "frame {} at {:.3}s (dt {:.4}s)",
            time.frame_index,
            time.elapsed,
            time.dt
        );

        self.draw(size, pointer)
    }

    /// Redraws the current cloud with the last tick's pointer, without
    /// advancing the clock. Works while stopped.
    pub fn repaint(&mut self, size: PhysicalSize<u32>) -> Result<FrameOutcome, RenderError> {
        self.expect_state("repaint", &[FieldState::Running, FieldState::Stopped])?;
        if size.width == 0 || size.height == 0 {
            return Ok(FrameOutcome::Skipped);
        }

        let pointer = self.last_pointer;
        let outcome = self.draw(size, &pointer)?;
        if outcome == FrameOutcome::Presented {
            self.repaint_pending = false;
        }
        Ok(outcome)
    }

    fn draw(&mut self, size: PhysicalSize<u32>, pointer: &PointerState) -> Result<FrameOutcome, RenderError> {
        let (Some(linked), Some(buffer)) = (self.linked.as_ref(), self.buffer.as_ref()) else {
            return Err(RenderError::InvalidState {
                operation: "draw",
                state: self.state.as_str(),
            });
        };

        let ctx = &mut self.ctx;
        let program = linked.program;

        ctx.viewport(0, 0, size.width, size.height);
        ctx.clear();
        ctx.use_program(Some(program));
        linked.bindings.bind(ctx, buffer);

        let resolution = [size.width as f32, size.height as f32];
        let base = Mat4::IDENTITY;

        for instance in &self.config.instances {
            let values = [
                UniformValue::Vec4(self.config.flat_color),
                UniformValue::Vec2(resolution),
                UniformValue::Vec2(pointer.mouse_uniform()),
                UniformValue::Scalar(pointer.client_x),
                UniformValue::Mat4(instance.model_matrix(base)),
                UniformValue::Scalar(instance.flag),
            ];
            linked.bindings.push_uniforms(ctx, program, &values);
            ctx.draw_arrays(program, Primitive::Points, 0, buffer.vertex_count);
        }

        let outcome = ctx.present();
        match outcome {
            FrameOutcome::Presented => {}
            FrameOutcome::Skipped => log::debug!("frame skipped"),
            FrameOutcome::Fatal => {
                log::error!("presentation failed fatally; stopping");
                self.state = FieldState::Stopped;
                self.repaint_pending = false;
            }
        }
        Ok(outcome)
    }
}
