use std::time::Instant;

use rand::rngs::StdRng;

use pointfield_engine::backend::WgpuContext;
use pointfield_engine::core::{App, AppControl, FrameCtx};
use pointfield_engine::gfx::FrameOutcome;
use pointfield_engine::input::{InputEvent, Key};
use pointfield_engine::scene::{PointField, SceneConfig};
use winit::dpi::PhysicalSize;

use crate::ShaderSources;

/// Windowed front end: owns the point field once the GPU is up.
pub struct Viewer {
    config: SceneConfig,
    shaders: ShaderSources,
    rng: StdRng,
    field: Option<PointField<WgpuContext>>,
}

impl Viewer {
    pub fn new(config: SceneConfig, shaders: ShaderSources, rng: StdRng) -> Self {
        Self {
            config,
            shaders,
            rng,
            field: None,
        }
    }
}

impl App for Viewer {
    fn on_ready(&mut self, ctx: WgpuContext) -> anyhow::Result<()> {
        let mut field = PointField::new(ctx, self.config.clone());
        field.initialize(&self.shaders.vertex, &self.shaders.fragment)?;
        field.setup(&mut self.rng, Instant::now())?;
        self.field = Some(field);
        Ok(())
    }

    fn on_input(&mut self, event: &InputEvent) -> AppControl {
        if event.is_press(Key::Escape) {
            return AppControl::Exit;
        }

        let Some(field) = self.field.as_mut() else {
            return AppControl::Continue;
        };

        if event.is_press(Key::R) {
            if let Err(e) = field.regenerate(&mut self.rng) {
                log::warn!("{e}");
            }
        } else if event.is_press(Key::Space) && field.is_running() {
            if let Err(e) = field.stop() {
                log::warn!("{e}");
            }
        }

        AppControl::Continue
    }

    fn on_resize(&mut self, size: PhysicalSize<u32>) {
        if let Some(field) = self.field.as_mut() {
            field.context_mut().resize(size);
            field.invalidate();
        }
    }

    fn wants_redraw(&self) -> bool {
        self.field.as_ref().is_some_and(|field| {
            let size = field.context().size();
            field.needs_frame() && size.width > 0 && size.height > 0
        })
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let Some(field) = self.field.as_mut() else {
            return AppControl::Continue;
        };

        let size = field.context().size();
        let result = if field.is_running() {
            field.tick(ctx.now, size, ctx.pointer)
        } else if field.needs_frame() {
            // Stopped: redraw the frozen frame after a resize or regenerate.
            field.repaint(size)
        } else {
            return AppControl::Continue;
        };

        match result {
            Ok(FrameOutcome::Fatal) => AppControl::Exit,
            Ok(_) => AppControl::Continue,
            Err(e) => {
                log::error!("{e}");
                AppControl::Exit
            }
        }
    }
}
