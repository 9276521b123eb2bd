mod options;
mod viewer;

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use winit::dpi::PhysicalSize;

use pointfield_engine::backend::HeadlessContext;
use pointfield_engine::device::GpuInit;
use pointfield_engine::logging::{init_logging, LoggingConfig};
use pointfield_engine::scene::{shaders, FrameLoop, PointField, SceneConfig, ScriptedHost};
use pointfield_engine::window::{Runtime, RuntimeConfig};

use options::Options;
use viewer::Viewer;

/// Frame size assumed by `--check`.
const CHECK_SIZE: PhysicalSize<u32> = PhysicalSize::new(1280, 720);

/// WGSL sources for the point program.
#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    fn bundled() -> Self {
        Self {
            vertex: shaders::VERTEX_SOURCE.to_string(),
            fragment: shaders::FRAGMENT_SOURCE.to_string(),
        }
    }

    fn load(vertex: &Path, fragment: &Path) -> Result<Self> {
        let read = |path: &Path| {
            fs::read_to_string(path)
                .with_context(|| format!("failed to read shader `{}`", path.display()))
        };
        Ok(Self {
            vertex: read(vertex)?,
            fragment: read(fragment)?,
        })
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let Some(opts) = options::parse(std::env::args().skip(1))? else {
        println!("{}", options::USAGE);
        return Ok(());
    };

    let shaders = match &opts.shaders {
        Some((vertex, fragment)) => ShaderSources::load(vertex, fragment)?,
        None => ShaderSources::bundled(),
    };
    let rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    if opts.check {
        return check(&opts, &shaders, rng);
    }

    let gpu_init = GpuInit {
        // Shader colors are written as-is, without sRGB encoding.
        prefer_srgb: false,
        ..GpuInit::default()
    };
    let viewer = Viewer::new(SceneConfig::default(), shaders, rng);
    Runtime::run(RuntimeConfig::default(), gpu_init, viewer)
}

/// Builds the scene against the recording context and replays a few frames.
fn check(opts: &Options, shaders: &ShaderSources, mut rng: StdRng) -> Result<()> {
    let mut field = PointField::new(HeadlessContext::new(), SceneConfig::default());
    field
        .initialize(&shaders.vertex, &shaders.fragment)
        .context("shader program rejected")?;

    let start = Instant::now();
    field.setup(&mut rng, start)?;

    let mut host = ScriptedHost::new(opts.frames, start, Duration::from_millis(16), CHECK_SIZE);
    let summary = FrameLoop::run(&mut field, &mut host)?;

    log::info!(
        "check passed: {} frame(s) presented, {} skipped, {} commands recorded",
        summary.presented,
        summary.skipped,
        field.context().calls().len()
    );
    Ok(())
}
