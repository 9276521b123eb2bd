use std::time::{Duration, Instant};

use glam::Mat4;
use rand::rngs::StdRng;
use rand::SeedableRng;
use winit::dpi::PhysicalSize;

use super::*;
use crate::backend::{Call, HeadlessContext, ProgramId};
use crate::gfx::{FrameOutcome, Primitive, RenderError};
use crate::input::PointerState;

const SIZE: PhysicalSize<u32> = PhysicalSize::new(800, 600);

fn running_field(rng: &mut StdRng, start: Instant) -> PointField<HeadlessContext> {
    running_field_on(HeadlessContext::new(), rng, start)
}

fn running_field_on(ctx: HeadlessContext, rng: &mut StdRng, start: Instant) -> PointField<HeadlessContext> {
    let mut field = PointField::new(ctx, SceneConfig::default());
    field
        .initialize(shaders::VERTEX_SOURCE, shaders::FRAGMENT_SOURCE)
        .unwrap();
    field.setup(rng, start).unwrap();
    field
}

fn draws(calls: &[Call]) -> Vec<(ProgramId, Primitive, u32, u32)> {
    calls
        .iter()
        .filter_map(|c| match c {
            Call::DrawArrays { program, mode, first, count } => Some((*program, *mode, *first, *count)),
            _ => None,
        })
        .collect()
}

/// `(uniform byte offset, data)` for every scalar/vector push, in order.
fn pushes_at(calls: &[Call], offset: u32) -> Vec<Vec<f32>> {
    calls
        .iter()
        .filter_map(|c| match c {
            Call::Uniform { location, data } if location.offset == offset => Some(data.clone()),
            _ => None,
        })
        .collect()
}

// ── lifecycle ─────────────────────────────────────────────────────────────

#[test]
fn walks_through_every_state() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut field = PointField::new(HeadlessContext::new(), SceneConfig::default());
    assert_eq!(field.state(), FieldState::Uninitialized);

    field
        .initialize(shaders::VERTEX_SOURCE, shaders::FRAGMENT_SOURCE)
        .unwrap();
    assert_eq!(field.state(), FieldState::Ready);

    field.setup(&mut rng, Instant::now()).unwrap();
    assert_eq!(field.state(), FieldState::Running);

    field.stop().unwrap();
    assert_eq!(field.state(), FieldState::Stopped);
}

#[test]
fn tick_before_setup_is_rejected() {
    let mut field = PointField::new(HeadlessContext::new(), SceneConfig::default());
    field
        .initialize(shaders::VERTEX_SOURCE, shaders::FRAGMENT_SOURCE)
        .unwrap();

    let err = field
        .tick(Instant::now(), SIZE, &PointerState::default())
        .unwrap_err();
    assert!(matches!(err, RenderError::InvalidState { operation: "tick", state: "ready" }));
}

#[test]
fn second_setup_is_rejected() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut field = running_field(&mut rng, Instant::now());

    let err = field.setup(&mut rng, Instant::now()).unwrap_err();
    assert!(matches!(err, RenderError::InvalidState { operation: "setup", state: "running" }));
    assert_eq!(field.context().live_buffers(), 1);
}

#[test]
fn second_initialize_is_rejected() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut field = running_field(&mut rng, Instant::now());
    let err = field
        .initialize(shaders::VERTEX_SOURCE, shaders::FRAGMENT_SOURCE)
        .unwrap_err();
    assert!(matches!(err, RenderError::InvalidState { operation: "initialize", .. }));
    assert_eq!(field.context().live_programs(), 1);
}

#[test]
fn compile_failure_aborts_without_leaks() {
    let mut field = PointField::new(HeadlessContext::new(), SceneConfig::default());
    let err = field
        .initialize(shaders::VERTEX_SOURCE, "@fragment fn broken(")
        .unwrap_err();

    assert!(matches!(err, RenderError::CompileFailure { .. }));
    assert_eq!(field.state(), FieldState::Uninitialized);
    assert_eq!(field.context().live_shaders(), 0);
    assert_eq!(field.context().live_programs(), 0);
}

#[test]
fn missing_binding_releases_the_program() {
    const VS: &str = r#"
        @vertex
        fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
            return vec4<f32>(position, 1.0);
        }
    "#;
    const FS: &str = r#"
        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return vec4<f32>(1.0);
        }
    "#;

    let mut field = PointField::new(HeadlessContext::new(), SceneConfig::default());
    let err = field.initialize(VS, FS).unwrap_err();

    match err {
        RenderError::BindingResolutionFailure { name, .. } => assert_eq!(name, "color"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(field.context().live_programs(), 0);
    assert_eq!(field.state(), FieldState::Uninitialized);
}

#[test]
fn regenerate_replaces_the_buffer_without_leaking() {
    let mut rng = StdRng::seed_from_u64(4);
    let mut field = running_field(&mut rng, Instant::now());
    let before = field.vertex_buffer().unwrap().handle;

    field.context_mut().clear_calls();
    field.regenerate(&mut rng).unwrap();
    let after = field.vertex_buffer().unwrap().handle;

    assert_ne!(before, after);
    assert_eq!(field.context().live_buffers(), 1);
    assert!(field.context().buffer_contents(before).is_none());

    // Upload first, delete second.
    let calls = field.context().calls();
    let upload = calls
        .iter()
        .position(|c| matches!(c, Call::BufferData { buffer, .. } if *buffer == after));
    let delete = calls.iter().position(|c| *c == Call::DeleteBuffer(before));
    assert!(upload.unwrap() < delete.unwrap());
}

// ── frame ─────────────────────────────────────────────────────────────────

#[test]
fn one_tick_clears_binds_once_and_draws_four_times() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut field = running_field(&mut rng, Instant::now());
    let program = field.program().unwrap();
    let buffer = field.vertex_buffer().unwrap().handle;

    field.context_mut().clear_calls();
    let outcome = field
        .tick(Instant::now(), SIZE, &PointerState::default())
        .unwrap();
    assert_eq!(outcome, FrameOutcome::Presented);

    let calls = field.context().calls();
    assert_eq!(calls[0], Call::Viewport { x: 0, y: 0, width: 800, height: 600 });
    assert_eq!(calls[1], Call::Clear);
    assert_eq!(calls[2], Call::UseProgram(Some(program)));

    assert_eq!(calls.iter().filter(|c| **c == Call::Clear).count(), 1);
    assert_eq!(
        calls
            .iter()
            .filter(|c| **c == Call::BindArrayBuffer(Some(buffer)))
            .count(),
        1
    );
    assert_eq!(draws(calls), vec![(program, Primitive::Points, 0, 10_000); 4]);
    assert_eq!(calls.last(), Some(&Call::Present));
}

#[test]
fn each_draw_is_preceded_by_its_uniforms() {
    let mut rng = StdRng::seed_from_u64(6);
    let mut field = running_field(&mut rng, Instant::now());

    field.context_mut().clear_calls();
    field
        .tick(Instant::now(), SIZE, &PointerState::default())
        .unwrap();

    // viewport, clear, use, bind + 2×(enable, pointer), then 4×(6 pushes + draw), present
    let calls = field.context().calls();
    let body = &calls[8..calls.len() - 1];
    assert_eq!(body.len(), 4 * 7);
    for chunk in body.chunks(7) {
        assert!(matches!(chunk[4], Call::UniformMatrix { transpose: false, .. }));
        assert!(matches!(chunk[6], Call::DrawArrays { .. }));
    }
}

#[test]
fn flags_and_matrices_follow_the_instance_list() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut field = running_field(&mut rng, Instant::now());

    field.context_mut().clear_calls();
    field
        .tick(Instant::now(), SIZE, &PointerState::default())
        .unwrap();
    let calls = field.context().calls();

    // uFlag lives at byte 112 of the uniform block.
    assert_eq!(pushes_at(calls, 112), vec![vec![0.0], vec![1.0], vec![1.0], vec![1.0]]);

    let matrices: Vec<Vec<f32>> = calls
        .iter()
        .filter_map(|c| match c {
            Call::UniformMatrix { data, .. } => Some(data.clone()),
            _ => None,
        })
        .collect();
    let expected: Vec<Vec<f32>> = REFERENCE_INSTANCES
        .iter()
        .map(|i| i.model_matrix(Mat4::IDENTITY).to_vec())
        .collect();
    assert_eq!(matrices, expected);
}

#[test]
fn pointer_and_window_feed_the_uniforms() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut field = running_field(&mut rng, Instant::now());
    let pointer = PointerState::from_client(600.0, 150.0, 800.0, 600.0);

    field.context_mut().clear_calls();
    field.tick(Instant::now(), SIZE, &pointer).unwrap();
    let calls = field.context().calls();

    assert_eq!(pushes_at(calls, 0)[0], [0.1, 1.0, 0.5, 1.0]);
    assert_eq!(pushes_at(calls, 16)[0], [800.0, 600.0]);
    // Screen y grows downwards; uMouse flips it.
    assert_eq!(pushes_at(calls, 24)[0], [0.5, 0.5]);
    assert_eq!(pushes_at(calls, 32)[0], [0.75]);
}

#[test]
fn elapsed_time_is_measured_from_setup() {
    let mut rng = StdRng::seed_from_u64(9);
    let start = Instant::now();
    let mut field = running_field(&mut rng, start);

    field
        .tick(start + Duration::from_millis(1500), SIZE, &PointerState::default())
        .unwrap();
    let time = field.last_frame().unwrap();
    assert!((time.elapsed - 1.5).abs() < 1e-6);
    assert_eq!(time.frame_index, 0);
}

#[test]
fn setup_sets_the_clear_color_once() {
    let mut rng = StdRng::seed_from_u64(10);
    let field = running_field(&mut rng, Instant::now());
    let colors: Vec<_> = field
        .context()
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::ClearColor(_)))
        .collect();
    assert_eq!(colors, [&Call::ClearColor([0.9135, 0.9135, 0.9035, 1.0])]);
}

#[test]
fn zero_sized_target_skips_without_drawing() {
    let mut rng = StdRng::seed_from_u64(13);
    let mut field = running_field(&mut rng, Instant::now());

    field.context_mut().clear_calls();
    let outcome = field
        .tick(Instant::now(), PhysicalSize::new(0, 0), &PointerState::default())
        .unwrap();

    assert_eq!(outcome, FrameOutcome::Skipped);
    assert!(field.context().calls().is_empty());
    assert!(field.last_frame().is_none());
    assert!(field.is_running());
}

// ── repaint ───────────────────────────────────────────────────────────────

#[test]
fn stopped_field_asks_for_no_frames_until_invalidated() {
    let mut rng = StdRng::seed_from_u64(14);
    let mut field = running_field(&mut rng, Instant::now());
    assert!(field.needs_frame());

    field.stop().unwrap();
    assert!(!field.needs_frame());

    field.invalidate();
    assert!(field.needs_frame());

    field.context_mut().clear_calls();
    assert_eq!(field.repaint(SIZE).unwrap(), FrameOutcome::Presented);
    assert_eq!(draws(field.context().calls()).len(), 4);
    assert!(!field.needs_frame());
    assert_eq!(field.state(), FieldState::Stopped);
}

#[test]
fn regenerate_after_stop_repaints_the_new_cloud_once() {
    let mut rng = StdRng::seed_from_u64(15);
    let start = Instant::now();
    let mut field = running_field(&mut rng, start);
    field.tick(start, SIZE, &PointerState::default()).unwrap();
    field.stop().unwrap();

    field.regenerate(&mut rng).unwrap();
    assert!(field.needs_frame());

    field.context_mut().clear_calls();
    field.repaint(SIZE).unwrap();
    let calls = field.context().calls();
    let fresh = field.vertex_buffer().unwrap().handle;

    assert!(calls.contains(&Call::BindArrayBuffer(Some(fresh))));
    assert_eq!(draws(calls).len(), 4);
    assert_eq!(calls.last(), Some(&Call::Present));
    assert!(!field.needs_frame());
}

#[test]
fn repaint_reuses_the_last_pointer_and_keeps_the_clock() {
    let mut rng = StdRng::seed_from_u64(16);
    let start = Instant::now();
    let mut field = running_field(&mut rng, start);
    let pointer = PointerState::from_client(600.0, 150.0, 800.0, 600.0);

    field
        .tick(start + Duration::from_millis(500), SIZE, &pointer)
        .unwrap();
    field.stop().unwrap();
    let before = field.last_frame().unwrap();

    field.context_mut().clear_calls();
    field.repaint(PhysicalSize::new(1024, 768)).unwrap();
    let calls = field.context().calls();

    assert_eq!(pushes_at(calls, 16)[0], [1024.0, 768.0]);
    assert_eq!(pushes_at(calls, 24)[0], [0.5, 0.5]);
    let after = field.last_frame().unwrap();
    assert_eq!(after.frame_index, before.frame_index);
    assert_eq!(after.elapsed, before.elapsed);
}

#[test]
fn repaint_before_setup_is_rejected() {
    let mut field = PointField::new(HeadlessContext::new(), SceneConfig::default());
    field
        .initialize(shaders::VERTEX_SOURCE, shaders::FRAGMENT_SOURCE)
        .unwrap();

    let err = field.repaint(SIZE).unwrap_err();
    assert!(matches!(
        err,
        RenderError::InvalidState { operation: "repaint", state: "ready" }
    ));
    assert!(!field.needs_frame());
}

// ── frame loop ────────────────────────────────────────────────────────────

#[test]
fn frame_loop_runs_until_the_host_is_exhausted() {
    let mut rng = StdRng::seed_from_u64(11);
    let start = Instant::now();
    let mut field = running_field(&mut rng, start);
    let mut host = ScriptedHost::new(3, start, Duration::from_millis(16), SIZE);

    field.context_mut().clear_calls();
    let summary = FrameLoop::run(&mut field, &mut host).unwrap();

    assert_eq!(summary, LoopSummary { presented: 3, skipped: 0 });
    assert_eq!(draws(field.context().calls()).len(), 12);
    assert!(field.is_running());
    assert_eq!(field.last_frame().map(|t| t.frame_index), Some(2));
}

/// Offers frames forever and counts completed ticks.
#[derive(Default)]
struct Endless {
    completed: u32,
}

impl FrameHost for Endless {
    fn next_frame(&mut self) -> Option<FrameInput> {
        Some(FrameInput {
            now: Instant::now(),
            size: SIZE,
            pointer: PointerState::default(),
        })
    }

    fn frame_done(&mut self, _outcome: FrameOutcome) {
        self.completed += 1;
    }
}

#[test]
fn frame_loop_does_nothing_once_stopped() {
    let mut rng = StdRng::seed_from_u64(12);
    let mut field = running_field(&mut rng, Instant::now());
    field.stop().unwrap();

    let mut host = Endless::default();
    let summary = FrameLoop::run(&mut field, &mut host).unwrap();
    assert_eq!(summary, LoopSummary::default());
    assert_eq!(host.completed, 0);
}

#[test]
fn fatal_present_stops_the_loop_after_that_tick() {
    let mut rng = StdRng::seed_from_u64(17);
    let ctx = HeadlessContext::new().with_fatal_present(2);
    let mut field = running_field_on(ctx, &mut rng, Instant::now());

    field.context_mut().clear_calls();
    let mut host = Endless::default();
    let summary = FrameLoop::run(&mut field, &mut host).unwrap();

    assert_eq!(summary, LoopSummary { presented: 1, skipped: 0 });
    assert_eq!(host.completed, 2);
    let calls = field.context().calls();
    // The failing tick still issued all of its draws.
    assert_eq!(draws(calls).len(), 8);
    assert_eq!(calls.last(), Some(&Call::Present));
    assert_eq!(field.state(), FieldState::Stopped);
    assert!(!field.needs_frame());
}

#[test]
fn scripted_pointer_is_seen_by_every_frame() {
    let mut rng = StdRng::seed_from_u64(18);
    let start = Instant::now();
    let mut field = running_field(&mut rng, start);
    let pointer = PointerState::from_client(600.0, 150.0, 800.0, 600.0);
    let mut host = ScriptedHost::new(2, start, Duration::from_millis(16), SIZE).with_pointer(pointer);

    field.context_mut().clear_calls();
    FrameLoop::run(&mut field, &mut host).unwrap();

    let mouse = pushes_at(field.context().calls(), 24);
    assert_eq!(mouse.len(), 8);
    assert!(mouse.iter().all(|m| *m == [0.5, 0.5]));
}
