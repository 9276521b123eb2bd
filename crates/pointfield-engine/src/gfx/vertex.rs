use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use rand::Rng;

use super::binding::AttributeSpec;
use super::context::RenderingContext;

/// One point of the cloud: position followed by color.
///
/// Layout (28 bytes):
///
///  offset  0  position  [f32; 3]
///  offset 12  color     [f32; 4]
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InterleavedVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl InterleavedVertex {
    /// Attribute order and widths, matching the field order above.
    pub const ATTRIBUTES: [AttributeSpec; 2] = [
        AttributeSpec::new("position", 3),
        AttributeSpec::new("color", 4),
    ];

    pub const FLOATS: usize = 7;
    pub const STRIDE: u32 = std::mem::size_of::<InterleavedVertex>() as u32;
}

/// A vertex buffer living in the rendering context.
#[derive(Debug, Copy, Clone)]
pub struct VertexBuffer<B> {
    pub handle: B,
    pub vertex_count: u32,
}

/// Scatters `count` points uniformly over a disk centred on the origin.
///
/// The radius is drawn as `sqrt(u)` so density is uniform per unit area
/// rather than per unit radius.
pub fn generate_disk<R: Rng>(
    count: usize,
    radius: f32,
    color: [f32; 4],
    rng: &mut R,
) -> Vec<InterleavedVertex> {
    (0..count)
        .map(|_| {
            let angle = sample_angle(rng);
            let r = rng.random::<f32>().sqrt();
            InterleavedVertex {
                position: [r * radius * angle.cos(), r * radius * angle.sin(), 0.0],
                color,
            }
        })
        .collect()
}

/// Angle in `[0, TAU)`. A unit float never reaches 1, and the product rounds
/// below `TAU`.
fn sample_angle<R: Rng>(rng: &mut R) -> f32 {
    rng.random::<f32>() * TAU
}

/// Uploads vertices as one static interleaved buffer.
///
/// The array-buffer binding point is reset afterwards.
pub fn upload<C: RenderingContext>(
    ctx: &mut C,
    vertices: &[InterleavedVertex],
) -> VertexBuffer<C::Buffer> {
    let handle = ctx.create_buffer();
    ctx.bind_array_buffer(Some(handle));
    ctx.array_buffer_data(handle, bytemuck::cast_slice(vertices));
    ctx.bind_array_buffer(None);

    log::debug!(
        "uploaded {} vertices ({} bytes) to {handle:?}",
        vertices.len(),
        std::mem::size_of_val(vertices)
    );

    VertexBuffer {
        handle,
        vertex_count: vertices.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Call, HeadlessContext};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const INK: [f32; 4] = [0.02, 0.032, 0.11, 1.0];

    fn cloud(n: usize) -> Vec<InterleavedVertex> {
        let mut rng = StdRng::seed_from_u64(7);
        generate_disk(n, 0.5, INK, &mut rng)
    }

    // ── generation ────────────────────────────────────────────────────────

    #[test]
    fn points_stay_inside_the_disk() {
        for v in cloud(10_000) {
            let [x, y, z] = v.position;
            assert!((x * x + y * y).sqrt() <= 0.5 + 1e-6);
            assert_eq!(z, 0.0);
            assert_eq!(v.color, INK);
        }
    }

    #[test]
    fn squared_radius_is_uniform() {
        // Area-uniform sampling makes r² uniform on [0, 0.25).
        const BINS: usize = 10;
        let n = 20_000;
        let mut hist = [0usize; BINS];
        for v in cloud(n) {
            let [x, y, _] = v.position;
            let t = (x * x + y * y) / 0.25;
            hist[((t * BINS as f32) as usize).min(BINS - 1)] += 1;
        }

        let expected = n as f32 / BINS as f32;
        for count in hist {
            assert!((count as f32 - expected).abs() < expected * 0.1, "{hist:?}");
        }
    }

    #[test]
    fn angles_cover_every_quadrant() {
        let mut quadrants = [0usize; 4];
        for v in cloud(4_000) {
            let [x, y, _] = v.position;
            let q = match (x >= 0.0, y >= 0.0) {
                (true, true) => 0,
                (false, true) => 1,
                (false, false) => 2,
                (true, false) => 3,
            };
            quadrants[q] += 1;
        }
        for count in quadrants {
            assert!(count > 800, "{quadrants:?}");
        }
    }

    /// Yields all-ones bits: the largest value every sampler can draw.
    struct Saturated;

    impl rand::RngCore for Saturated {
        fn next_u32(&mut self) -> u32 {
            u32::MAX
        }

        fn next_u64(&mut self) -> u64 {
            u64::MAX
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0xff);
        }
    }

    #[test]
    fn angle_stays_below_a_full_turn() {
        let angle = sample_angle(&mut Saturated);
        assert!(angle < TAU, "{angle}");
        assert!(angle > TAU - 1e-5);
    }

    // ── layout ────────────────────────────────────────────────────────────

    #[test]
    fn record_is_seven_floats() {
        assert_eq!(InterleavedVertex::STRIDE, 28);
        assert_eq!(std::mem::offset_of!(InterleavedVertex, color), 12);

        let vertices = cloud(100);
        let floats: &[f32] = bytemuck::cast_slice(&vertices);
        assert_eq!(floats.len(), InterleavedVertex::FLOATS * vertices.len());
        for (i, record) in floats.chunks_exact(InterleavedVertex::FLOATS).enumerate() {
            assert_eq!(&record[..3], &vertices[i].position);
            assert_eq!(&record[3..], &INK);
        }
    }

    // ── upload ────────────────────────────────────────────────────────────

    #[test]
    fn upload_writes_once_and_unbinds() {
        let mut ctx = HeadlessContext::new();
        let vertices = cloud(10);
        let vb = upload(&mut ctx, &vertices);

        assert_eq!(vb.vertex_count, 10);
        assert_eq!(
            ctx.calls(),
            &[
                Call::BindArrayBuffer(Some(vb.handle)),
                Call::BufferData {
                    buffer: vb.handle,
                    bytes: 10 * 28,
                },
                Call::BindArrayBuffer(None),
            ]
        );
        assert_eq!(ctx.buffer_contents(vb.handle), Some(bytemuck::cast_slice(&vertices)));
    }
}
