//! CPU-side uniform storage and the per-frame dynamic-offset arena.

/// Zero-initialized copies of a program's uniform blocks.
///
/// Uniform writes land here; each draw snapshots the blocks into the arena
/// so later writes in the same frame cannot clobber an earlier draw.
#[derive(Debug, Clone, Default)]
pub(crate) struct ShadowBlocks {
    blocks: Vec<Vec<u8>>,
}

impl ShadowBlocks {
    pub fn new(sizes: impl IntoIterator<Item = u32>) -> Self {
        Self {
            blocks: sizes.into_iter().map(|s| vec![0u8; s as usize]).collect(),
        }
    }

    /// Writes `bytes` at `offset` in block `index`, truncated to `limit` bytes.
    pub fn write(&mut self, index: usize, offset: u32, limit: u32, bytes: &[u8]) {
        let Some(block) = self.blocks.get_mut(index) else { return };
        let start = (offset as usize).min(block.len());
        let len = bytes.len().min(limit as usize).min(block.len() - start);
        block[start..start + len].copy_from_slice(&bytes[..len]);
    }

    pub fn blocks(&self) -> impl Iterator<Item = &[u8]> {
        self.blocks.iter().map(Vec::as_slice)
    }
}

/// Bytes staged for this frame's uniform arena.
#[derive(Debug, Default)]
pub(crate) struct ArenaStaging {
    bytes: Vec<u8>,
}

impl ArenaStaging {
    /// Appends `block` at the next `alignment`-aligned offset and returns that offset.
    pub fn push(&mut self, block: &[u8], alignment: u32) -> u32 {
        let align = alignment.max(1) as usize;
        let offset = self.bytes.len().div_ceil(align) * align;
        self.bytes.resize(offset, 0);
        self.bytes.extend_from_slice(block);
        offset as u32
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// GPU buffer backing the arena. Grows, never shrinks.
#[derive(Default)]
pub(crate) struct UniformArena {
    buffer: Option<wgpu::Buffer>,
    capacity: u64,
}

impl UniformArena {
    pub fn ensure_capacity(&mut self, device: &wgpu::Device, required: u64) {
        if required <= self.capacity && self.buffer.is_some() {
            return;
        }
        let new_cap = required.next_power_of_two().max(4096);
        self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pointfield uniform arena"),
            size: new_cap,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.capacity = new_cap;
        log::debug!("uniform arena grown to {new_cap} bytes");
    }

    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }
}

/// Column-major transpose of a 4x4 matrix.
pub(crate) fn transpose4(m: &[f32; 16]) -> [f32; 16] {
    let mut out = [0.0; 16];
    for col in 0..4 {
        for row in 0..4 {
            out[row * 4 + col] = m[col * 4 + row];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn shadow_writes_land_at_offset() {
        let mut shadow = ShadowBlocks::new([32]);
        shadow.write(0, 16, 8, bytemuck::cast_slice(&[1.0f32, 2.0]));
        let block = shadow.blocks().next().unwrap();
        assert_eq!(&block[..16], &[0u8; 16]);
        assert_eq!(floats(&block[16..24]), [1.0, 2.0]);
    }

    #[test]
    fn shadow_writes_are_clamped() {
        let mut shadow = ShadowBlocks::new([8]);
        shadow.write(0, 4, 4, bytemuck::cast_slice(&[1.0f32, 2.0, 3.0]));
        shadow.write(3, 0, 4, &[0xff; 4]);
        let block = shadow.blocks().next().unwrap();
        assert_eq!(floats(block), [0.0, 1.0]);
    }

    #[test]
    fn staging_aligns_each_snapshot() {
        let mut staging = ArenaStaging::default();
        assert_eq!(staging.push(&[1; 128], 256), 0);
        assert_eq!(staging.push(&[2; 128], 256), 256);
        assert_eq!(staging.push(&[3; 4], 256), 512);
        assert_eq!(staging.bytes().len(), 516);
        assert_eq!(staging.bytes()[200], 0);
    }

    #[test]
    fn transpose_swaps_rows_and_columns() {
        let m: [f32; 16] = std::array::from_fn(|i| i as f32);
        let t = transpose4(&m);
        assert_eq!(t[1], 4.0);
        assert_eq!(t[4], 1.0);
        assert_eq!(transpose4(&t), m);
    }
}
