use super::instance::{ModelInstance, REFERENCE_INSTANCES};

/// Scene parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    /// Points generated per cloud.
    pub point_count: usize,
    /// Disk radius in model units.
    pub radius: f32,
    /// Per-vertex color baked into the buffer.
    pub point_color: [f32; 4],
    pub clear_color: [f32; 4],
    /// Pushed as `uColor` for every instance.
    pub flat_color: [f32; 4],
    /// Drawn in order each frame.
    pub instances: Vec<ModelInstance>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            point_count: 10_000,
            radius: 0.5,
            point_color: [0.02, 0.032, 0.11, 1.0],
            clear_color: [0.9135, 0.9135, 0.9035, 1.0],
            flat_color: [0.1, 1.0, 0.5, 1.0],
            instances: REFERENCE_INSTANCES.to_vec(),
        }
    }
}
