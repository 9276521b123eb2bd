use glam::{Mat4, Vec3};

/// How an instance derives its model matrix from the frame's base matrix.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InstanceTransform {
    /// The base matrix itself.
    Identity,
    /// `base · T(v)`.
    Translate(Vec3),
    /// `base · S(v)`.
    Scale(Vec3),
}

impl InstanceTransform {
    pub fn apply(&self, base: Mat4) -> Mat4 {
        match *self {
            InstanceTransform::Identity => base,
            InstanceTransform::Translate(v) => base * Mat4::from_translation(v),
            InstanceTransform::Scale(v) => base * Mat4::from_scale(v),
        }
    }
}

/// One draw of the shared point buffer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ModelInstance {
    pub label: &'static str,
    pub transform: InstanceTransform,
    /// Value pushed as `uFlag`.
    pub flag: f32,
}

impl ModelInstance {
    /// Column-major model matrix for this frame.
    pub fn model_matrix(&self, base: Mat4) -> [f32; 16] {
        self.transform.apply(base).to_cols_array()
    }
}

/// Centre disk, then left, shrunk and right copies.
pub const REFERENCE_INSTANCES: [ModelInstance; 4] = [
    ModelInstance {
        label: "centre",
        transform: InstanceTransform::Identity,
        flag: 0.0,
    },
    ModelInstance {
        label: "left",
        transform: InstanceTransform::Translate(Vec3::new(-1.0, 0.0, 0.0)),
        flag: 1.0,
    },
    ModelInstance {
        label: "shrunk",
        transform: InstanceTransform::Scale(Vec3::new(0.55, 0.55, 1.0)),
        flag: 1.0,
    },
    ModelInstance {
        label: "right",
        transform: InstanceTransform::Translate(Vec3::new(1.0, 0.0, 0.0)),
        flag: 1.0,
    },
];
