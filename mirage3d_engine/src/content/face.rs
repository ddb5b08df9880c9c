/// Face tracking data as delivered by the sensor framework.
///
/// Tracking itself is out of scope: these are plain inputs the content
/// reacts to.

use glam::{Mat4, Vec3};
use rustc_hash::FxHashMap;

/// A tracked face anchor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceAnchor {
    /// Stable identifier of the tracked face
    pub identifier: u64,
    /// Face pose in world space
    pub transform: Mat4,
}

impl FaceAnchor {
    pub fn new(identifier: u64, transform: Mat4) -> Self {
        Self { identifier, transform }
    }
}

/// Blend shape coefficients used by the content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendShape {
    JawOpen,
    EyeBlinkLeft,
    EyeBlinkRight,
    BrowInnerUp,
}

/// Per-frame face data: topology-stable mesh plus expression coefficients
#[derive(Debug, Clone, Default)]
pub struct FaceData {
    /// Face mesh vertices in anchor space
    pub vertices: Vec<Vec3>,
    /// Triangle indices into `vertices`
    pub triangle_indices: Vec<u32>,
    /// Coefficients in [0, 1]; missing shapes read as 0
    pub blend_shapes: FxHashMap<BlendShape, f32>,
}

impl FaceData {
    pub fn new(vertices: Vec<Vec3>, triangle_indices: Vec<u32>) -> Self {
        Self {
            vertices,
            triangle_indices,
            blend_shapes: FxHashMap::default(),
        }
    }

    pub fn with_blend_shape(mut self, shape: BlendShape, value: f32) -> Self {
        self.blend_shapes.insert(shape, value);
        self
    }

    /// Coefficient of `shape`, clamped to [0, 1]
    pub fn blend_shape(&self, shape: BlendShape) -> f32 {
        self.blend_shapes.get(&shape).copied().unwrap_or(0.0).clamp(0.0, 1.0)
    }

    pub fn has_geometry(&self) -> bool {
        !self.vertices.is_empty() && !self.triangle_indices.is_empty()
    }
}
