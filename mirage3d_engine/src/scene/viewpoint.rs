/// Viewpoint - passive view + projection container.
///
/// The viewpoint is owned and driven by the caller (typically updated from
/// the tracked camera every frame). The renderer only reads it.

use glam::{Mat4, Vec3};

/// Camera used to project the scene into the offscreen target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewpoint {
    view_matrix: Mat4,
    projection_matrix: Mat4,
}

impl Viewpoint {
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self {
            view_matrix: view,
            projection_matrix: projection,
        }
    }

    /// Right-handed perspective viewpoint looking from `eye` at `target`
    ///
    /// `fov_y` is in radians; depth maps to [0, 1].
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::new(
            Mat4::look_at_rh(eye, target, up),
            Mat4::perspective_rh(fov_y, aspect, near, far),
        )
    }

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Projection matrix.
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    pub fn set_view(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
    }

    pub fn set_projection(&mut self, matrix: Mat4) {
        self.projection_matrix = matrix;
    }

    /// Replace the projection with a right-handed perspective
    pub fn perspective(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) {
        self.projection_matrix = Mat4::perspective_rh(fov_y, aspect, near, far);
    }
}

impl Default for Viewpoint {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

#[cfg(test)]
#[path = "viewpoint_tests.rs"]
mod tests;
