/// FaceCamera - view and projection for rendering one cube map face.
///
/// The camera sits at the environment map location and looks along the
/// axis of its face with a 90° square frustum, so that the six faces
/// together cover the full sphere of directions without overlap.

use glam::{Mat4, Vec3};
use crate::graphics_device::CubeFace;

/// Camera looking from a location towards one cube map face.
///
/// Up vectors follow the cube map face layout: the side faces look with
/// -Y up, +Y looks with +Z up and -Y looks with -Z up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceCamera {
    face: CubeFace,
    location: Vec3,
    view_matrix: Mat4,
    projection_matrix: Mat4,
}

impl FaceCamera {
    /// Create a camera at `location` facing `face`, with the given clip planes.
    pub fn new(face: CubeFace, location: Vec3, near: f32, far: f32) -> Self {
        let view_matrix = Mat4::look_at_rh(location, location + Self::direction_of(face), Self::up_of(face));
        let projection_matrix = Mat4::perspective_rh_gl(std::f32::consts::FRAC_PI_2, 1.0, near, far);
        Self {
            face,
            location,
            view_matrix,
            projection_matrix,
        }
    }

    /// Axis a camera for `face` looks along
    pub fn direction_of(face: CubeFace) -> Vec3 {
        match face {
            CubeFace::PositiveX => Vec3::X,
            CubeFace::NegativeX => Vec3::NEG_X,
            CubeFace::PositiveY => Vec3::Y,
            CubeFace::NegativeY => Vec3::NEG_Y,
            CubeFace::PositiveZ => Vec3::Z,
            CubeFace::NegativeZ => Vec3::NEG_Z,
        }
    }

    /// Up vector of a camera for `face`
    pub fn up_of(face: CubeFace) -> Vec3 {
        match face {
            CubeFace::PositiveY => Vec3::Z,
            CubeFace::NegativeY => Vec3::NEG_Z,
            _ => Vec3::NEG_Y,
        }
    }

    // ===== GETTERS =====

    pub fn face(&self) -> CubeFace {
        self.face
    }

    /// World-space camera position.
    pub fn location(&self) -> Vec3 {
        self.location
    }

    pub fn direction(&self) -> Vec3 {
        Self::direction_of(self.face)
    }

    pub fn up(&self) -> Vec3 {
        Self::up_of(self.face)
    }

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// 90° perspective projection with aspect ratio 1.
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }
}

#[cfg(test)]
#[path = "face_camera_tests.rs"]
mod tests;
