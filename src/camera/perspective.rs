//! Perspective camera.

use crate::math::{Mat3, Mat4, Quat, Vec3};
use bytemuck::{Pod, Zeroable};

/// A perspective projection camera.
///
/// The camera looks down its local -Z axis; its pose is a position plus an
/// orientation quaternion.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Aspect ratio (width / height).
    pub aspect: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Camera position.
    pub position: Vec3,
    /// Camera orientation.
    pub quaternion: Quat,
    /// Up vector used by `look_at`.
    pub up: Vec3,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(75.0, 16.0 / 9.0, 0.1, 1000.0)
    }
}

impl PerspectiveCamera {
    /// Create a new perspective camera at the origin looking down -Z.
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            quaternion: Quat::IDENTITY,
            up: Vec3::Y,
        }
    }

    /// Set the camera position.
    #[inline]
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Set the orientation from a rotation about the world Y axis.
    pub fn set_yaw(&mut self, yaw: f32) {
        self.quaternion = Quat::from_rotation_y(yaw);
    }

    /// Set the aspect ratio from a viewport size. Degenerate sizes are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Orient the camera so that -Z points at `target`.
    ///
    /// Returns `false` and leaves the orientation untouched when the target
    /// coincides with the camera position.
    pub fn look_at(&mut self, target: Vec3) -> bool {
        let Some(z) = (self.position - target).try_normalize() else {
            return false;
        };
        let mut x = self.up.cross(z);
        if x.length_squared() < 1e-12 {
            // Looking straight along the up axis
            x = self.up.cross(z + Vec3::new(1e-4, 0.0, 0.0));
        }
        let x = x.normalize();
        let y = z.cross(x);
        self.quaternion = Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize();
        true
    }

    /// Camera-to-world matrix.
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.quaternion, self.position)
    }

    /// World-to-camera matrix.
    pub fn view_matrix(&self) -> Mat4 {
        self.world_matrix().inverse()
    }

    /// Projection matrix (wgpu clip space, depth 0..1).
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    /// Combined projection * view matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Get the forward direction.
    pub fn forward(&self) -> Vec3 {
        self.quaternion * Vec3::NEG_Z
    }

    /// Uniform block for shaders.
    pub fn to_uniform(&self) -> CameraUniform {
        let view_proj = self.view_projection_matrix();
        CameraUniform {
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            position: self.position.extend(1.0).to_array(),
        }
    }
}

/// Camera uniform data shared by the mesh and skybox shaders.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    /// Projection * view.
    pub view_proj: [[f32; 4]; 4],
    /// Inverse of `view_proj`, for reconstructing view rays.
    pub inv_view_proj: [[f32; 4]; 4],
    /// World-space camera position (w = 1).
    pub position: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_look_at_points_forward() {
        let mut camera = PerspectiveCamera::default();
        camera.set_position(Vec3::new(0.0, 0.0, 10.0));
        assert!(camera.look_at(Vec3::new(10.0, 0.0, 10.0)));
        assert!(camera.forward().abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn test_look_at_self_is_rejected() {
        let mut camera = PerspectiveCamera::default();
        camera.set_yaw(1.0);
        let before = camera.quaternion;
        assert!(!camera.look_at(camera.position));
        assert_eq!(camera.quaternion, before);
    }

    #[test]
    fn test_look_at_straight_down() {
        let mut camera = PerspectiveCamera::default();
        camera.set_position(Vec3::new(0.0, 10.0, 0.0));
        assert!(camera.look_at(Vec3::ZERO));
        assert!(camera.forward().abs_diff_eq(Vec3::NEG_Y, 1e-3));
    }

    #[test]
    fn test_yaw_matches_original_framing() {
        // A yaw of -1.6 rad turns the default -Z view almost onto +X
        let mut camera = PerspectiveCamera::default();
        camera.set_yaw(-1.6);
        let f = camera.forward();
        assert!(f.x > 0.99);
    }

    #[test]
    fn test_viewport_ignores_zero() {
        let mut camera = PerspectiveCamera::default();
        camera.set_viewport(800, 400);
        assert_eq!(camera.aspect, 2.0);
        camera.set_viewport(0, 400);
        assert_eq!(camera.aspect, 2.0);
    }

    #[test]
    fn test_center_projects_to_origin() {
        let mut camera = PerspectiveCamera::default();
        camera.set_position(Vec3::new(0.0, 0.0, 5.0));
        camera.look_at(Vec3::ZERO);
        let clip = camera.view_projection_matrix().project_point3(Vec3::ZERO);
        assert!(clip.x.abs() < 1e-5 && clip.y.abs() < 1e-5);
    }
}
