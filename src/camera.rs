//! Fixed perspective camera.
//!
//! The backdrop never orbits: the camera sits at a fixed distance on +Z
//! looking at the origin, and all apparent motion comes from rotating the
//! cloud itself. Only the aspect ratio changes, on resize.

use glam::{Mat4, Vec3};

/// Perspective camera at a fixed distance from the origin.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Output aspect ratio (width / height).
    pub aspect: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
    /// Distance from the origin along +Z.
    pub distance: f32,
}

impl Camera {
    /// Create the backdrop camera for the given output aspect ratio.
    pub fn new(aspect: f32) -> Self {
        Self {
            fov_y: 75.0_f32.to_radians(),
            aspect,
            near: 0.1,
            far: 1000.0,
            distance: 15.0,
        }
    }

    /// Update the aspect ratio from a new output size.
    ///
    /// Called on resize; nothing else about the camera changes.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// The camera's world position.
    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.distance)
    }

    /// View matrix looking at the origin.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), Vec3::ZERO, Vec3::Y)
    }

    /// Perspective projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_tracks_resize() {
        let mut camera = Camera::new(1.0);
        camera.set_aspect(1920, 1080);
        assert!((camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);

        // Degenerate sizes leave the aspect untouched.
        camera.set_aspect(0, 1080);
        assert!((camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn test_fixed_position() {
        let camera = Camera::new(1.5);
        assert_eq!(camera.position(), Vec3::new(0.0, 0.0, 15.0));
    }

    #[test]
    fn test_matrices_finite() {
        let camera = Camera::new(16.0 / 9.0);
        let vp = camera.projection_matrix() * camera.view_matrix();
        assert!(vp.to_cols_array().iter().all(|v| v.is_finite()));

        // A point at the origin projects to the center of the screen.
        let clip = vp * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((clip.x / clip.w).abs() < 1e-6);
        assert!((clip.y / clip.w).abs() < 1e-6);
    }
}
