use glam::Mat4;
use serde::{Deserialize, Serialize};

/// Perspective projection. Only `aspect` changes at runtime (on resize).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Vertical field of view, radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov: 60.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.5,
            far: 2000.0,
        }
    }
}

impl Projection {
    /// Update the aspect ratio from a surface size. Zero sizes are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.aspect = width as f32 / height as f32;
        true
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_sets_aspect() {
        let mut p = Projection::default();
        assert!(p.set_viewport(800, 400));
        assert_eq!(p.aspect, 2.0);
        assert!(!p.set_viewport(0, 400));
        assert_eq!(p.aspect, 2.0);
    }

    #[test]
    fn aspect_only_changes_the_x_scale() {
        let mut p = Projection::default();
        let before = p.matrix();
        p.set_viewport(1000, 1000);
        let after = p.matrix();
        assert_ne!(before.x_axis.x, after.x_axis.x);
        assert_eq!(before.y_axis, after.y_axis);
        assert_eq!(before.z_axis, after.z_axis);
        assert_eq!(before.w_axis, after.w_axis);
    }
}
