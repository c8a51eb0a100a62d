use cityscape_camera::{CameraState, Projection};
use glam::{Mat4, Vec3};

/// Per-frame camera constants handed to the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_proj: Mat4,
    pub eye: Vec3,
}

impl FrameUniforms {
    pub fn compose(state: &CameraState, projection: &Projection) -> Self {
        let view = state.view_matrix();
        let proj = projection.matrix();
        Self {
            view,
            projection: proj,
            view_proj: proj * view,
            eye: state.position,
        }
    }
}
