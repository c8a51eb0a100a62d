use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::mode::AutocamMode;

/// Closest the look-at point may get to the eye.
pub const MIN_LOOK_DISTANCE: f32 = 0.1;
/// Lowest eye height manual control may reach.
pub const MIN_ALTITUDE: f32 = 1.0;

/// Per-mode bookkeeping carried between autocam updates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    /// False until the active mode has taken its starting point from the
    /// current pose.
    pub primed: bool,
    /// Path parameter: orbit/spin angle or fly-through phase, radians.
    pub phase: f32,
    /// Random-walk travel direction about Y, radians.
    pub heading: f32,
    pub target_heading: f32,
    /// Seconds until the random walk picks a new target heading.
    pub retarget_in: f32,
    /// Random-walk stream state.
    pub rng: u64,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            primed: false,
            phase: 0.0,
            heading: 0.0,
            target_heading: 0.0,
            retarget_in: 0.0,
            rng: 0x5eed,
        }
    }
}

/// Complete camera pose plus mode selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub position: Vec3,
    pub look_at: Vec3,
    pub up: Vec3,
    pub mode: AutocamMode,
    pub motion: MotionState,
}

impl CameraState {
    /// Pose looking from `position` at `look_at`, autocam off.
    pub fn looking_at(position: Vec3, look_at: Vec3) -> Self {
        Self {
            position,
            look_at,
            up: Vec3::Y,
            mode: AutocamMode::Off,
            motion: MotionState::default(),
        }
    }

    /// Vector from the eye to the look-at point.
    pub fn look_offset(&self) -> Vec3 {
        self.look_at - self.position
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        self.look_offset().normalize_or_zero()
    }

    /// Unit vector to the right of the view, perpendicular to `up`.
    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize_or_zero()
    }

    /// View heading about Y, radians (0 = +X, increasing towards +Z).
    pub fn yaw(&self) -> f32 {
        let d = self.look_offset();
        d.z.atan2(d.x)
    }

    /// Eye and look-at are finite and apart, and the view is not parallel to up.
    pub fn is_valid(&self) -> bool {
        self.position.is_finite()
            && self.look_at.is_finite()
            && self.position.distance(self.look_at) >= MIN_LOOK_DISTANCE
            && self.forward().cross(self.up).length_squared() > 1e-8
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.look_at, self.up)
    }
}
