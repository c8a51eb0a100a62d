use glam::{Mat4, Quat, Vec2, Vec3};

use crate::autocam::{AutocamRig, advance};
use crate::delta::DeltaKind;
use crate::mode::AutocamMode;
use crate::state::{CameraState, MIN_ALTITUDE, MIN_LOOK_DISTANCE};

/// Steepest manual look angle above or below the horizon.
const MAX_PITCH: f32 = 80.0 * std::f32::consts::PI / 180.0;

/// Look-at camera with manual control and autocam mode selection.
#[derive(Debug, Clone)]
pub struct Camera {
    state: CameraState,
    last_autonomous: Option<AutocamMode>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::overlooking(&AutocamRig::default())
    }
}

impl Camera {
    /// Camera at `position` looking at `look_at`. A degenerate pair is
    /// replaced by a level view along -Z.
    pub fn new(position: Vec3, look_at: Vec3) -> Self {
        let mut state = CameraState::looking_at(position, look_at);
        if !state.is_valid() || horizontal(state.look_offset()) < MIN_LOOK_DISTANCE {
            state.look_at = state.position + Vec3::new(0.0, -0.2, -1.0) * 10.0;
        }
        Self {
            state,
            last_autonomous: None,
        }
    }

    /// Starting viewpoint: outside one corner of the city, looking at the centre.
    pub fn overlooking(rig: &AutocamRig) -> Self {
        let corner = Vec3::new(rig.half_extent.x, 0.0, rig.half_extent.y) * 0.9;
        Self::new(
            rig.center + corner + Vec3::Y * (rig.roof * 0.8),
            rig.center + Vec3::Y * (rig.roof * 0.2),
        )
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn mode(&self) -> AutocamMode {
        self.state.mode
    }

    /// Most recently selected autonomous mode, if any.
    pub fn last_autonomous(&self) -> Option<AutocamMode> {
        self.last_autonomous
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.state.view_matrix()
    }

    /// Switch directly to `mode`. Selecting the current mode is a no-op;
    /// returns whether the mode changed.
    pub fn set_mode(&mut self, mode: AutocamMode) -> bool {
        if mode == self.state.mode {
            return false;
        }
        if mode.is_autonomous() {
            self.last_autonomous = Some(mode);
        }
        tracing::info!(from = %self.state.mode, to = %mode, "autocam mode");
        self.state.mode = mode;
        self.state.motion.primed = false;
        true
    }

    /// Flip between `Off` and the last autonomous mode (`Orbit` the first
    /// time). Returns the new mode.
    pub fn toggle_autocam(&mut self) -> AutocamMode {
        let next = if self.state.mode.is_autonomous() {
            AutocamMode::Off
        } else {
            self.last_autonomous
                .unwrap_or(AutocamMode::DEFAULT_AUTONOMOUS)
        };
        self.set_mode(next);
        next
    }

    /// Run one autocam step for the current mode.
    pub fn advance(&mut self, rig: &AutocamRig, dt: f32) {
        self.state = advance(rig, self.state.mode, dt, &self.state);
    }

    /// Apply a manual delta. Ignored (returns `false`) while an autonomous
    /// mode is active, for non-finite values, or when the result would
    /// degenerate the view.
    pub fn apply_delta(&mut self, kind: DeltaKind, value: f32) -> bool {
        match kind {
            DeltaKind::Yaw => self.rotate_view_round(value),
            DeltaKind::Pitch => self.adjust_pitch(value),
            DeltaKind::Dolly => self.move_camera(value),
            DeltaKind::Raise => self.raise_camera(value),
            DeltaKind::Strafe => self.strafe_camera(value),
        }
    }

    /// Turn the view about the vertical axis through the eye.
    pub fn rotate_view_round(&mut self, yaw: f32) -> bool {
        self.manual(DeltaKind::Yaw, yaw, |s, v| {
            let offset = Quat::from_rotation_y(v) * s.look_offset();
            s.look_at = s.position + offset;
            true
        })
    }

    /// Move the look-at point vertically, clamped short of straight up/down.
    pub fn adjust_pitch(&mut self, delta: f32) -> bool {
        self.manual(DeltaKind::Pitch, delta, |s, v| {
            let mut offset = s.look_offset();
            let flat = horizontal(offset);
            if flat < MIN_LOOK_DISTANCE {
                return false;
            }
            let limit = flat * MAX_PITCH.tan();
            offset.y = (offset.y + v).clamp(-limit, limit);
            s.look_at = s.position + offset;
            true
        })
    }

    /// Dolly along the view direction.
    pub fn move_camera(&mut self, speed: f32) -> bool {
        self.manual(DeltaKind::Dolly, speed, |s, v| {
            let step = s.forward() * v;
            s.position += step;
            s.look_at += step;
            lift_to_min_altitude(s);
            true
        })
    }

    /// Move eye and look-at straight up or down, never below [`MIN_ALTITUDE`].
    pub fn raise_camera(&mut self, amount: f32) -> bool {
        self.manual(DeltaKind::Raise, amount, |s, v| {
            let dy = v.max(MIN_ALTITUDE - s.position.y);
            s.position.y += dy;
            s.look_at.y += dy;
            true
        })
    }

    /// Slide sideways, perpendicular to the view and up vectors.
    pub fn strafe_camera(&mut self, speed: f32) -> bool {
        self.manual(DeltaKind::Strafe, speed, |s, v| {
            let right = s.right();
            if right == Vec3::ZERO {
                return false;
            }
            s.position += right * v;
            s.look_at += right * v;
            true
        })
    }

    /// Shared gate for every manual mutator: policy check, bounding, and
    /// validation of the resulting pose.
    fn manual(
        &mut self,
        kind: DeltaKind,
        value: f32,
        apply: impl FnOnce(&mut CameraState, f32) -> bool,
    ) -> bool {
        if self.state.mode.is_autonomous() {
            tracing::trace!(?kind, mode = %self.state.mode, "manual delta ignored during autocam");
            return false;
        }
        let Some(v) = kind.bound(value) else {
            tracing::debug!(?kind, value, "non-finite camera delta rejected");
            return false;
        };
        let mut next = self.state;
        if !apply(&mut next, v) || !next.is_valid() {
            tracing::debug!(?kind, value, "camera delta rejected");
            return false;
        }
        self.state = next;
        true
    }
}

fn horizontal(v: Vec3) -> f32 {
    Vec2::new(v.x, v.z).length()
}

fn lift_to_min_altitude(s: &mut CameraState) {
    if s.position.y < MIN_ALTITUDE {
        let dy = MIN_ALTITUDE - s.position.y;
        s.position.y += dy;
        s.look_at.y += dy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::{MAX_LINEAR_DELTA, MAX_YAW_DELTA};
    use cityscape_common::SplitMix64;

    fn camera() -> Camera {
        Camera::new(Vec3::new(0.0, 20.0, 50.0), Vec3::new(0.0, 15.0, 0.0))
    }

    #[test]
    fn degenerate_construction_is_repaired() {
        let cam = Camera::new(Vec3::ONE, Vec3::ONE);
        assert!(cam.state().is_valid());
        let cam = Camera::new(Vec3::ZERO, Vec3::new(0.0, 10.0, 0.0));
        assert!(cam.state().is_valid());
    }

    #[test]
    fn toggle_enters_orbit_first_then_off() {
        let mut cam = camera();
        assert_eq!(cam.mode(), AutocamMode::Off);
        assert_eq!(cam.toggle_autocam(), AutocamMode::Orbit);
        assert_eq!(cam.toggle_autocam(), AutocamMode::Off);
    }

    #[test]
    fn toggle_returns_to_last_used_mode() {
        let mut cam = camera();
        cam.set_mode(AutocamMode::RandomWalk);
        cam.toggle_autocam();
        assert_eq!(cam.mode(), AutocamMode::Off);
        assert_eq!(cam.toggle_autocam(), AutocamMode::RandomWalk);
    }

    #[test]
    fn toggle_off_freezes_position() {
        let rig = AutocamRig::default();
        let mut cam = camera();
        cam.toggle_autocam();
        for _ in 0..10 {
            cam.advance(&rig, 0.1);
        }
        cam.toggle_autocam();
        let frozen = *cam.state();
        for _ in 0..10 {
            cam.advance(&rig, 0.1);
        }
        assert_eq!(cam.state().position, frozen.position);
        assert_eq!(cam.state().look_at, frozen.look_at);
    }

    #[test]
    fn setting_the_same_mode_twice_is_a_no_op() {
        let rig = AutocamRig::default();
        let mut cam = camera();
        assert!(cam.set_mode(AutocamMode::Orbit));
        cam.advance(&rig, 0.5);
        let before = *cam.state();
        assert!(!cam.set_mode(AutocamMode::Orbit));
        assert_eq!(*cam.state(), before);
    }

    #[test]
    fn manual_and_off_both_accept_deltas() {
        let mut cam = camera();
        assert!(cam.apply_delta(DeltaKind::Dolly, 1.0));
        cam.set_mode(AutocamMode::Manual);
        assert!(cam.apply_delta(DeltaKind::Dolly, 1.0));
        // Manual is not remembered as an autocam mode.
        assert_eq!(cam.last_autonomous(), None);
    }

    #[test]
    fn deltas_are_ignored_during_autocam() {
        let mut cam = camera();
        cam.set_mode(AutocamMode::Spin);
        let before = *cam.state();
        for kind in DeltaKind::ALL {
            assert!(!cam.apply_delta(kind, 1.0));
        }
        assert_eq!(*cam.state(), before);
    }

    #[test]
    fn yaw_rotates_about_the_eye() {
        let mut cam = camera();
        let dist = cam.state().look_offset().length();
        let eye = cam.state().position;
        assert!(cam.rotate_view_round(std::f32::consts::FRAC_PI_4 / 2.0));
        assert_eq!(cam.state().position, eye);
        assert!((cam.state().look_offset().length() - dist).abs() < 1e-4);
    }

    #[test]
    fn pitch_is_clamped_short_of_the_pole() {
        let mut cam = camera();
        for _ in 0..100 {
            cam.adjust_pitch(MAX_LINEAR_DELTA);
        }
        let off = cam.state().look_offset();
        let angle = off.y.atan2(horizontal(off));
        assert!(angle <= MAX_PITCH + 1e-4);
        assert!(cam.state().is_valid());
    }

    #[test]
    fn dolly_moves_along_view_and_keeps_offset() {
        let mut cam = camera();
        let before = *cam.state();
        assert!(cam.move_camera(5.0));
        let moved = cam.state().position - before.position;
        assert!((moved.length() - 5.0).abs() < 1e-4);
        assert!(moved.normalize().dot(before.forward()) > 0.999);
        assert!((cam.state().look_offset() - before.look_offset()).length() < 1e-4);
    }

    #[test]
    fn raise_is_vertical_and_floored() {
        let mut cam = camera();
        let x = cam.state().position.x;
        assert!(cam.raise_camera(3.0));
        assert_eq!(cam.state().position.y, 23.0);
        assert_eq!(cam.state().position.x, x);
        for _ in 0..10 {
            cam.raise_camera(-MAX_LINEAR_DELTA);
        }
        assert_eq!(cam.state().position.y, MIN_ALTITUDE);
    }

    #[test]
    fn strafe_is_perpendicular_to_view() {
        let mut cam = camera();
        let before = *cam.state();
        assert!(cam.strafe_camera(2.0));
        let moved = cam.state().position - before.position;
        assert!(moved.dot(before.forward()).abs() < 1e-4);
        assert!(moved.dot(Vec3::Y).abs() < 1e-4);
    }

    #[test]
    fn oversized_and_nan_deltas_are_bounded() {
        let mut cam = camera();
        let before = *cam.state();
        assert!(cam.rotate_view_round(100.0));
        let turned = before
            .look_offset()
            .normalize()
            .dot(cam.state().look_offset().normalize())
            .clamp(-1.0, 1.0)
            .acos();
        assert!(turned <= MAX_YAW_DELTA + 1e-3);
        assert!(!cam.move_camera(f32::NAN));
    }

    #[test]
    fn random_manual_sequences_keep_the_view_valid() {
        let mut rng = SplitMix64::new(2024);
        let mut cam = camera();
        for _ in 0..20_000 {
            let kind = DeltaKind::ALL[rng.below(5) as usize];
            let value = rng.range_f32(-80.0, 80.0);
            cam.apply_delta(kind, value);
            assert!(cam.state().is_valid(), "{kind:?} {value} broke {:?}", cam.state());
        }
    }

    #[test]
    fn mixed_manual_and_autocam_sequences_keep_the_view_valid() {
        let rig = AutocamRig::default();
        let mut rng = SplitMix64::new(77);
        let mut cam = camera();
        for i in 0..5000 {
            if i % 250 == 0 {
                let mode = AutocamMode::ALL[rng.below(AutocamMode::ALL.len() as u32) as usize];
                cam.set_mode(mode);
            }
            if cam.mode().is_autonomous() {
                cam.advance(&rig, rng.range_f32(0.0, 0.2));
            } else {
                let kind = DeltaKind::ALL[rng.below(5) as usize];
                cam.apply_delta(kind, rng.range_f32(-10.0, 10.0));
            }
            assert!(cam.state().is_valid());
        }
    }
}
