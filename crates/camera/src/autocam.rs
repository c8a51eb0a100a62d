use cityscape_common::SplitMix64;
use glam::{Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use crate::mode::AutocamMode;
use crate::state::CameraState;

/// How far ahead along the fly-through path the camera looks, radians of phase.
const FLY_LEAD: f32 = 0.12;

/// Scene-derived parameters shared by every autonomous mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutocamRig {
    /// Ground-level centre of the city.
    pub center: Vec3,
    /// Half the city's XZ size.
    pub half_extent: Vec2,
    /// Height of the tallest building.
    pub roof: f32,
    pub orbit_radius: f32,
    pub orbit_altitude: f32,
    /// Orbit angular speed, radians/s.
    pub orbit_speed: f32,
    pub fly_altitude: f32,
    /// Fly-through ground speed, units/s.
    pub fly_speed: f32,
    pub walk_altitude: f32,
    pub walk_speed: f32,
    /// Random-walk turn rate, radians/s.
    pub turn_rate: f32,
    pub spin_altitude: f32,
    /// Spin angular speed, radians/s.
    pub spin_speed: f32,
    /// Distance to the look-at point for modes that look ahead.
    pub look_distance: f32,
}

impl Default for AutocamRig {
    fn default() -> Self {
        Self::from_bounds(Vec3::new(-100.0, 0.0, -100.0), Vec3::new(100.0, 100.0, 100.0))
    }
}

impl AutocamRig {
    /// Fit the rig to a city's bounding box.
    pub fn from_bounds(min: Vec3, max: Vec3) -> Self {
        let center = Vec3::new((min.x + max.x) * 0.5, 0.0, (min.z + max.z) * 0.5);
        let half_extent =
            Vec2::new((max.x - min.x) * 0.5, (max.z - min.z) * 0.5).max(Vec2::splat(10.0));
        let roof = max.y.max(10.0);
        Self {
            center,
            half_extent,
            roof,
            orbit_radius: half_extent.length() * 1.15,
            orbit_altitude: roof * 1.25,
            orbit_speed: 0.08,
            fly_altitude: roof * 0.9,
            fly_speed: 30.0,
            walk_altitude: roof * 0.75,
            walk_speed: 18.0,
            turn_rate: 0.5,
            spin_altitude: roof * 1.6,
            spin_speed: 0.12,
            look_distance: 60.0,
        }
    }

    /// Point on the fly-through figure-eight at phase `t`.
    fn fly_path(&self, t: f32) -> Vec3 {
        let h = self.half_extent * 0.8;
        self.center
            + Vec3::new(
                h.x * t.sin(),
                self.fly_altitude + self.roof * 0.15 * (3.0 * t).sin(),
                h.y * (2.0 * t).sin(),
            )
    }

    fn is_outside(&self, p: Vec3) -> bool {
        let d = p - self.center;
        d.x.abs() > self.half_extent.x || d.z.abs() > self.half_extent.y
    }
}

/// Advance the camera by `dt` seconds under `mode`.
///
/// Pure: the result depends only on the arguments. `Off` and `Manual` return
/// the state unchanged. Negative or non-finite `dt` counts as zero.
pub fn advance(rig: &AutocamRig, mode: AutocamMode, dt: f32, state: &CameraState) -> CameraState {
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    let mut next = *state;
    next.mode = mode;

    match mode {
        AutocamMode::Manual | AutocamMode::Off => return next,
        AutocamMode::Orbit => orbit(rig, dt, &mut next),
        AutocamMode::FlyThrough => fly_through(rig, dt, &mut next),
        AutocamMode::RandomWalk => random_walk(rig, dt, &mut next),
        AutocamMode::Spin => spin(rig, dt, &mut next),
    }

    settle(state, next)
}

fn orbit(rig: &AutocamRig, dt: f32, s: &mut CameraState) {
    if !s.motion.primed {
        let d = s.position - rig.center;
        s.motion.phase = d.z.atan2(d.x);
        s.motion.primed = true;
    }
    s.motion.phase = (s.motion.phase + rig.orbit_speed * dt).rem_euclid(TAU);

    let (sin, cos) = s.motion.phase.sin_cos();
    s.position = rig.center
        + Vec3::new(
            cos * rig.orbit_radius,
            rig.orbit_altitude,
            sin * rig.orbit_radius,
        );
    s.look_at = rig.center + Vec3::Y * (rig.roof * 0.2);
}

fn fly_through(rig: &AutocamRig, dt: f32, s: &mut CameraState) {
    if !s.motion.primed {
        s.motion.phase = 0.0;
        s.motion.primed = true;
    }
    let scale = rig.half_extent.length().max(1.0);
    s.motion.phase = (s.motion.phase + rig.fly_speed / scale * dt).rem_euclid(TAU);

    s.position = rig.fly_path(s.motion.phase);
    s.look_at = rig.fly_path(s.motion.phase + FLY_LEAD) - Vec3::Y * (rig.roof * 0.1);
}

fn random_walk(rig: &AutocamRig, dt: f32, s: &mut CameraState) {
    let view = s.look_at - s.position;
    let m = &mut s.motion;
    if !m.primed {
        m.heading = view.z.atan2(view.x);
        m.target_heading = m.heading;
        m.retarget_in = 0.0;
        m.primed = true;
    }

    if rig.is_outside(s.position) {
        let home = rig.center - s.position;
        m.target_heading = home.z.atan2(home.x);
    } else {
        m.retarget_in -= dt;
        if m.retarget_in <= 0.0 {
            let mut rng = SplitMix64::new(m.rng);
            m.target_heading = m.heading + rng.range_f32(-FRAC_PI_2, FRAC_PI_2);
            m.retarget_in = rng.range_f32(2.0, 5.0);
            m.rng = rng.state();
        }
    }

    let turn = shortest_angle(m.target_heading - m.heading);
    let step = rig.turn_rate * dt;
    m.heading = (m.heading + turn.clamp(-step, step)).rem_euclid(TAU);

    let (sin, cos) = m.heading.sin_cos();
    let ease = 1.0 - (-dt * 0.5).exp();
    s.position.y += (rig.walk_altitude - s.position.y) * ease;
    s.position += Vec3::new(cos, 0.0, sin) * rig.walk_speed * dt;
    s.look_at = s.position + Vec3::new(cos, -0.25, sin) * rig.look_distance;
}

fn spin(rig: &AutocamRig, dt: f32, s: &mut CameraState) {
    if !s.motion.primed {
        let d = s.look_offset();
        s.motion.phase = d.z.atan2(d.x);
        s.motion.primed = true;
    }
    s.motion.phase = (s.motion.phase + rig.spin_speed * dt).rem_euclid(TAU);

    let hover = rig.center + Vec3::Y * rig.spin_altitude;
    let ease = 1.0 - (-dt * 0.8).exp();
    s.position = s.position.lerp(hover, ease);

    let (sin, cos) = s.motion.phase.sin_cos();
    s.look_at = s.position + Vec3::new(cos, -0.35, sin) * rig.look_distance;
}

/// Wrap an angle difference into `(-PI, PI]`.
fn shortest_angle(a: f32) -> f32 {
    let wrapped = (a + PI).rem_euclid(TAU) - PI;
    if wrapped == -PI { PI } else { wrapped }
}

/// Keep the eye/look-at invariant. An update that would collapse the view
/// keeps the previous viewing offset; failing that, the previous pose.
fn settle(prev: &CameraState, mut next: CameraState) -> CameraState {
    if next.is_valid() {
        return next;
    }
    next.look_at = next.position + prev.look_offset();
    if next.is_valid() {
        return next;
    }
    tracing::debug!(mode = %next.mode, "autocam step rejected, keeping previous pose");
    CameraState {
        mode: next.mode,
        motion: next.motion,
        ..*prev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> CameraState {
        CameraState::looking_at(Vec3::new(150.0, 80.0, 0.0), Vec3::ZERO)
    }

    #[test]
    fn off_and_manual_do_not_move() {
        let rig = AutocamRig::default();
        let s = start();
        for mode in [AutocamMode::Off, AutocamMode::Manual] {
            let n = advance(&rig, mode, 1.0, &s);
            assert_eq!(n.position, s.position);
            assert_eq!(n.look_at, s.look_at);
        }
    }

    #[test]
    fn orbit_follows_circle_formula() {
        let rig = AutocamRig::default();
        let s = advance(&rig, AutocamMode::Orbit, 0.0, &start());
        let angle0 = s.motion.phase;
        let n = advance(&rig, AutocamMode::Orbit, 2.0, &s);
        let expected = angle0 + rig.orbit_speed * 2.0;
        assert!((n.motion.phase - expected).abs() < 1e-5);

        let d = n.position - rig.center;
        assert!((Vec2::new(d.x, d.z).length() - rig.orbit_radius).abs() < 1e-3);
        assert!((d.y - rig.orbit_altitude).abs() < 1e-3);
        assert!((d.z.atan2(d.x).rem_euclid(TAU) - expected).abs() < 1e-4);
    }

    #[test]
    fn orbit_starts_from_current_bearing() {
        let rig = AutocamRig::default();
        // Start on the +X side of the centre: initial angle is 0.
        let s = advance(&rig, AutocamMode::Orbit, 0.0, &start());
        assert!(s.motion.phase.abs() < 1e-5);
        assert!(s.position.x > rig.center.x);
    }

    #[test]
    fn orbit_is_stable_under_frame_rate_changes() {
        let rig = AutocamRig::default();
        let s = start();
        let mut coarse = s;
        for _ in 0..10 {
            coarse = advance(&rig, AutocamMode::Orbit, 0.1, &coarse);
        }
        let mut fine = s;
        for _ in 0..100 {
            fine = advance(&rig, AutocamMode::Orbit, 0.01, &fine);
        }
        assert!(coarse.position.distance(fine.position) < 1e-2);
    }

    #[test]
    fn advance_is_pure() {
        let rig = AutocamRig::default();
        let s = start();
        for mode in AutocamMode::AUTONOMOUS {
            let a = advance(&rig, mode, 0.3, &s);
            let b = advance(&rig, mode, 0.3, &s);
            assert_eq!(a, b, "{mode} is not deterministic");
        }
    }

    #[test]
    fn fly_through_moves_and_looks_ahead() {
        let rig = AutocamRig::default();
        let a = advance(&rig, AutocamMode::FlyThrough, 0.0, &start());
        let b = advance(&rig, AutocamMode::FlyThrough, 0.5, &a);
        assert!(a.position.distance(b.position) > 0.0);
        let travel = (b.position - a.position).normalize();
        assert!(travel.dot(a.forward()) > 0.0);
    }

    #[test]
    fn random_walk_stays_near_the_city() {
        let rig = AutocamRig::default();
        let mut s = CameraState::looking_at(Vec3::new(0.0, 50.0, 0.0), Vec3::new(10.0, 45.0, 0.0));
        for _ in 0..3000 {
            s = advance(&rig, AutocamMode::RandomWalk, 1.0 / 30.0, &s);
        }
        let d = s.position - rig.center;
        let reach = rig.half_extent + Vec2::splat(rig.walk_speed * 2.0 * PI / rig.turn_rate);
        assert!(d.x.abs() <= reach.x && d.z.abs() <= reach.y, "wandered to {d:?}");
    }

    #[test]
    fn random_walk_turns_smoothly() {
        let rig = AutocamRig::default();
        let mut s = advance(&rig, AutocamMode::RandomWalk, 0.0, &start());
        for _ in 0..500 {
            let n = advance(&rig, AutocamMode::RandomWalk, 0.05, &s);
            let turned = shortest_angle(n.motion.heading - s.motion.heading).abs();
            assert!(turned <= rig.turn_rate * 0.05 + 1e-4);
            s = n;
        }
    }

    #[test]
    fn spin_hovers_towards_centre() {
        let rig = AutocamRig::default();
        let mut s = start();
        for _ in 0..600 {
            s = advance(&rig, AutocamMode::Spin, 0.05, &s);
        }
        let hover = rig.center + Vec3::Y * rig.spin_altitude;
        assert!(s.position.distance(hover) < 1.0);
    }

    #[test]
    fn bad_dt_is_treated_as_zero() {
        let rig = AutocamRig::default();
        let s = advance(&rig, AutocamMode::Orbit, 0.0, &start());
        for dt in [-1.0, f32::NAN, f32::INFINITY] {
            let n = advance(&rig, AutocamMode::Orbit, dt, &s);
            assert_eq!(n.motion.phase, s.motion.phase);
        }
    }

    #[test]
    fn no_mode_ever_collapses_the_view() {
        let rig = AutocamRig::from_bounds(Vec3::new(-40.0, 0.0, -60.0), Vec3::new(40.0, 30.0, 60.0));
        let mut dts = SplitMix64::new(11);
        for mode in AutocamMode::ALL {
            let mut s = start();
            for _ in 0..2000 {
                let dt = dts.range_f32(0.0, 0.5);
                s = advance(&rig, mode, dt, &s);
                assert!(s.is_valid(), "{mode} produced {s:?}");
            }
        }
    }

    #[test]
    fn settle_keeps_previous_offset_on_collapse() {
        let prev = start();
        let mut bad = prev;
        bad.position = Vec3::new(5.0, 5.0, 5.0);
        bad.look_at = bad.position;
        let fixed = settle(&prev, bad);
        assert!(fixed.is_valid());
        assert_eq!(fixed.position, bad.position);
        assert_eq!(fixed.look_offset(), prev.look_offset());
    }

    #[test]
    fn shortest_angle_wraps() {
        assert!((shortest_angle(3.0 * PI / 2.0) + FRAC_PI_2).abs() < 1e-5);
        assert!((shortest_angle(-3.0 * PI / 2.0) - FRAC_PI_2).abs() < 1e-5);
        assert!((shortest_angle(0.25) - 0.25).abs() < 1e-6);
    }
}
