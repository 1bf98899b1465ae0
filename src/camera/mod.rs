//! Third-person orbit camera.
//!
//! The camera sits on a sphere of fixed radius around a pivot at the
//! character's chest. Mouse motion turns yaw (unbounded) and pitch (clamped),
//! the spherical target is floored so the camera cannot sink through the
//! ground, and the actual position eases towards the target every frame
//! before re-aiming at the pivot.
//!
//! The easing is `lerp(position, target, dt * smooth_speed)`, which is only
//! approximately frame-rate independent. It behaves well at steady frame
//! rates; `dt` is clamped so a hitch cannot overshoot.

pub mod systems;

use crate::locomotion::clamp_delta;
use crate::settings::CameraSettings;
use bevy::prelude::*;

pub use systems::{sync_camera_settings, update_orbit_camera};

/// Position/orientation access to whatever renders the view.
pub trait CameraRig {
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);
    fn direction(&self) -> Vec3;
    fn up(&self) -> Vec3;
    /// Turn to look at `point`, keeping world up.
    fn aim_at(&mut self, point: Vec3);
}

impl CameraRig for Transform {
    fn position(&self) -> Vec3 {
        self.translation
    }

    fn set_position(&mut self, position: Vec3) {
        self.translation = position;
    }

    fn direction(&self) -> Vec3 {
        *self.forward()
    }

    fn up(&self) -> Vec3 {
        *Transform::up(self)
    }

    fn aim_at(&mut self, point: Vec3) {
        if (point - self.translation).length_squared() > f32::EPSILON {
            Transform::look_at(self, point, Vec3::Y);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// Mouse input is ignored while the countdown runs; the camera still
    /// follows the target.
    Settling,
    Active,
}

/// Orbit state and tuning. Angles are radians.
#[derive(Component, Debug, Clone)]
pub struct OrbitCamera {
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub pitch_min: f32,
    pub pitch_max: f32,
    /// Radians per pixel of mouse travel.
    pub sensitivity: f32,
    pub smooth_speed: f32,
    pub height_offset: f32,
    pub floor_height: f32,
    pub max_delta_seconds: f32,
    pub settle_frames: u32,
    settle_remaining: u32,
    target_position: Vec3,
}

impl OrbitCamera {
    /// Build from settings. `mouse_multiplier` is the user's sensitivity
    /// multiplier from the controls section.
    #[must_use]
    pub fn from_settings(settings: &CameraSettings, mouse_multiplier: f32, max_delta_seconds: f32) -> Self {
        let mut camera = Self {
            distance: settings.distance,
            yaw: settings.initial_yaw_degrees.to_radians(),
            pitch: 0.0,
            pitch_min: 0.0,
            pitch_max: 0.0,
            sensitivity: 0.0,
            smooth_speed: 0.0,
            height_offset: 0.0,
            floor_height: 0.0,
            max_delta_seconds,
            settle_frames: settings.settle_frames,
            settle_remaining: settings.settle_frames,
            target_position: Vec3::ZERO,
        };
        camera.apply_settings(settings, mouse_multiplier, max_delta_seconds);
        camera.pitch = settings
            .initial_pitch_degrees
            .to_radians()
            .clamp(camera.pitch_min, camera.pitch_max);
        camera
    }

    /// Refresh tuning in place. Current yaw is kept, pitch is re-clamped to
    /// the (possibly new) range.
    pub fn apply_settings(&mut self, settings: &CameraSettings, mouse_multiplier: f32, max_delta_seconds: f32) {
        let lo = settings.pitch_min_degrees.to_radians();
        let hi = settings.pitch_max_degrees.to_radians();
        self.pitch_min = lo.min(hi);
        self.pitch_max = lo.max(hi);
        self.pitch = self.pitch.clamp(self.pitch_min, self.pitch_max);
        self.distance = settings.distance.max(0.0);
        self.sensitivity = (settings.sensitivity_degrees * mouse_multiplier).to_radians();
        self.smooth_speed = settings.smooth_speed.max(0.0);
        self.height_offset = settings.height_offset;
        self.floor_height = settings.floor_height;
        self.settle_frames = settings.settle_frames;
        self.max_delta_seconds = max_delta_seconds;
    }

    #[must_use]
    pub fn mode(&self) -> CameraMode {
        if self.settle_remaining > 0 { CameraMode::Settling } else { CameraMode::Active }
    }

    /// Restart the settling countdown, e.g. when input capture begins.
    pub fn begin_settling(&mut self) {
        self.settle_remaining = self.settle_frames;
    }

    /// Last computed spherical target.
    #[must_use]
    pub fn target_position(&self) -> Vec3 {
        self.target_position
    }

    /// Accumulate a mouse delta into yaw and pitch. Non-finite deltas are
    /// dropped.
    pub fn apply_look(&mut self, mouse_delta: Vec2) {
        if !mouse_delta.is_finite() {
            return;
        }
        self.yaw += -mouse_delta.x * self.sensitivity;
        self.pitch = (self.pitch + -mouse_delta.y * self.sensitivity).clamp(self.pitch_min, self.pitch_max);
    }

    /// Point the camera orbits around and looks at.
    #[must_use]
    pub fn pivot(&self, body_position: Vec3) -> Vec3 {
        body_position + Vec3::new(0.0, self.height_offset, 0.0)
    }

    /// Spherical camera target for the current yaw/pitch, floored.
    #[must_use]
    pub fn orbit_target(&self, body_position: Vec3) -> Vec3 {
        let horizontal = self.distance * self.pitch.cos();
        let vertical = self.distance * self.pitch.sin();
        let offset_x = horizontal * self.yaw.sin();
        let offset_z = horizontal * self.yaw.cos();

        let mut target = body_position - Vec3::new(offset_x, 0.0, offset_z)
            + Vec3::new(0.0, vertical + self.height_offset, 0.0);
        target.y = target.y.max(self.floor_height);
        target
    }

    /// One frame: look input (unless settling), retarget, ease, re-aim.
    ///
    /// # Arguments
    /// * `dt` - Frame delta in seconds, clamped to `max_delta_seconds`.
    /// * `mouse_delta` - Pixels moved this frame, already inverted as configured.
    ///   Ignored while settling.
    /// * `body_position` - Character body centre, read after physics stepped.
    /// * `rig` - The camera to move and re-aim at the pivot.
    pub fn update<R: CameraRig>(&mut self, dt: f32, mouse_delta: Vec2, body_position: Vec3, rig: &mut R) {
        if self.settle_remaining > 0 {
            self.settle_remaining -= 1;
        } else {
            self.apply_look(mouse_delta);
        }

        let dt = clamp_delta(dt, self.max_delta_seconds);
        self.target_position = self.orbit_target(body_position);
        let t = (dt * self.smooth_speed).clamp(0.0, 1.0);
        rig.set_position(rig.position().lerp(self.target_position, t));
        rig.aim_at(self.pivot(body_position));
    }

    /// Jump straight to the target with no easing. Used once at spawn so the
    /// first frames do not sweep in from the origin.
    pub fn snap<R: CameraRig>(&mut self, body_position: Vec3, rig: &mut R) {
        self.target_position = self.orbit_target(body_position);
        rig.set_position(self.target_position);
        rig.aim_at(self.pivot(body_position));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn camera() -> OrbitCamera {
        OrbitCamera::from_settings(&CameraSettings::default(), 1.0, 1.0 / 15.0)
    }

    fn settled() -> OrbitCamera {
        let mut c = camera();
        c.settle_frames = 0;
        c.begin_settling();
        c
    }

    /// Deterministic LCG so the sequences are repeatable.
    fn deltas(seed: u32, n: usize, scale: f32) -> Vec<Vec2> {
        let mut state = seed;
        let mut next = || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            ((state >> 8) as f32 / (1u32 << 24) as f32) * 2.0 - 1.0
        };
        (0..n).map(|_| Vec2::new(next() * scale, next() * scale)).collect()
    }

    #[test]
    fn pitch_stays_in_range_for_any_input() {
        for (seed, scale) in [(1, 5.0), (7, 500.0), (42, 1.0e6)] {
            let mut c = settled();
            let mut rig = Transform::default();
            for d in deltas(seed, 500, scale) {
                c.update(DT, d, Vec3::ZERO, &mut rig);
                assert!(c.pitch >= c.pitch_min && c.pitch <= c.pitch_max, "pitch {}", c.pitch);
            }
        }
        let mut c = settled();
        c.apply_look(Vec2::new(f32::NAN, f32::INFINITY));
        assert!(c.pitch.is_finite() && c.yaw.is_finite());
    }

    #[test]
    fn mouse_up_raises_pitch_and_mouse_right_turns_negative_yaw() {
        let mut c = settled();
        let (yaw0, pitch0) = (c.yaw, c.pitch);
        c.apply_look(Vec2::new(10.0, -10.0));
        let step = 0.2f32.to_radians() * 10.0;
        assert!((c.yaw - (yaw0 - step)).abs() < 1e-6);
        assert!((c.pitch - (pitch0 + step)).abs() < 1e-6);
    }

    #[test]
    fn target_never_below_floor() {
        let mut c = settled();
        c.pitch = c.pitch_min;
        for y in [-50.0, -1.0, 0.0, 0.2, 3.0] {
            let target = c.orbit_target(Vec3::new(2.0, y, -4.0));
            assert!(target.y >= c.floor_height, "body y {y} gave {}", target.y);
        }
    }

    #[test]
    fn orbit_target_matches_spherical_offset() {
        let mut c = settled();
        c.yaw = 0.0;
        c.pitch = 0.0;
        let target = c.orbit_target(Vec3::new(0.0, 1.0, 0.0));
        assert!((target - Vec3::new(0.0, 1.0 + c.height_offset, -c.distance)).length() < 1e-5);

        c.yaw = std::f32::consts::FRAC_PI_2;
        c.pitch = 30f32.to_radians();
        let target = c.orbit_target(Vec3::new(0.0, 1.0, 0.0));
        let horizontal = c.distance * c.pitch.cos();
        let vertical = c.distance * c.pitch.sin();
        assert!((target - Vec3::new(-horizontal, 1.0 + vertical + c.height_offset, 0.0)).length() < 1e-4);
    }

    #[test]
    fn settles_then_becomes_active() {
        let mut c = camera();
        let frames = c.settle_frames;
        assert!(frames > 0);
        let mut rig = Transform::from_xyz(0.0, 3.0, 5.0);
        let (yaw0, pitch0) = (c.yaw, c.pitch);

        for i in 0..frames {
            assert_eq!(c.mode(), CameraMode::Settling);
            let body = Vec3::new(i as f32, 1.0, 0.0);
            c.update(DT, Vec2::new(40.0, 40.0), body, &mut rig);
            assert_eq!((c.yaw, c.pitch), (yaw0, pitch0));
            assert!((c.target_position() - c.orbit_target(body)).length() < 1e-6);
        }

        assert_eq!(c.mode(), CameraMode::Active);
        c.update(DT, Vec2::new(40.0, 0.0), Vec3::ZERO, &mut rig);
        assert!(c.yaw < yaw0);

        c.begin_settling();
        assert_eq!(c.mode(), CameraMode::Settling);
    }

    #[test]
    fn eases_towards_target_and_aims_at_pivot() {
        let mut c = settled();
        let body = Vec3::new(0.0, 1.0, 0.0);
        let mut rig = Transform::from_xyz(10.0, 10.0, 10.0);
        let target = c.orbit_target(body);
        let before = rig.translation.distance(target);
        c.update(DT, Vec2::ZERO, body, &mut rig);
        let after = rig.translation.distance(target);
        assert!(after < before);
        let expected = Vec3::new(10.0, 10.0, 10.0).lerp(target, DT * c.smooth_speed);
        assert!((rig.translation - expected).length() < 1e-4);

        let to_pivot = (c.pivot(body) - rig.translation).normalize();
        assert!((rig.direction() - to_pivot).length() < 1e-4);
    }

    #[test]
    fn snap_places_camera_on_target() {
        let mut c = camera();
        let mut rig = Transform::default();
        let body = Vec3::new(1.0, 1.0, 1.0);
        c.snap(body, &mut rig);
        assert_eq!(rig.translation, c.orbit_target(body));
        assert_eq!(c.mode(), CameraMode::Settling);
    }

    #[test]
    fn reapplying_settings_reclamps_pitch() {
        let mut c = settled();
        c.pitch = c.pitch_max;
        let narrower = CameraSettings { pitch_max_degrees: 30.0, ..CameraSettings::default() };
        c.apply_settings(&narrower, 1.0, 1.0 / 15.0);
        assert!((c.pitch - 30f32.to_radians()).abs() < 1e-6);
    }
}
