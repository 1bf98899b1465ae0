//! Camera-relative character locomotion.
//!
//! Each frame the controller turns the body to face camera-forward, builds a
//! walk direction from held movement actions, classifies the body as grounded
//! or airborne from its vertical speed, and then writes a velocity (grounded)
//! or a capped steering impulse (airborne) onto the rigid body.
//!
//! Grounded detection is the vertical-speed heuristic, not a contact query:
//! a body at the apex of a jump reads as grounded for a frame or so. Swapping
//! in a downward ray or shape cast only changes [`classify_mode`].

pub mod systems;

use crate::input::InputState;
use crate::physics::RigidBody;
use crate::settings::LocomotionSettings;
use bevy::prelude::*;

pub use systems::drive_locomotion;

/// Marker for the player-controlled character entity.
#[derive(Component, Debug, Default)]
pub struct Character;

/// Ground/air classification, derived fresh every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocomotionMode {
    #[default]
    Grounded,
    Airborne,
}

/// Horizontal movement axes derived from the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    /// Camera direction flattened onto the ground plane. Zero when the camera
    /// looks straight up or down.
    pub forward: Vec3,
    pub strafe_right: Vec3,
}

/// Outcome of one locomotion update, kept on the character for the
/// animation selector and debug views.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct LocomotionFrame {
    pub mode: LocomotionMode,
    /// Normalized walk direction, or exactly zero for no intent.
    pub intent: Vec3,
    /// A grounded jump impulse was applied this frame.
    pub jumped: bool,
    /// An air-steering impulse was applied this frame.
    pub steered: bool,
    /// Movement input was suppressed by a blocking action.
    pub blocked: bool,
}

impl LocomotionFrame {
    #[must_use]
    pub fn has_intent(&self) -> bool {
        self.intent != Vec3::ZERO
    }
}

/// Clamp a frame delta into `[0, max]`.
#[must_use]
pub fn clamp_delta(dt: f32, max: f32) -> f32 {
    if dt.is_finite() { dt.clamp(0.0, max.max(0.0)) } else { 0.0 }
}

/// Flatten the camera direction and derive the strafe axis.
#[must_use]
pub fn camera_basis(direction: Vec3, up: Vec3) -> CameraBasis {
    let forward = Vec3::new(direction.x, 0.0, direction.z).normalize_or_zero();
    let strafe_right = forward.cross(up).normalize_or_zero();
    CameraBasis { forward, strafe_right }
}

/// Body yaw (radians about +Y) that faces `forward`.
///
/// The angle is measured from +X towards +Z on the ground plane and then
/// shifted by `offset`, which absorbs the model's zero-angle convention.
/// Returns `None` when `forward` has no horizontal extent.
#[must_use]
pub fn facing_yaw(forward: Vec3, offset: f32) -> Option<f32> {
    if forward.x == 0.0 && forward.z == 0.0 {
        return None;
    }
    let angle = forward.z.atan2(forward.x);
    Some(-angle + offset)
}

/// Sum held movement actions along the camera basis.
///
/// The result is normalized only when non-zero, so "nothing held" (or
/// opposing keys cancelling) yields exactly `Vec3::ZERO`.
#[must_use]
pub fn walk_direction(basis: &CameraBasis, input: &InputState) -> Vec3 {
    let mut dir = Vec3::ZERO;
    if input.forward {
        dir += basis.forward;
    }
    if input.backward {
        dir -= basis.forward;
    }
    if input.strafe_right {
        dir += basis.strafe_right;
    }
    if input.strafe_left {
        dir -= basis.strafe_right;
    }
    if dir.length_squared() > 0.0 { dir.normalize() } else { Vec3::ZERO }
}

#[must_use]
pub fn classify_mode(velocity: Vec3, ground_threshold: f32) -> LocomotionMode {
    if velocity.y.abs() < ground_threshold {
        LocomotionMode::Grounded
    } else {
        LocomotionMode::Airborne
    }
}

/// Per-character locomotion tuning and update logic.
#[derive(Component, Debug, Clone, Default)]
pub struct LocomotionController {
    pub settings: LocomotionSettings,
}

impl LocomotionController {
    #[must_use]
    pub fn new(settings: LocomotionSettings) -> Self {
        Self { settings }
    }

    /// Run one frame of locomotion against `body`.
    ///
    /// `blocked` is set while a blocking action (an attack) plays: intent
    /// and jump are ignored and horizontal velocity is held at zero.
    ///
    /// # Arguments
    /// * `dt` - Frame delta in seconds. Clamped to `max_delta_seconds`.
    /// * `camera_direction` / `camera_up` - Camera orientation from the
    ///   previous frame. Only the horizontal part of the direction is used.
    /// * `input` - This frame's held keys and jump edge.
    /// * `body` - The character's rigid body.
    ///
    /// # Return
    /// The frame's movement classification and intent, with `jumped` set when
    /// a grounded jump impulse was applied.
    pub fn update<B: RigidBody>(
        &self,
        dt: f32,
        camera_direction: Vec3,
        camera_up: Vec3,
        input: &InputState,
        blocked: bool,
        body: &mut B,
    ) -> LocomotionFrame {
        let s = &self.settings;
        let dt = clamp_delta(dt, s.max_delta_seconds);

        let basis = camera_basis(camera_direction, camera_up);
        if let Some(yaw) = facing_yaw(basis.forward, s.yaw_offset_degrees.to_radians()) {
            let position = body.position();
            body.set_transform(position, Quat::from_rotation_y(yaw));
        }

        let intent = if blocked { Vec3::ZERO } else { walk_direction(&basis, input) };
        let velocity = body.linear_velocity();
        let mode = classify_mode(velocity, s.ground_threshold);
        let mut frame = LocomotionFrame { mode, intent, blocked, ..default() };

        if blocked {
            body.set_linear_velocity(Vec3::new(0.0, velocity.y, 0.0));
            return frame;
        }

        match mode {
            LocomotionMode::Grounded => {
                let horizontal = intent * s.move_speed;
                body.set_linear_velocity(Vec3::new(horizontal.x, velocity.y, horizontal.z));

                if input.jump_pressed {
                    let mut impulse = Vec3::new(0.0, s.jump_force, 0.0);
                    if frame.has_intent() {
                        impulse += intent * s.jump_forward_impulse;
                    }
                    body.apply_central_impulse(impulse);
                    frame.jumped = true;
                }
            }
            LocomotionMode::Airborne => {
                if frame.has_intent() {
                    let horizontal_speed = Vec2::new(velocity.x, velocity.z).length();
                    if horizontal_speed < s.max_air_speed {
                        body.apply_central_impulse(intent * (s.air_control_force * dt));
                        frame.steered = true;
                    }
                }
            }
        }

        frame
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::RecordingBody;
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn controller() -> LocomotionController {
        LocomotionController::new(LocomotionSettings::default())
    }

    fn held(forward: bool, backward: bool, left: bool, right: bool) -> InputState {
        InputState {
            forward,
            backward,
            strafe_left: left,
            strafe_right: right,
            ..default()
        }
    }

    /// Camera looking down -Z and slightly downward, as an orbit camera does.
    fn camera_dir() -> Vec3 {
        Vec3::new(0.0, -0.3, -1.0).normalize()
    }

    #[test]
    fn no_held_direction_gives_exact_zero() {
        let basis = camera_basis(camera_dir(), Vec3::Y);
        for bits in 0..16u8 {
            let input = held(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0, bits & 8 != 0);
            let dir = walk_direction(&basis, &input);
            if !input.any_direction_held() {
                assert_eq!(dir, Vec3::ZERO);
            }
            assert!(dir == Vec3::ZERO || (dir.length() - 1.0).abs() < 1e-5, "bits {bits}: {dir}");
            assert!(dir.is_finite());
        }
    }

    #[test]
    fn opposing_keys_cancel_to_zero() {
        let basis = camera_basis(camera_dir(), Vec3::Y);
        assert_eq!(walk_direction(&basis, &held(true, true, false, false)), Vec3::ZERO);
        assert_eq!(walk_direction(&basis, &held(false, false, true, true)), Vec3::ZERO);
    }

    #[test]
    fn basis_is_flat_and_right_handed() {
        let basis = camera_basis(camera_dir(), Vec3::Y);
        assert!((basis.forward - Vec3::NEG_Z).length() < 1e-5);
        assert!((basis.strafe_right - Vec3::X).length() < 1e-5);

        let straight_down = camera_basis(Vec3::NEG_Y, Vec3::Z);
        assert_eq!(straight_down.forward, Vec3::ZERO);
        assert_eq!(straight_down.strafe_right, Vec3::ZERO);
    }

    #[test]
    fn facing_offset_points_model_forward_along_camera() {
        let offset = LocomotionSettings::default().yaw_offset_degrees.to_radians();
        for forward in [Vec3::NEG_Z, Vec3::X, Vec3::Z, Vec3::new(1.0, 0.0, 1.0).normalize()] {
            let yaw = facing_yaw(forward, offset).unwrap();
            let model_forward = Quat::from_rotation_y(yaw) * Vec3::NEG_Z;
            assert!((model_forward - forward).length() < 1e-5, "{forward} -> {model_forward}");
        }
        assert_eq!(facing_yaw(Vec3::ZERO, offset), None);
    }

    #[test]
    fn update_rotates_body_and_keeps_position() {
        let mut body = RecordingBody {
            position: Vec3::new(3.0, 1.0, -2.0),
            ..default()
        };
        controller().update(DT, Vec3::X, Vec3::Y, &InputState::default(), false, &mut body);
        assert_eq!(body.position, Vec3::new(3.0, 1.0, -2.0));
        let (_, pitch, roll) = body.rotation.to_euler(EulerRot::YXZ);
        assert!(pitch.abs() < 1e-6 && roll.abs() < 1e-6);
        assert!((body.rotation * Vec3::NEG_Z - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn grounded_walk_sets_horizontal_velocity_and_keeps_vertical() {
        let mut body = RecordingBody {
            velocity: Vec3::new(9.0, 0.05, 9.0),
            ..default()
        };
        let frame = controller().update(DT, camera_dir(), Vec3::Y, &held(true, false, false, false), false, &mut body);
        assert_eq!(frame.mode, LocomotionMode::Grounded);
        assert!((body.velocity - Vec3::new(0.0, 0.05, -5.0)).length() < 1e-5);
        assert!(body.impulses.is_empty());

        let frame = controller().update(DT, camera_dir(), Vec3::Y, &InputState::default(), false, &mut body);
        assert!(!frame.has_intent());
        assert_eq!(body.velocity, Vec3::new(0.0, 0.05, 0.0));
    }

    #[test]
    fn grounded_jump_applies_one_impulse_per_edge() {
        let c = controller();
        let mut body = RecordingBody::default();
        let mut input = InputState { jump_held: true, jump_pressed: true, ..default() };

        let frame = c.update(DT, camera_dir(), Vec3::Y, &input, false, &mut body);
        assert!(frame.jumped);
        assert_eq!(body.impulses.len(), 1);
        assert!(body.impulses[0].y >= c.settings.jump_force);

        // Still held, no new edge. Pretend physics has not moved the body yet.
        input.jump_pressed = false;
        body.velocity.y = 0.0;
        let frame = c.update(DT, camera_dir(), Vec3::Y, &input, false, &mut body);
        assert!(!frame.jumped);
        assert_eq!(body.impulses.len(), 1);
    }

    #[test]
    fn running_jump_carries_forward_momentum() {
        let c = controller();
        let mut body = RecordingBody::default();
        let input = InputState { forward: true, jump_pressed: true, ..default() };
        c.update(DT, camera_dir(), Vec3::Y, &input, false, &mut body);
        let impulse = body.impulses[0];
        assert_eq!(impulse.y, c.settings.jump_force);
        assert!((impulse.z + c.settings.jump_forward_impulse).abs() < 1e-5);
    }

    #[test]
    fn airborne_ignores_jump() {
        let mut body = RecordingBody {
            velocity: Vec3::new(0.0, 3.0, 0.0),
            ..default()
        };
        let input = InputState { jump_pressed: true, ..default() };
        let frame = controller().update(DT, camera_dir(), Vec3::Y, &input, false, &mut body);
        assert_eq!(frame.mode, LocomotionMode::Airborne);
        assert!(!frame.jumped);
        assert!(body.impulses.is_empty());
    }

    #[test]
    fn air_steering_stops_at_speed_cap() {
        let c = controller();
        let forward = held(true, false, false, false);

        let mut slow = RecordingBody {
            velocity: Vec3::new(0.0, -2.0, -1.0),
            ..default()
        };
        let frame = c.update(DT, camera_dir(), Vec3::Y, &forward, false, &mut slow);
        assert!(frame.steered);
        let expected = c.settings.air_control_force * DT;
        assert!((slow.impulses[0] - Vec3::new(0.0, 0.0, -expected)).length() < 1e-5);

        for speed in [c.settings.max_air_speed, c.settings.max_air_speed + 3.0] {
            let mut fast = RecordingBody {
                velocity: Vec3::new(speed, -2.0, 0.0),
                ..default()
            };
            let frame = c.update(DT, camera_dir(), Vec3::Y, &forward, false, &mut fast);
            assert!(!frame.steered);
            assert!(fast.impulses.is_empty());
            assert_eq!(fast.velocity, Vec3::new(speed, -2.0, 0.0));
        }
    }

    #[test]
    fn blocked_body_cannot_move_or_jump() {
        let mut body = RecordingBody {
            velocity: Vec3::new(4.0, 0.0, -3.0),
            ..default()
        };
        let input = InputState { forward: true, jump_pressed: true, ..default() };
        let frame = controller().update(DT, camera_dir(), Vec3::Y, &input, true, &mut body);
        assert!(frame.blocked);
        assert!(!frame.has_intent());
        assert!(body.impulses.is_empty());
        assert_eq!(body.velocity, Vec3::ZERO);
    }

    #[test]
    fn huge_delta_is_clamped_before_air_impulse() {
        let c = controller();
        let mut body = RecordingBody {
            velocity: Vec3::new(0.0, -5.0, 0.0),
            ..default()
        };
        c.update(5.0, camera_dir(), Vec3::Y, &held(true, false, false, false), false, &mut body);
        let max = c.settings.air_control_force * c.settings.max_delta_seconds;
        assert!(body.impulses[0].length() <= max + 1e-5);
        assert_eq!(clamp_delta(f32::NAN, 0.1), 0.0);
        assert_eq!(clamp_delta(-1.0, 0.1), 0.0);
    }

    #[test]
    fn ground_threshold_boundary() {
        assert_eq!(classify_mode(Vec3::new(5.0, 0.0, 5.0), 0.1), LocomotionMode::Grounded);
        assert_eq!(classify_mode(Vec3::new(0.0, -0.099, 0.0), 0.1), LocomotionMode::Grounded);
        assert_eq!(classify_mode(Vec3::new(0.0, 0.1, 0.0), 0.1), LocomotionMode::Airborne);
    }
}
