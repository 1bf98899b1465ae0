use super::{Character, LocomotionController, LocomotionFrame};
use crate::animation::AnimationSelector;
use crate::camera::OrbitCamera;
use crate::input::InputState;
use crate::physics::{BodyHandle, KinematicBody};
use crate::settings::Settings;
use bevy::prelude::*;

/// Run the locomotion controller for every character.
///
/// Reads the orbit camera's orientation from the previous frame, which is
/// the feedback loop that keeps the body facing wherever the player looks.
/// Must run before [`crate::physics::step_physics`].
#[allow(clippy::needless_pass_by_value, clippy::type_complexity)]
pub fn drive_locomotion(
    time: Res<Time>,
    input: Res<InputState>,
    cameras: Query<&Transform, (With<OrbitCamera>, Without<Character>)>,
    mut characters: Query<
        (
            &mut Transform,
            &mut KinematicBody,
            &LocomotionController,
            &mut LocomotionFrame,
            Option<&AnimationSelector>,
        ),
        With<Character>,
    >,
) {
    let Ok(camera) = cameras.get_single() else { return };
    let direction = *camera.forward();
    let up = *camera.up();

    for (mut transform, mut body, controller, mut frame, selector) in &mut characters {
        let blocked = selector.is_some_and(AnimationSelector::is_blocking);
        let mut handle = BodyHandle::new(&mut transform, &mut body);
        *frame = controller.update(time.delta_seconds(), direction, up, &input, blocked, &mut handle);
    }
}

/// Push edited locomotion tuning into live controllers.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_locomotion_settings(settings: Res<Settings>, mut controllers: Query<&mut LocomotionController>) {
    if !settings.is_changed() {
        return;
    }
    for mut controller in &mut controllers {
        if controller.settings != settings.locomotion {
            controller.settings = settings.locomotion.clone();
        }
    }
}
