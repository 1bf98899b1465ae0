use super::OrbitCamera;
use crate::input::InputState;
use crate::locomotion::Character;
use crate::settings::Settings;
use bevy::prelude::*;

/// Orbit every camera around the character.
///
/// Runs after physics so the camera chases this frame's body position, and
/// before the next locomotion update reads the camera's direction.
#[allow(clippy::needless_pass_by_value)]
pub fn update_orbit_camera(
    time: Res<Time>,
    input: Res<InputState>,
    characters: Query<&Transform, (With<Character>, Without<OrbitCamera>)>,
    mut cameras: Query<(&mut Transform, &mut OrbitCamera)>,
) {
    let Ok(character) = characters.get_single() else { return };
    let body = character.translation;

    for (mut transform, mut orbit) in &mut cameras {
        orbit.update(time.delta_seconds(), input.mouse_delta, body, &mut *transform);
    }
}

/// Push edited camera tuning and projection into live cameras.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_camera_settings(settings: Res<Settings>, mut cameras: Query<(&mut OrbitCamera, &mut Projection)>) {
    if !settings.is_changed() {
        return;
    }
    let cam = &settings.camera;
    for (mut orbit, mut projection) in &mut cameras {
        orbit.apply_settings(cam, settings.controls.mouse_sensitivity, settings.locomotion.max_delta_seconds);
        if let Projection::Perspective(p) = projection.as_mut() {
            p.fov = cam.fov_degrees.to_radians();
            p.near = cam.near;
            p.far = cam.far;
        }
    }
}
