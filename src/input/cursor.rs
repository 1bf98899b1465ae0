//! Cursor capture.
//!
//! Left click captures and hides the cursor, the pause binding releases it.
//! Every fresh capture restarts the orbit camera's settling countdown so the
//! first sampled mouse delta cannot snap the view.

use super::ActionBindings;
use crate::camera::OrbitCamera;
use bevy::log::debug;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};

/// Toggle cursor grab and visibility.
///
/// Runs after [`super::gather_input`] so the click that captures the cursor
/// is not also read as an attack.
#[allow(clippy::needless_pass_by_value)]
pub fn cursor_grab(
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    buttons: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    bindings: Res<ActionBindings>,
    mut cameras: Query<&mut OrbitCamera>,
) {
    let Ok(mut window) = windows.get_single_mut() else { return };

    if window.cursor.visible && buttons.just_pressed(MouseButton::Left) {
        window.cursor.grab_mode = CursorGrabMode::Locked;
        window.cursor.visible = false;
        for mut camera in &mut cameras {
            camera.begin_settling();
        }
        debug!("cursor captured");
    }

    if !window.cursor.visible && bindings.pause.just_pressed(&keys, &buttons) {
        window.cursor.grab_mode = CursorGrabMode::None;
        window.cursor.visible = true;
        debug!("cursor released");
    }
}
