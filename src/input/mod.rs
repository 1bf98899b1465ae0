//! Logical input: action bindings and the per-frame [`InputState`] snapshot.
//!
//! Character code never looks at raw devices. Each frame [`gather_input`]
//! folds keyboard, mouse buttons and mouse motion into one snapshot that the
//! locomotion, camera and animation updates read.

pub mod cursor;

use crate::settings::{ControlsSettings, Settings};
use bevy::input::mouse::MouseMotion;
use bevy::log::warn;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

pub use cursor::cursor_grab;

/// Snapshot of one frame of player intent.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub strafe_left: bool,
    pub strafe_right: bool,
    pub jump_held: bool,
    /// Rising edge of the jump binding this frame. Holding does not repeat.
    pub jump_pressed: bool,
    pub attack_held: bool,
    pub attack_pressed: bool,
    /// Mouse travel since last frame, in pixels, after axis inversion.
    pub mouse_delta: Vec2,
}

impl InputState {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn any_direction_held(&self) -> bool {
        self.forward || self.backward || self.strafe_left || self.strafe_right
    }
}

/// A physical control a logical action can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Key(KeyCode),
    Mouse(MouseButton),
}

impl Binding {
    /// Parse a binding name: any name [`Settings::keycode_from_str`] accepts,
    /// or `MouseLeft` / `MouseRight` / `MouseMiddle`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "MOUSELEFT" | "LMB" => Some(Binding::Mouse(MouseButton::Left)),
            "MOUSERIGHT" | "RMB" => Some(Binding::Mouse(MouseButton::Right)),
            "MOUSEMIDDLE" | "MMB" => Some(Binding::Mouse(MouseButton::Middle)),
            _ => Settings::keycode_from_str(name).map(Binding::Key),
        }
    }

    #[must_use]
    pub fn pressed(self, keys: &ButtonInput<KeyCode>, buttons: &ButtonInput<MouseButton>) -> bool {
        match self {
            Binding::Key(k) => keys.pressed(k),
            Binding::Mouse(b) => buttons.pressed(b),
        }
    }

    #[must_use]
    pub fn just_pressed(self, keys: &ButtonInput<KeyCode>, buttons: &ButtonInput<MouseButton>) -> bool {
        match self {
            Binding::Key(k) => keys.just_pressed(k),
            Binding::Mouse(b) => buttons.just_pressed(b),
        }
    }
}

/// Resolved bindings for every logical action.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ActionBindings {
    pub forward: Binding,
    pub back: Binding,
    pub left: Binding,
    pub right: Binding,
    pub jump: Binding,
    pub attack: Binding,
    pub pause: Binding,
    pub toggle_debug: Binding,
    pub toggle_gizmos: Binding,
    pub dump_debug: Binding,
}

impl ActionBindings {
    /// Resolve `controls.keybinds`. Names that do not parse fall back to the
    /// action's default binding.
    #[must_use]
    pub fn from_controls(controls: &ControlsSettings) -> Self {
        let resolve = |action: &str, fallback: Binding| {
            match controls.binding_name(action) {
                Some(name) => Binding::parse(&name).unwrap_or_else(|| {
                    warn!("unknown binding '{name}' for action '{action}', using default");
                    fallback
                }),
                None => fallback,
            }
        };
        Self {
            forward: resolve("forward", Binding::Key(KeyCode::KeyW)),
            back: resolve("back", Binding::Key(KeyCode::KeyS)),
            left: resolve("left", Binding::Key(KeyCode::KeyA)),
            right: resolve("right", Binding::Key(KeyCode::KeyD)),
            jump: resolve("jump", Binding::Key(KeyCode::Space)),
            attack: resolve("attack", Binding::Mouse(MouseButton::Left)),
            pause: resolve("pause", Binding::Key(KeyCode::Escape)),
            toggle_debug: resolve("toggle_debug", Binding::Key(KeyCode::F1)),
            toggle_gizmos: resolve("toggle_gizmos", Binding::Key(KeyCode::F2)),
            dump_debug: resolve("dump_debug", Binding::Key(KeyCode::F3)),
        }
    }
}

impl Default for ActionBindings {
    fn default() -> Self {
        Self::from_controls(&ControlsSettings::default())
    }
}

/// Apply the configured axis inversion to a raw mouse delta.
#[must_use]
pub fn apply_inversion(delta: Vec2, controls: &ControlsSettings) -> Vec2 {
    Vec2::new(
        if controls.invert_x { -delta.x } else { delta.x },
        if controls.invert_y { -delta.y } else { delta.y },
    )
}

/// Rebuild [`ActionBindings`] when the settings resource changes.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_bindings(settings: Res<Settings>, mut bindings: ResMut<ActionBindings>) {
    if !settings.is_changed() {
        return;
    }
    let fresh = ActionBindings::from_controls(&settings.controls);
    if *bindings != fresh {
        *bindings = fresh;
    }
}

/// Fold this frame's device state into the [`InputState`] resource.
///
/// While the cursor is released nothing is gathered: the character stands
/// still and the camera ignores the mouse.
#[allow(clippy::needless_pass_by_value)]
pub fn gather_input(
    keys: Res<ButtonInput<KeyCode>>,
    buttons: Res<ButtonInput<MouseButton>>,
    mut motion: EventReader<MouseMotion>,
    windows: Query<&Window, With<PrimaryWindow>>,
    bindings: Res<ActionBindings>,
    settings: Res<Settings>,
    mut state: ResMut<InputState>,
) {
    let raw: Vec2 = motion.read().map(|ev| ev.delta).sum();

    let captured = windows.get_single().map_or(true, |w| !w.cursor.visible);
    if !captured {
        state.clear();
        return;
    }

    let (k, b) = (&*keys, &*buttons);
    *state = InputState {
        forward: bindings.forward.pressed(k, b),
        backward: bindings.back.pressed(k, b),
        strafe_left: bindings.left.pressed(k, b),
        strafe_right: bindings.right.pressed(k, b),
        jump_held: bindings.jump.pressed(k, b),
        jump_pressed: bindings.jump.just_pressed(k, b),
        attack_held: bindings.attack.pressed(k, b),
        attack_pressed: bindings.attack.just_pressed(k, b),
        mouse_delta: apply_inversion(raw, &settings.controls),
    };
}
