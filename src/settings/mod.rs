//! Settings, types and defaults.
//!
//! Settings are stored as a RON file under `data/settings/` and are
//! hot-reloadable (see [`loader`]). Every tuning constant the character,
//! camera and animation code reads lives here so it can be recalibrated
//! without touching control flow.
use bevy::prelude::{KeyCode, Resource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod loader;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphicsSettings {
    #[serde(default = "GraphicsSettings::default_vsync")]
    pub vsync: bool, // Cap FPS to the display refresh rate.
    #[serde(default = "GraphicsSettings::default_shadows")]
    pub shadows: bool, // Directional light shadows.
}

impl GraphicsSettings {
    fn default_vsync() -> bool { true }
    fn default_shadows() -> bool { true }
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self {
            vsync: Self::default_vsync(),
            shadows: Self::default_shadows(),
        }
    }
}

/// Controls / input settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlsSettings {
    #[serde(default)]
    pub invert_y: bool, // Invert mouse Y axis
    #[serde(default)]
    pub invert_x: bool, // Invert mouse X axis
    #[serde(default = "ControlsSettings::default_sensitivity")]
    pub mouse_sensitivity: f32, // Multiplier on top of `camera.sensitivity_degrees`
    #[serde(default = "ControlsSettings::default_keybinds")]
    pub keybinds: HashMap<String, String>, // Action name -> key or mouse button name
}

impl ControlsSettings {
    fn default_sensitivity() -> f32 { 1.0 }

    fn default_keybinds() -> HashMap<String, String> {
        [
            ("forward", "W"),
            ("back", "S"),
            ("left", "A"),
            ("right", "D"),
            ("jump", "Space"),
            ("attack", "MouseLeft"),
            ("pause", "Escape"),
            ("toggle_debug", "F1"),
            ("toggle_gizmos", "F2"),
            ("dump_debug", "F3"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    /// Binding name for `action`, falling back to the built-in default when
    /// the user's map leaves it out.
    #[must_use]
    pub fn binding_name(&self, action: &str) -> Option<String> {
        self.keybinds
            .get(action)
            .cloned()
            .or_else(|| Self::default_keybinds().remove(action))
    }
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            invert_y: false,
            invert_x: false,
            mouse_sensitivity: Self::default_sensitivity(),
            keybinds: Self::default_keybinds(),
        }
    }
}

/// Character movement tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionSettings {
    /// Horizontal speed while grounded (units/s).
    pub move_speed: f32,
    /// Upward impulse applied on a grounded jump edge.
    pub jump_force: f32,
    /// Extra impulse along the walk direction when jumping while moving.
    pub jump_forward_impulse: f32,
    /// Air steering impulse per second.
    pub air_control_force: f32,
    /// Air steering stops adding impulse at or above this horizontal speed.
    pub max_air_speed: f32,
    /// `|vertical velocity|` below this counts as grounded.
    pub ground_threshold: f32,
    /// Added to the camera-derived yaw so the body faces forward. Depends on
    /// the model's zero-angle convention.
    pub yaw_offset_degrees: f32,
    /// Frame delta is clamped to this before impulse and smoothing math.
    pub max_delta_seconds: f32,
}

impl Default for LocomotionSettings {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            jump_force: 7.0,
            jump_forward_impulse: 5.0,
            air_control_force: 10.0,
            max_air_speed: 6.0,
            ground_threshold: 0.1,
            yaw_offset_degrees: -90.0,
            max_delta_seconds: 1.0 / 15.0,
        }
    }
}

/// Orbit camera tuning. Angles are in degrees here and converted once when
/// the camera is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub distance: f32,
    pub initial_yaw_degrees: f32,
    pub initial_pitch_degrees: f32,
    pub pitch_min_degrees: f32,
    pub pitch_max_degrees: f32,
    /// Degrees of rotation per pixel of mouse travel.
    pub sensitivity_degrees: f32,
    pub smooth_speed: f32,
    /// Raises the orbit pivot from the body origin to roughly chest height.
    pub height_offset: f32,
    /// The camera target never goes below this world height.
    pub floor_height: f32,
    /// Frames after creation or cursor capture during which mouse input is ignored.
    pub settle_frames: u32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            distance: 4.0,
            initial_yaw_degrees: 0.0,
            initial_pitch_degrees: 20.0,
            pitch_min_degrees: -10.0,
            pitch_max_degrees: 60.0,
            sensitivity_degrees: 0.2,
            smooth_speed: 5.0,
            height_offset: 0.5,
            floor_height: 0.5,
            settle_frames: 5,
            fov_degrees: 67.0,
            near: 0.5,
            far: 100.0,
        }
    }
}

/// Clip names as they appear in the character's glTF file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipNames {
    pub idle: String,
    pub walk_forward: String,
    pub walk_backward: String,
    pub strafe_left: String,
    pub strafe_right: String,
    pub jump: String,
    pub attack: String,
}

impl Default for ClipNames {
    fn default() -> Self {
        Self {
            idle: "Idle".into(),
            walk_forward: "WalkForward".into(),
            walk_backward: "WalkBackward".into(),
            strafe_left: "StrafeLeft".into(),
            strafe_right: "StrafeRight".into(),
            jump: "Jump".into(),
            attack: "Attack".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// glTF asset path (relative to `assets/`). Empty, the default, keeps the
    /// capsule and runs animation selection without clips.
    pub model_path: String,
    /// Vertical offset of the model root from the body centre.
    pub model_offset: f32,
    pub model_scale: f32,
    pub clips: ClipNames,
    pub playback_speed: f32,
    pub locomotion_blend_seconds: f32,
    pub jump_blend_seconds: f32,
    pub attack_blend_seconds: f32,
    /// Blend used when an attack finishes and the character returns to idle.
    pub recover_blend_seconds: f32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            model_path: String::new(),
            model_offset: -1.0,
            model_scale: 1.0,
            clips: ClipNames::default(),
            playback_speed: 1.0,
            locomotion_blend_seconds: 0.2,
            jump_blend_seconds: 0.1,
            attack_blend_seconds: 0.2,
            recover_blend_seconds: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    pub gravity: f32,
    pub ground_height: f32,
    pub fixed_timestep: f32,
    pub max_substeps: u32,
    pub body_mass: f32,
    pub capsule_radius: f32,
    /// Height of the capsule's cylindrical section (caps excluded).
    pub capsule_height: f32,
    pub spawn_height: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: -9.8,
            ground_height: 0.0,
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 5,
            body_mass: 1.0,
            capsule_radius: 0.5,
            capsule_height: 1.0,
            spawn_height: 5.0,
        }
    }
}

/// Top-level Settings
#[derive(Resource, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub graphics: GraphicsSettings,
    #[serde(default)]
    pub controls: ControlsSettings,
    #[serde(default)]
    pub locomotion: LocomotionSettings,
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub animation: AnimationSettings,
    #[serde(default)]
    pub physics: PhysicsSettings,
}

impl Settings {
    #[must_use]
    pub fn defaults() -> Self { Settings::default() }

    /// Convert a key identifier from `controls.keybinds` (e.g. "W", "Space",
    /// "F3") into a Bevy `KeyCode`. Case-insensitive.
    #[must_use]
    pub fn keycode_from_str(name: &str) -> Option<KeyCode> {
        const LETTERS: [KeyCode; 26] = [
            KeyCode::KeyA, KeyCode::KeyB, KeyCode::KeyC, KeyCode::KeyD, KeyCode::KeyE,
            KeyCode::KeyF, KeyCode::KeyG, KeyCode::KeyH, KeyCode::KeyI, KeyCode::KeyJ,
            KeyCode::KeyK, KeyCode::KeyL, KeyCode::KeyM, KeyCode::KeyN, KeyCode::KeyO,
            KeyCode::KeyP, KeyCode::KeyQ, KeyCode::KeyR, KeyCode::KeyS, KeyCode::KeyT,
            KeyCode::KeyU, KeyCode::KeyV, KeyCode::KeyW, KeyCode::KeyX, KeyCode::KeyY,
            KeyCode::KeyZ,
        ];
        const DIGITS: [KeyCode; 10] = [
            KeyCode::Digit0, KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3, KeyCode::Digit4,
            KeyCode::Digit5, KeyCode::Digit6, KeyCode::Digit7, KeyCode::Digit8, KeyCode::Digit9,
        ];
        const FUNCTION: [KeyCode; 12] = [
            KeyCode::F1, KeyCode::F2, KeyCode::F3, KeyCode::F4, KeyCode::F5, KeyCode::F6,
            KeyCode::F7, KeyCode::F8, KeyCode::F9, KeyCode::F10, KeyCode::F11, KeyCode::F12,
        ];

        let s = name.trim().to_ascii_uppercase();
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_uppercase() {
                return Some(LETTERS[(c as u8 - b'A') as usize]);
            }
            if c.is_ascii_digit() {
                return Some(DIGITS[(c as u8 - b'0') as usize]);
            }
        }

        if let Some(n) = s.strip_prefix('F').and_then(|rest| rest.parse::<usize>().ok()) {
            return n.checked_sub(1).and_then(|i| FUNCTION.get(i)).copied();
        }

        Some(match s.as_str() {
            "LEFT" | "ARROWLEFT" => KeyCode::ArrowLeft,
            "RIGHT" | "ARROWRIGHT" => KeyCode::ArrowRight,
            "UP" | "ARROWUP" => KeyCode::ArrowUp,
            "DOWN" | "ARROWDOWN" => KeyCode::ArrowDown,
            "ESC" | "ESCAPE" => KeyCode::Escape,
            "SPACE" => KeyCode::Space,
            "TAB" => KeyCode::Tab,
            "ENTER" | "RETURN" => KeyCode::Enter,
            "BACKSPACE" => KeyCode::Backspace,
            "LSHIFT" | "SHIFT" => KeyCode::ShiftLeft,
            "RSHIFT" => KeyCode::ShiftRight,
            "LCTRL" | "CTRL" | "CONTROL" => KeyCode::ControlLeft,
            "RCTRL" => KeyCode::ControlRight,
            "LALT" | "ALT" => KeyCode::AltLeft,
            "RALT" => KeyCode::AltRight,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keycodes_parse_case_insensitively() {
        assert_eq!(Settings::keycode_from_str("w"), Some(KeyCode::KeyW));
        assert_eq!(Settings::keycode_from_str("Space"), Some(KeyCode::Space));
        assert_eq!(Settings::keycode_from_str("7"), Some(KeyCode::Digit7));
        assert_eq!(Settings::keycode_from_str("f3"), Some(KeyCode::F3));
        assert_eq!(Settings::keycode_from_str("F12"), Some(KeyCode::F12));
        assert_eq!(Settings::keycode_from_str("F0"), None);
        assert_eq!(Settings::keycode_from_str("F13"), None);
        assert_eq!(Settings::keycode_from_str("MouseLeft"), None);
        assert_eq!(Settings::keycode_from_str(""), None);
    }

    #[test]
    fn model_is_opt_in() {
        assert!(AnimationSettings::default().model_path.is_empty());
        let parsed: Settings = ron::from_str(r#"(animation: (model_path: "characters/knight.glb"))"#)
            .expect("animation settings parse");
        assert_eq!(parsed.animation.model_path, "characters/knight.glb");
        assert_eq!(parsed.animation.clips, ClipNames::default());
    }

    #[test]
    fn partial_ron_keeps_defaults() {
        let text = "(locomotion: (move_speed: 8.0), camera: (distance: 6.0))";
        let parsed: Settings = ron::from_str(text).expect("partial settings parse");
        assert_eq!(parsed.locomotion.move_speed, 8.0);
        assert_eq!(parsed.locomotion.jump_force, LocomotionSettings::default().jump_force);
        assert_eq!(parsed.camera.distance, 6.0);
        assert_eq!(parsed.camera.pitch_max_degrees, 60.0);
        assert_eq!(parsed.controls, ControlsSettings::default());
    }

    #[test]
    fn missing_binding_falls_back_to_default() {
        let mut controls = ControlsSettings::default();
        controls.keybinds.clear();
        controls.keybinds.insert("jump".into(), "J".into());
        assert_eq!(controls.binding_name("jump").as_deref(), Some("J"));
        assert_eq!(controls.binding_name("attack").as_deref(), Some("MouseLeft"));
        assert_eq!(controls.binding_name("dance"), None);
    }
}
