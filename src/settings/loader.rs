//! Settings loading and hot-reloading.
//!
//! Settings are read from the `.ron` files in `data/settings`. The first file
//! (by name) that parses wins; with none, defaults are used.
use crate::ron_loader::{load_ron_files, setup_ron_watcher};
use crate::settings::Settings;
use bevy::log::info;
use bevy::prelude::{Res, ResMut, Resource};

pub const SETTINGS_DIR: &str = "data/settings";

#[derive(Resource)]
pub struct SettingsWatcher(pub crate::ron::RonWatcher);

/// Load settings from the directory at `path`.
///
/// # Arguments
/// * `path` - Directory holding one or more settings `.ron` files.
///
/// # Return
/// The first file (by name) that parses as `Settings`. Fields missing from
/// that file take their defaults. With no usable file, `Settings::defaults()`.
#[must_use]
pub fn load_settings_from_dir(path: &str) -> Settings {
    let items: Vec<Settings> = load_ron_files(path);
    if let Some(first) = items.into_iter().next() {
        first
    } else {
        info!("no usable settings in {path}, using defaults");
        Settings::defaults()
    }
}

/// Create a watcher for the settings directory.
///
/// # Errors
/// Propagates the `notify::Error` if the directory cannot be watched.
pub fn setup_settings_watcher(path: &str) -> Result<SettingsWatcher, notify::Error> {
    setup_ron_watcher(path).map(SettingsWatcher)
}

/// Reload the `Settings` resource when the watcher reports a change.
///
/// Only writes the resource when the reloaded value differs, so
/// change-detection driven sync systems stay quiet on no-op saves.
#[allow(clippy::needless_pass_by_value)]
pub fn check_settings_changes(watcher: Res<SettingsWatcher>, mut settings: ResMut<Settings>) {
    if !watcher.0.take_changed() {
        return;
    }
    let reloaded = load_settings_from_dir(SETTINGS_DIR);
    if *settings != reloaded {
        info!("settings changed, reloaded from {SETTINGS_DIR}");
        *settings = reloaded;
    }
}

impl SettingsWatcher {
    #[must_use]
    pub fn stub() -> Self {
        SettingsWatcher(crate::ron::RonWatcher::stub())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{AnimationSettings, CameraSettings, ControlsSettings};

    #[test]
    fn shipped_settings_parse() {
        let settings = load_settings_from_dir(SETTINGS_DIR);
        assert_eq!(settings.camera, CameraSettings::default());
        assert_eq!(settings.animation, AnimationSettings::default());
        assert!(settings.animation.model_path.is_empty(), "shipped config must not point at a missing model");
        assert_eq!(settings.controls, ControlsSettings::default());
        assert!((settings.locomotion.max_delta_seconds - 1.0 / 15.0).abs() < 1e-3);
    }

    #[test]
    fn first_parsing_file_wins_and_fills_defaults() {
        let dir = std::env::temp_dir().join(format!("wayfarer-settings-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("a.ron"), "(camera: (distance: \"far\"))").unwrap();
        std::fs::write(dir.join("b.ron"), "(camera: (distance: 7.5))").unwrap();
        std::fs::write(dir.join("c.ron"), "(camera: (distance: 2.0))").unwrap();

        let settings = load_settings_from_dir(dir.to_str().unwrap());
        assert_eq!(settings.camera.distance, 7.5);
        assert_eq!(settings.camera.pitch_max_degrees, CameraSettings::default().pitch_max_degrees);
        assert_eq!(settings.animation, AnimationSettings::default());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_dir_gives_defaults() {
        assert_eq!(load_settings_from_dir("data/does-not-exist"), Settings::defaults());
    }
}
