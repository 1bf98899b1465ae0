//! Display-related systems: graphics settings pushed into the window and the
//! sun light at runtime.
use super::setup::Sun;
use bevy::prelude::*;
use bevy::window::{PresentMode, PrimaryWindow};
use wayfarer::settings::GraphicsSettings;
use wayfarer::settings::Settings;

/// Apply `Settings.graphics` (vsync, shadows) whenever it differs from what
/// was last applied.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_graphics_settings(
    settings: Res<Settings>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut suns: Query<&mut DirectionalLight, With<Sun>>,
    mut last: Local<Option<GraphicsSettings>>,
) {
    let desired = &settings.graphics;
    if last.as_ref() == Some(desired) {
        return;
    }

    for mut w in &mut windows {
        w.present_mode = if desired.vsync { PresentMode::Fifo } else { PresentMode::AutoNoVsync };
    }
    for mut light in &mut suns {
        light.shadows_enabled = desired.shadows;
    }
    debug!("graphics settings applied: vsync={} shadows={}", desired.vsync, desired.shadows);
    *last = Some(desired.clone());
}
