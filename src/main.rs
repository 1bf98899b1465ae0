use bevy::diagnostic::{FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin};
use bevy::prelude::*;
use bevy::window::{PresentMode, Window, WindowPlugin};
use wayfarer::animation::{
    attach_character_model, drive_animation, link_animation_player, load_character_gltf, process_character_gltf,
    sync_animation_settings,
};
use wayfarer::camera::{sync_camera_settings, update_orbit_camera};
use wayfarer::debug::DebugDumpPlugin;
use wayfarer::input::{cursor_grab, gather_input, sync_bindings, ActionBindings, InputState};
use wayfarer::locomotion::drive_locomotion;
use wayfarer::locomotion::systems::sync_locomotion_settings;
use wayfarer::physics::{step_physics, world::sync_physics_settings, PhysicsWorld};
use wayfarer::settings::loader as settings_loader;
use wayfarer::ui::{
    render_debug_gizmos, setup_debug_overlay, spawn_debug_overlay, toggle_debug_gizmos, toggle_debug_overlay,
    update_debug_overlay,
};

mod app;
use app::{setup, sync_graphics_settings};

/// Per-frame ordering of the character core.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
enum FrameSet {
    /// Settings reload and the sync systems that push it into components.
    Config,
    /// Input, locomotion, physics, camera, animation, strictly in that order.
    Core,
    Debug,
}

fn main() {
    let settings = settings_loader::load_settings_from_dir(settings_loader::SETTINGS_DIR);
    let settings_watcher = settings_loader::setup_settings_watcher(settings_loader::SETTINGS_DIR)
        .unwrap_or_else(|e| {
            warn!("settings hot reload disabled: {e}");
            settings_loader::SettingsWatcher::stub()
        });

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "wayfarer".into(),
                position: WindowPosition::Centered(MonitorSelection::Primary),
                present_mode: if settings.graphics.vsync { PresentMode::Fifo } else { PresentMode::AutoNoVsync },
                ..default()
            }),
            ..default()
        }))
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .add_plugins(LogDiagnosticsPlugin::default())
        .add_plugins(DebugDumpPlugin);

    app.insert_resource(PhysicsWorld::from_settings(&settings.physics));
    app.insert_resource(ActionBindings::from_controls(&settings.controls));
    app.insert_resource(InputState::default());
    app.insert_resource(settings);
    app.insert_resource(settings_watcher);

    app.configure_sets(Update, (FrameSet::Config, FrameSet::Core, FrameSet::Debug).chain());

    app.add_systems(Startup, (setup_debug_overlay, spawn_debug_overlay, setup, load_character_gltf));

    app.add_systems(
        Update,
        (
            settings_loader::check_settings_changes,
            (
                sync_bindings,
                sync_locomotion_settings,
                sync_physics_settings,
                sync_camera_settings,
                sync_animation_settings,
                sync_graphics_settings,
            ),
        )
            .chain()
            .in_set(FrameSet::Config),
    );

    app.add_systems(Update, (process_character_gltf, attach_character_model, link_animation_player).chain());

    app.add_systems(
        Update,
        (
            gather_input,
            cursor_grab,
            drive_locomotion,
            step_physics,
            update_orbit_camera,
            drive_animation,
        )
            .chain()
            .in_set(FrameSet::Core),
    );

    app.add_systems(
        Update,
        (toggle_debug_overlay, toggle_debug_gizmos, update_debug_overlay, render_debug_gizmos).in_set(FrameSet::Debug),
    );

    app.run();
}
