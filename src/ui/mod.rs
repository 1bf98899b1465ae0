//! Debug views: a text overlay and a gizmo layer.
//!
//! The overlay refreshes on a timer and shows frame timing alongside the
//! character's locomotion state, the orbit camera's angles and the animation
//! selector's current clip. The gizmo layer draws the walk intent, the orbit
//! pivot and the camera's spherical target.

use crate::animation::AnimationSelector;
use crate::camera::{CameraMode, OrbitCamera};
use crate::input::ActionBindings;
use crate::locomotion::{Character, LocomotionFrame, LocomotionMode};
use crate::physics::KinematicBody;
use bevy::diagnostic::{Diagnostic, DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;

/// State for the debug overlay visibility.
#[derive(Resource, Default)]
pub struct DebugOverlayState {
    pub visible: bool,
}

#[derive(Resource, Default)]
pub struct DebugOverlayTimer(pub Timer);

#[derive(Resource, Default)]
pub struct DebugGizmosVisible(pub bool);

#[derive(Component)]
pub struct DebugOverlayText;

/// Insert debug overlay resources.
pub fn setup_debug_overlay(mut commands: Commands) {
    commands.insert_resource(DebugOverlayTimer(Timer::from_seconds(
        0.25,
        TimerMode::Repeating,
    )));
    commands.insert_resource(DebugOverlayState::default());
    commands.insert_resource(DebugGizmosVisible::default());
}

/// Spawn the (initially empty) overlay text node.
pub fn spawn_debug_overlay(mut commands: Commands) {
    commands.spawn((
        TextBundle {
            text: Text::from_section(
                "",
                TextStyle {
                    font_size: 18.0,
                    color: Color::srgb(1.0, 1.0, 0.0),
                    ..default()
                },
            ),
            style: Style {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(10.0),
                ..default()
            },
            ..default()
        },
        DebugOverlayText,
    ));
}

#[allow(clippy::needless_pass_by_value)]
pub fn toggle_debug_overlay(
    mut state: ResMut<DebugOverlayState>,
    keys: Res<ButtonInput<KeyCode>>,
    buttons: Res<ButtonInput<MouseButton>>,
    bindings: Res<ActionBindings>,
) {
    if bindings.toggle_debug.just_pressed(&keys, &buttons) {
        state.visible = !state.visible;
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn toggle_debug_gizmos(
    mut gizmos: ResMut<DebugGizmosVisible>,
    keys: Res<ButtonInput<KeyCode>>,
    buttons: Res<ButtonInput<MouseButton>>,
    bindings: Res<ActionBindings>,
) {
    if bindings.toggle_gizmos.just_pressed(&keys, &buttons) {
        gizmos.0 = !gizmos.0;
    }
}

/// System parameters for [`update_debug_overlay`], grouped to keep the
/// signature readable.
#[derive(bevy::ecs::system::SystemParam)]
pub struct DebugOverlayCtx<'w, 's> {
    pub diagnostics: Res<'w, DiagnosticsStore>,
    pub state: Res<'w, DebugOverlayState>,
    pub time: Res<'w, Time>,
    pub timer: ResMut<'w, DebugOverlayTimer>,
    pub text: Query<'w, 's, &'static mut Text, With<DebugOverlayText>>,
    pub characters: Query<
        'w,
        's,
        (
            &'static Transform,
            &'static KinematicBody,
            &'static LocomotionFrame,
            Option<&'static AnimationSelector>,
        ),
        With<Character>,
    >,
    pub cameras: Query<'w, 's, &'static OrbitCamera>,
}

/// Render the character, camera and animation state into one line each.
#[must_use]
pub fn describe_state(
    transform: &Transform,
    body: &KinematicBody,
    frame: &LocomotionFrame,
    selector: Option<&AnimationSelector>,
    camera: Option<&OrbitCamera>,
) -> String {
    let p = transform.translation;
    let v = body.velocity;
    let mode = match frame.mode {
        LocomotionMode::Grounded => "grounded",
        LocomotionMode::Airborne => "airborne",
    };
    let camera_line = camera.map_or_else(
        || "Camera: N/A".to_string(),
        |c| {
            let mode = match c.mode() {
                CameraMode::Settling => "settling",
                CameraMode::Active => "active",
            };
            format!(
                "Camera: yaw {:.1} pitch {:.1} ({mode})",
                c.yaw.to_degrees(),
                c.pitch.to_degrees()
            )
        },
    );
    let anim_line = selector.map_or_else(
        || "Clip: N/A".to_string(),
        |s| {
            let clip = s.current().map_or_else(|| "-".to_string(), |c| format!("{c:?}"));
            format!("Clip: {clip}{}", if s.is_blocking() { " [blocking]" } else { "" })
        },
    );

    format!(
        "Pos: ({:.2}, {:.2}, {:.2})\nVel: ({:.2}, {:.2}, {:.2})\nMode: {mode}{}\n{camera_line}\n{anim_line}",
        p.x,
        p.y,
        p.z,
        v.x,
        v.y,
        v.z,
        if frame.has_intent() { " moving" } else { "" },
    )
}

pub fn update_debug_overlay(mut ctx: DebugOverlayCtx<'_, '_>) {
    if !ctx.timer.0.tick(ctx.time.delta()).just_finished() {
        return;
    }

    let Ok(mut text) = ctx.text.get_single_mut() else { return };

    if !ctx.state.visible {
        text.sections[0].value = String::new();
        return;
    }

    let fps = ctx
        .diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(Diagnostic::smoothed)
        .unwrap_or(0.0);
    let frame_time = ctx
        .diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FRAME_TIME)
        .and_then(Diagnostic::smoothed)
        .unwrap_or(0.0);

    let state = ctx.characters.get_single().map_or_else(
        |_| "Character: N/A".to_string(),
        |(transform, body, frame, selector)| {
            describe_state(transform, body, frame, selector, ctx.cameras.iter().next())
        },
    );

    // FRAME_TIME is already in milliseconds.
    text.sections[0].value = format!("FPS: {fps:.1}\nFrame Time: {frame_time:.2} ms\n{state}");
}

/// Draw walk intent, orbit pivot and camera target.
#[allow(clippy::needless_pass_by_value)]
pub fn render_debug_gizmos(
    visible: Res<DebugGizmosVisible>,
    mut gizmos: Gizmos,
    characters: Query<(&Transform, &LocomotionFrame), With<Character>>,
    cameras: Query<&OrbitCamera>,
) {
    if !visible.0 {
        return;
    }
    let Ok((transform, frame)) = characters.get_single() else { return };
    let feet = transform.translation;

    if frame.has_intent() {
        gizmos.arrow(feet, feet + frame.intent * 1.5, Color::srgb(0.0, 1.0, 0.0));
    }

    for camera in &cameras {
        let pivot = camera.pivot(feet);
        gizmos.sphere(pivot, Quat::IDENTITY, 0.1, Color::srgb(1.0, 1.0, 0.0));
        gizmos.line(pivot, camera.target_position(), Color::srgba(1.0, 1.0, 0.0, 0.5));
        gizmos.sphere(camera.target_position(), Quat::IDENTITY, 0.15, Color::srgb(1.0, 0.3, 0.0));
        let floor = camera.floor_height;
        let t = camera.target_position();
        gizmos.line(Vec3::new(t.x, floor, t.z), t, Color::srgba(1.0, 0.3, 0.0, 0.3));
    }
}
