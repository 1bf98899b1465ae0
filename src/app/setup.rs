//! Scene setup: ground, light, the character body and its orbit camera.
//!
//! The character starts as a capsule. The glTF model (if configured and
//! found) replaces the capsule once it loads.
use bevy::prelude::*;
use wayfarer::animation::{AnimationSelector, CapsuleMesh};
use wayfarer::camera::OrbitCamera;
use wayfarer::locomotion::{Character, LocomotionController, LocomotionFrame};
use wayfarer::physics::KinematicBody;
use wayfarer::settings::Settings;

/// Marks the sun so display sync can reach its shadow flag.
#[derive(Component)]
pub struct Sun;

/// Spawn the static scene, the character and the camera.
#[allow(clippy::needless_pass_by_value, clippy::cast_precision_loss)]
pub fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<Settings>,
) {
    let phys = &settings.physics;

    commands.spawn((
        PbrBundle {
            mesh: meshes.add(Plane3d::default().mesh().size(200.0, 200.0)),
            material: materials.add(StandardMaterial {
                base_color: Color::srgb(0.35, 0.45, 0.3),
                perceptual_roughness: 0.9,
                ..default()
            }),
            transform: Transform::from_xyz(0.0, phys.ground_height, 0.0),
            ..default()
        },
        Name::new("ground"),
    ));

    // A ring of crates so movement and camera orbit have a visual reference.
    let crate_mesh = meshes.add(Cuboid::new(1.0, 1.0, 1.0));
    let crate_material = materials.add(Color::srgb(0.55, 0.4, 0.25));
    for i in 0..12 {
        let angle = i as f32 / 12.0 * std::f32::consts::TAU;
        commands.spawn(PbrBundle {
            mesh: crate_mesh.clone(),
            material: crate_material.clone(),
            transform: Transform::from_xyz(angle.cos() * 12.0, phys.ground_height + 0.5, angle.sin() * 12.0),
            ..default()
        });
    }

    commands.spawn((
        DirectionalLightBundle {
            directional_light: DirectionalLight {
                shadows_enabled: settings.graphics.shadows,
                illuminance: 8000.0,
                ..default()
            },
            transform: Transform::from_xyz(4.0, 10.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
            ..default()
        },
        Sun,
    ));

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 300.0,
    });

    let spawn = Vec3::new(0.0, phys.spawn_height, 0.0);
    commands
        .spawn((
            SpatialBundle::from_transform(Transform::from_translation(spawn)),
            KinematicBody::capsule(phys.body_mass, phys.capsule_radius, phys.capsule_height),
            LocomotionController::new(settings.locomotion.clone()),
            LocomotionFrame::default(),
            AnimationSelector::new(settings.animation.clone()),
            Character,
            Name::new("character"),
        ))
        .with_children(|parent| {
            parent.spawn((
                PbrBundle {
                    mesh: meshes.add(Capsule3d::new(phys.capsule_radius, phys.capsule_height)),
                    material: materials.add(Color::srgb(0.8, 0.75, 0.7)),
                    ..default()
                },
                CapsuleMesh,
            ));
        });

    let cam = &settings.camera;
    let mut orbit = OrbitCamera::from_settings(
        cam,
        settings.controls.mouse_sensitivity,
        settings.locomotion.max_delta_seconds,
    );
    let mut transform = Transform::default();
    orbit.snap(spawn, &mut transform);

    commands.spawn((
        Camera3dBundle {
            transform,
            projection: PerspectiveProjection {
                fov: cam.fov_degrees.to_radians(),
                near: cam.near,
                far: cam.far,
                ..default()
            }
            .into(),
            ..default()
        },
        orbit,
        Name::new("orbit camera"),
    ));

    info!("scene ready, character at {spawn}");
}
