use bevy::math::{Vec2, Vec3};
use bevy::prelude::Transform;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use wayfarer::animation::{AnimationInput, AnimationSelector, NullDriver};
use wayfarer::camera::OrbitCamera;
use wayfarer::input::InputState;
use wayfarer::locomotion::LocomotionController;
use wayfarer::physics::{physics_step, BodyHandle, KinematicBody, PhysicsWorld};
use wayfarer::settings::{CameraSettings, LocomotionSettings, PhysicsSettings};

const DT: f32 = 1.0 / 60.0;

fn active_camera() -> OrbitCamera {
    let settings = CameraSettings { settle_frames: 0, ..CameraSettings::default() };
    OrbitCamera::from_settings(&settings, 1.0, 1.0 / 15.0)
}

/// Small camera movement deltas
fn bench_camera_look_clamp(c: &mut Criterion) {
    c.bench_function("camera_look_clamp", |b| {
        b.iter(|| {
            let mut cam = active_camera();
            for i in 0..1_000usize {
                let dx = ((i * 13) % 17) as f32 * 0.1;
                let dy = ((i * 7) % 23) as f32 * 0.2 - 5.0;
                cam.apply_look(black_box(Vec2::new(dx, dy)));
            }
            black_box((cam.yaw, cam.pitch));
        })
    });
}

/// Large/extreme deltas, alternating sign, to exercise the pitch clamp
fn bench_camera_look_extreme(c: &mut Criterion) {
    c.bench_function("camera_look_extreme", |b| {
        b.iter(|| {
            let mut cam = active_camera();
            for i in 0..1_000usize {
                let d = if (i & 1) == 0 { 1000.0 } else { -1000.0 };
                cam.apply_look(black_box(Vec2::new(d, -d)));
            }
            black_box((cam.yaw, cam.pitch));
        })
    });
}

/// Full orbit update (look, target, ease, aim) with deterministic LCG input
fn bench_orbit_update(c: &mut Criterion) {
    c.bench_function("orbit_update_random", |b| {
        b.iter(|| {
            let mut cam = active_camera();
            let mut rig = Transform::from_xyz(0.0, 2.0, 4.0);
            let mut state: u32 = 0x1234_5678;
            let mut body = Vec3::new(0.0, 1.0, 0.0);
            for _ in 0..1_000usize {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                let dx = (((state >> 16) & 0x7fff) as f32 / 32767.0) * 200.0 - 100.0;
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                let dy = (((state >> 16) & 0x7fff) as f32 / 32767.0) * 200.0 - 100.0;
                body.x += 0.05;
                cam.update(DT, black_box(Vec2::new(dx, dy)), body, &mut rig);
            }
            black_box(rig.translation);
        })
    });
}

/// Locomotion plus physics sub-steps for a character running and jumping
fn bench_locomotion_step(c: &mut Criterion) {
    let controller = LocomotionController::new(LocomotionSettings::default());
    let world = PhysicsWorld::from_settings(&PhysicsSettings::default());
    c.bench_function("locomotion_step", |b| {
        b.iter(|| {
            let mut transform = Transform::from_xyz(0.0, 1.0, 0.0);
            let mut body = KinematicBody::capsule(1.0, 0.5, 1.0);
            let direction = Vec3::new(0.3, -0.2, -1.0).normalize();
            for i in 0..1_000usize {
                let input = InputState {
                    forward: true,
                    strafe_left: i % 50 < 25,
                    jump_pressed: i % 120 == 0,
                    ..InputState::default()
                };
                let mut handle = BodyHandle::new(&mut transform, &mut body);
                black_box(controller.update(DT, direction, Vec3::Y, &input, false, &mut handle));
                physics_step(&world, &mut transform, &mut body, world.fixed_timestep);
            }
            black_box(transform.translation);
        })
    });
}

/// Selector priority resolution with no clips loaded
fn bench_animation_select(c: &mut Criterion) {
    c.bench_function("animation_select", |b| {
        b.iter(|| {
            let mut selector = AnimationSelector::default();
            for i in 0..1_000usize {
                let input = AnimationInput {
                    has_intent: i % 3 != 0,
                    forward: i % 3 == 1,
                    strafe_right: i % 3 == 2,
                    jump_triggered: i % 97 == 0,
                    attack_pressed: i % 211 == 0,
                    ..AnimationInput::default()
                };
                black_box(selector.update(DT, &input, &mut NullDriver));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_camera_look_clamp,
    bench_camera_look_extreme,
    bench_orbit_update,
    bench_locomotion_step,
    bench_animation_select
);
criterion_main!(benches);
