//! Rigid-body seam and the small physics world the game steps each frame.
//!
//! Character code only talks to bodies through the [`RigidBody`] trait, so
//! it can be driven by this built-in world, a full physics engine, or a test
//! double. [`world`] holds the concrete integrator: gravity, a flat ground
//! plane and a capsule collider, stepped at a fixed rate.

pub mod world;

use bevy::prelude::*;

pub use world::{physics_step, step_physics, PhysicsWorld};

/// Handle to a physics-owned body: transform, velocity and impulse access.
pub trait RigidBody {
    fn position(&self) -> Vec3;
    fn rotation(&self) -> Quat;
    /// Write a new world transform. Rotation is filtered through the body's
    /// angular freedom before it is stored.
    fn set_transform(&mut self, position: Vec3, rotation: Quat);
    fn linear_velocity(&self) -> Vec3;
    fn set_linear_velocity(&mut self, velocity: Vec3);
    fn apply_central_impulse(&mut self, impulse: Vec3);
    /// Per-axis rotational freedom. `Vec3::Y` means yaw only.
    fn angular_factor(&self) -> Vec3;
    fn is_active(&self) -> bool;
    fn activate(&mut self);
}

/// Dynamic body state integrated by [`PhysicsWorld`].
#[derive(Component, Debug, Clone)]
pub struct KinematicBody {
    pub velocity: Vec3,
    pub inverse_mass: f32,
    pub angular_factor: Vec3,
    pub active: bool,
    /// The world never puts this body to sleep.
    pub always_active: bool,
    pub capsule_radius: f32,
    /// Height of the cylindrical section, caps excluded.
    pub capsule_height: f32,
}

impl KinematicBody {
    /// Upright capsule locked to yaw-only rotation.
    #[must_use]
    pub fn capsule(mass: f32, radius: f32, height: f32) -> Self {
        Self {
            velocity: Vec3::ZERO,
            inverse_mass: if mass > 0.0 { 1.0 / mass } else { 0.0 },
            angular_factor: Vec3::Y,
            active: true,
            always_active: true,
            capsule_radius: radius,
            capsule_height: height,
        }
    }

    /// Distance from the body origin to the bottom of the capsule.
    #[must_use]
    pub fn half_extent(&self) -> f32 {
        self.capsule_height * 0.5 + self.capsule_radius
    }
}

/// Drop rotational components the body is not free to take.
///
/// With the usual yaw-only mask this returns a pure rotation about +Y, so
/// the capsule can never tip over.
#[must_use]
pub fn constrain_rotation(rotation: Quat, angular_factor: Vec3) -> Quat {
    let (yaw, pitch, roll) = rotation.to_euler(EulerRot::YXZ);
    let keep = |free: f32, angle: f32| if free.abs() > f32::EPSILON { angle } else { 0.0 };
    Quat::from_euler(
        EulerRot::YXZ,
        keep(angular_factor.y, yaw),
        keep(angular_factor.x, pitch),
        keep(angular_factor.z, roll),
    )
}

/// Mutable view over an entity's transform and body, handed to controllers
/// for the duration of one update.
pub struct BodyHandle<'a> {
    pub transform: &'a mut Transform,
    pub body: &'a mut KinematicBody,
}

impl<'a> BodyHandle<'a> {
    pub fn new(transform: &'a mut Transform, body: &'a mut KinematicBody) -> Self {
        Self { transform, body }
    }
}

impl RigidBody for BodyHandle<'_> {
    fn position(&self) -> Vec3 {
        self.transform.translation
    }

    fn rotation(&self) -> Quat {
        self.transform.rotation
    }

    fn set_transform(&mut self, position: Vec3, rotation: Quat) {
        self.transform.translation = position;
        self.transform.rotation = constrain_rotation(rotation, self.body.angular_factor);
    }

    fn linear_velocity(&self) -> Vec3 {
        self.body.velocity
    }

    fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.body.velocity = velocity;
        self.body.active = true;
    }

    fn apply_central_impulse(&mut self, impulse: Vec3) {
        self.body.velocity += impulse * self.body.inverse_mass;
        self.body.active = true;
    }

    fn angular_factor(&self) -> Vec3 {
        self.body.angular_factor
    }

    fn is_active(&self) -> bool {
        self.body.active
    }

    fn activate(&mut self) {
        self.body.active = true;
    }
}
