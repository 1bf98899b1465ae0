//! Fixed-step integration: gravity, a flat ground plane and capsule contact.

use super::KinematicBody;
use crate::settings::{PhysicsSettings, Settings};
use bevy::prelude::*;

/// World-wide physics parameters plus the fixed-step accumulator.
#[derive(Resource, Debug, Clone)]
pub struct PhysicsWorld {
    pub gravity: Vec3,
    pub ground_height: f32,
    pub fixed_timestep: f32,
    pub max_substeps: u32,
    accumulator: f32,
}

impl PhysicsWorld {
    #[must_use]
    pub fn from_settings(settings: &PhysicsSettings) -> Self {
        Self {
            gravity: Vec3::new(0.0, settings.gravity, 0.0),
            ground_height: settings.ground_height,
            fixed_timestep: settings.fixed_timestep.max(1e-4),
            max_substeps: settings.max_substeps.max(1),
            accumulator: 0.0,
        }
    }

    /// Bank `dt` and return how many fixed sub-steps to run now.
    ///
    /// At most `max_substeps` run per call; time beyond that is dropped so a
    /// long hitch cannot snowball into ever larger catch-up work.
    pub fn consume(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.max(0.0);
        let mut steps = 0;
        while self.accumulator >= self.fixed_timestep && steps < self.max_substeps {
            self.accumulator -= self.fixed_timestep;
            steps += 1;
        }
        if steps == self.max_substeps {
            self.accumulator = self.accumulator.min(self.fixed_timestep);
        }
        steps
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::from_settings(&PhysicsSettings::default())
    }
}

/// Advance one body by a single fixed sub-step.
pub fn physics_step(world: &PhysicsWorld, transform: &mut Transform, body: &mut KinematicBody, dt: f32) {
    if !body.active && !body.always_active {
        return;
    }

    body.velocity += world.gravity * dt;
    transform.translation += body.velocity * dt;

    let floor = world.ground_height + body.half_extent();
    if transform.translation.y <= floor {
        transform.translation.y = floor;
        if body.velocity.y < 0.0 {
            body.velocity.y = 0.0;
        }
    }
}

/// Step every body by however many fixed sub-steps this frame's time buys.
#[allow(clippy::needless_pass_by_value)]
pub fn step_physics(
    time: Res<Time>,
    mut world: ResMut<PhysicsWorld>,
    mut bodies: Query<(&mut Transform, &mut KinematicBody)>,
) {
    let steps = world.consume(time.delta_seconds());
    for _ in 0..steps {
        for (mut transform, mut body) in &mut bodies {
            physics_step(&world, &mut transform, &mut body, world.fixed_timestep);
        }
    }
}

/// Push edited physics settings into the running world.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_physics_settings(settings: Res<Settings>, mut world: ResMut<PhysicsWorld>) {
    if !settings.is_changed() {
        return;
    }
    let fresh = PhysicsWorld::from_settings(&settings.physics);
    world.gravity = fresh.gravity;
    world.ground_height = fresh.ground_height;
    world.fixed_timestep = fresh.fixed_timestep;
    world.max_substeps = fresh.max_substeps;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resting_body() -> (Transform, KinematicBody) {
        (Transform::from_xyz(0.0, 1.0, 0.0), KinematicBody::capsule(1.0, 0.5, 1.0))
    }

    #[test]
    fn resting_body_stays_grounded_with_zero_vertical_speed() {
        let world = PhysicsWorld::default();
        let (mut tf, mut body) = resting_body();
        for _ in 0..120 {
            physics_step(&world, &mut tf, &mut body, world.fixed_timestep);
            assert_eq!(body.velocity.y, 0.0);
        }
        assert_eq!(tf.translation.y, 1.0);
    }

    #[test]
    fn jump_rises_then_lands() {
        let world = PhysicsWorld::default();
        let (mut tf, mut body) = resting_body();
        body.velocity.y = 7.0;
        let mut peak = tf.translation.y;
        for _ in 0..240 {
            physics_step(&world, &mut tf, &mut body, world.fixed_timestep);
            peak = peak.max(tf.translation.y);
        }
        assert!(peak > 3.0, "peak was {peak}");
        assert_eq!(tf.translation.y, 1.0);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn accumulator_caps_substeps() {
        let mut world = PhysicsWorld::default();
        assert_eq!(world.consume(world.fixed_timestep * 0.5), 0);
        assert_eq!(world.consume(world.fixed_timestep * 0.5 + 1e-5), 1);
        assert_eq!(world.consume(10.0), world.max_substeps);
        assert!(world.consume(0.0) <= 1);
    }
}
