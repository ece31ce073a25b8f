use std::collections::HashMap;

use glam::Vec3;
use rapier3d::prelude::*;

use crate::config::ArenaConfig;

use super::{BodyTag, Intersection};

pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    gravity: Vector,
    tags: HashMap<RigidBodyHandle, BodyTag>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(-9.81, 1.0 / 60.0)
    }
}

impl PhysicsWorld {
    pub fn new(gravity: Real, dt: Real) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = dt;
        integration_parameters.min_ccd_dt = dt / 100.0;

        Self {
            pipeline: PhysicsPipeline::new(),
            integration_parameters,
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity: Vector::new(0.0, gravity, 0.0),
            tags: HashMap::new(),
        }
    }

    pub fn from_config(config: &ArenaConfig) -> Self {
        Self::new(config.gravity, config.tick_dt())
    }

    pub fn step(&mut self) {
        self.pipeline.step(
            self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    /// Dynamic capsule with locked rotations, driven by impulses.
    pub fn add_player(&mut self, tag: BodyTag, position: Vec3, config: &ArenaConfig) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(to_vector(position))
            .linear_damping(config.player_linear_damping)
            .lock_rotations()
            .build();

        let handle = self.bodies.insert(body);

        let collider = ColliderBuilder::capsule_y(config.player_half_height, config.player_radius)
            .translation(Vector::new(0.0, config.player_collider_offset, 0.0))
            .build();

        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        self.tags.insert(handle, tag);

        handle
    }

    /// Gravity-exempt kinematic sensor; moved by teleporting each tick.
    pub fn add_bullet(&mut self, tag: BodyTag, position: Vec3, radius: Real) -> RigidBodyHandle {
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(to_vector(position))
            .build();
        let handle = self.bodies.insert(body);

        let collider = ColliderBuilder::ball(radius)
            .sensor(true)
            .active_collision_types(ActiveCollisionTypes::all())
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        self.tags.insert(handle, tag);

        handle
    }

    pub fn add_static_box(&mut self, position: Vec3, half_extents: Vec3) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(to_vector(position))
            .active_collision_types(ActiveCollisionTypes::all())
            .build();
        self.colliders.insert(collider)
    }

    pub fn add_ground(&mut self, y: Real, half_size: Real) -> ColliderHandle {
        self.add_static_box(Vec3::new(0.0, y, 0.0), Vec3::new(half_size, 0.1, half_size))
    }

    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.tags.remove(&handle);
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn tag(&self, handle: RigidBodyHandle) -> Option<&BodyTag> {
        self.tags.get(&handle)
    }

    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse: Vec3) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.apply_impulse(to_vector(impulse), true);
        }
    }

    pub fn set_translation(&mut self, handle: RigidBodyHandle, position: Vec3) {
        if let Some(body) = self.bodies.get_mut(handle) {
            let current_rot = *body.rotation();
            let new_pose = Pose::from_parts(to_vector(position), current_rot);
            body.set_position(new_pose, true);
        }
    }

    pub fn translation(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.bodies.get(handle).map(|b| {
            let t = b.translation();
            Vec3::new(t.x, t.y, t.z)
        })
    }

    pub fn set_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec3) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_linvel(to_vector(velocity), true);
        }
    }

    pub fn set_enabled(&mut self, handle: RigidBodyHandle, enabled: bool) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_enabled(enabled);
        }
    }

    pub fn is_enabled(&self, handle: RigidBodyHandle) -> bool {
        self.bodies.get(handle).is_some_and(|b| b.is_enabled())
    }

    /// Current intersections of the given bullet bodies, in the order given. Bodies
    /// without a tag (map geometry) report as `BodyTag::World`.
    pub fn bullet_intersections(
        &self,
        bullets: impl IntoIterator<Item = RigidBodyHandle>,
    ) -> Vec<Intersection> {
        let mut hits = Vec::new();

        for handle in bullets {
            let Some(tag) = self.tag(handle).filter(|t| t.is_bullet()) else {
                continue;
            };
            let Some(body) = self.bodies.get(handle).filter(|b| b.is_enabled()) else {
                continue;
            };

            for &collider in body.colliders() {
                for (c1, c2, intersecting) in self.narrow_phase.intersection_pairs_with(collider) {
                    if !intersecting {
                        continue;
                    }
                    let other_collider = if c1 == collider { c2 } else { c1 };
                    let other_tag = self
                        .colliders
                        .get(other_collider)
                        .and_then(|c| c.parent())
                        .and_then(|b| self.tag(b).cloned())
                        .unwrap_or(BodyTag::World);

                    hits.push(Intersection {
                        tag: tag.clone(),
                        other_tag,
                    });
                }
            }
        }

        hits
    }
}

fn to_vector(v: Vec3) -> Vector {
    Vector::new(v.x, v.y, v.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bullet::BulletId;
    use crate::session::PlayerId;

    fn bullet_tag(owner: u32) -> BodyTag {
        BodyTag::Bullet {
            id: BulletId::new(owner, 0),
            owner,
            damage: 10,
        }
    }

    #[test]
    fn impulse_moves_player() {
        let config = ArenaConfig::default();
        let mut physics = PhysicsWorld::new(0.0, 1.0 / 60.0);
        let handle = physics.add_player(BodyTag::Player(1), Vec3::ZERO, &config);

        physics.apply_impulse(handle, Vec3::new(0.0, 0.0, 5.0));
        physics.step();

        assert!(physics.translation(handle).unwrap().z > 0.0);
    }

    #[test]
    fn bullet_overlapping_player_is_reported() {
        let config = ArenaConfig::default();
        let mut physics = PhysicsWorld::new(0.0, 1.0 / 60.0);
        physics.add_player(BodyTag::Player(2), Vec3::ZERO, &config);
        let bullet = physics.add_bullet(bullet_tag(1), Vec3::new(0.0, 1.4, 0.0), 0.05);

        physics.step();

        let hits = physics.bullet_intersections([bullet]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].other_tag, BodyTag::Player(2));
    }

    #[test]
    fn disabled_player_is_not_hit() {
        let config = ArenaConfig::default();
        let mut physics = PhysicsWorld::new(0.0, 1.0 / 60.0);
        let player = physics.add_player(BodyTag::Player(2), Vec3::ZERO, &config);
        physics.set_enabled(player, false);
        let bullet = physics.add_bullet(bullet_tag(1), Vec3::new(0.0, 1.4, 0.0), 0.05);

        physics.step();

        assert!(physics.bullet_intersections([bullet]).is_empty());
    }

    #[test]
    fn intersections_follow_requested_order() {
        let config = ArenaConfig::default();
        let mut physics = PhysicsWorld::new(0.0, 1.0 / 60.0);
        physics.add_player(BodyTag::Player(2), Vec3::ZERO, &config);
        let first = physics.add_bullet(bullet_tag(1), Vec3::new(0.0, 1.4, -0.5), 0.05);
        let second = physics.add_bullet(bullet_tag(3), Vec3::new(0.0, 1.4, 0.5), 0.05);

        physics.step();

        let owners = |hits: Vec<Intersection>| -> Vec<PlayerId> {
            hits.into_iter()
                .filter_map(|h| match h.tag {
                    BodyTag::Bullet { owner, .. } => Some(owner),
                    _ => None,
                })
                .collect()
        };
        assert_eq!(owners(physics.bullet_intersections([first, second])), vec![1, 3]);
        assert_eq!(owners(physics.bullet_intersections([second, first])), vec![3, 1]);
    }
}
