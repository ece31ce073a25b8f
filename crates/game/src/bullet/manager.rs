use glam::{Quat, Vec3};
use rapier3d::dynamics::RigidBodyHandle;

use crate::config::ArenaConfig;
use crate::physics::{BodyTag, PhysicsWorld};
use crate::session::PlayerId;

use super::{BulletId, BulletSnapshot, BulletState, bullet_direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetireReason {
    Hit,
    Expired,
    OutOfRange,
}

#[derive(Debug, Clone)]
pub struct Bullet {
    pub id: BulletId,
    pub owner: PlayerId,
    pub origin: Vec3,
    pub muzzle: Vec3,
    pub position: Vec3,
    pub angle: f32,
    pub damage: u8,
    pub enabled: bool,
    pub fired_at_ms: u64,
    body: Option<RigidBodyHandle>,
}

impl Bullet {
    pub fn body(&self) -> Option<RigidBodyHandle> {
        self.body
    }

    pub fn to_state(&self) -> BulletState {
        BulletState {
            id: self.id,
            owner: self.owner,
            origin: self.origin.into(),
            position: self.position.into(),
            angle: self.angle,
            damage: self.damage,
            enabled: self.enabled,
        }
    }
}

/// Host-owned live bullet collection.
#[derive(Debug)]
pub struct BulletManager {
    speed: f32,
    damage: u8,
    radius: f32,
    weapon_offset: Vec3,
    max_lifetime_ms: u64,
    max_range: f32,
    live: Vec<Bullet>,
    version: u64,
}

impl BulletManager {
    pub fn new(config: &ArenaConfig) -> Self {
        Self {
            speed: config.bullet_speed,
            damage: config.bullet_damage,
            radius: config.bullet_radius,
            weapon_offset: config.weapon_offset,
            max_lifetime_ms: config.bullet_max_lifetime_ms,
            max_range: config.bullet_max_range,
            live: Vec::new(),
            version: 0,
        }
    }

    pub fn spawn(
        &mut self,
        physics: &mut PhysicsWorld,
        owner: PlayerId,
        origin: Vec3,
        angle: f32,
        now_ms: u64,
    ) -> BulletId {
        let mut id = BulletId::new(owner, now_ms);
        while self.get(id).is_some() {
            id.fired_at_ms += 1;
        }

        let muzzle = origin + Quat::from_rotation_y(angle) * self.weapon_offset;
        let tag = BodyTag::Bullet {
            id,
            owner,
            damage: self.damage,
        };
        let body = physics.add_bullet(tag, muzzle, self.radius);

        self.live.push(Bullet {
            id,
            owner,
            origin,
            muzzle,
            position: muzzle,
            angle,
            damage: self.damage,
            enabled: true,
            fired_at_ms: now_ms,
            body: Some(body),
        });

        log::debug!("bullet {} fired at angle {:.2}", id, angle);
        id
    }

    /// Moves every bullet along its line and retires the ones past their
    /// lifetime or range.
    pub fn advance(&mut self, physics: &mut PhysicsWorld, now_ms: u64) -> Vec<(Bullet, RetireReason)> {
        let mut expired = Vec::new();

        for bullet in &mut self.live {
            let age_ms = now_ms.saturating_sub(bullet.fired_at_ms);
            let travelled = self.speed * age_ms as f32 / 1000.0;

            if age_ms > self.max_lifetime_ms {
                expired.push((bullet.id, RetireReason::Expired));
                continue;
            }
            if travelled > self.max_range {
                expired.push((bullet.id, RetireReason::OutOfRange));
                continue;
            }

            bullet.position = bullet.muzzle + bullet_direction(bullet.angle) * travelled;
            if let Some(body) = bullet.body {
                physics.set_translation(body, bullet.position);
            }
        }

        expired
            .into_iter()
            .filter_map(|(id, reason)| self.retire(physics, id).map(|b| (b, reason)))
            .collect()
    }

    /// Removes a bullet. Its body is disabled before removal so no further
    /// intersections are reported for it.
    pub fn retire(&mut self, physics: &mut PhysicsWorld, id: BulletId) -> Option<Bullet> {
        let index = self.live.iter().position(|b| b.id == id)?;
        let mut bullet = self.live.remove(index);

        bullet.enabled = false;
        if let Some(body) = bullet.body.take() {
            physics.set_enabled(body, false);
            physics.remove_body(body);
        }
        Some(bullet)
    }

    pub fn get(&self, id: BulletId) -> Option<&Bullet> {
        self.live.iter().find(|b| b.id == id)
    }

    pub fn live(&self) -> &[Bullet] {
        &self.live
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn snapshot(&mut self) -> BulletSnapshot {
        self.version += 1;
        BulletSnapshot {
            version: self.version,
            bullets: self.live.iter().map(Bullet::to_state).collect(),
        }
    }
}
