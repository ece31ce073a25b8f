mod world;

use crate::bullet::BulletId;
use crate::session::PlayerId;

pub use world::PhysicsWorld;

/// User data attached to a rigid body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyTag {
    Player(PlayerId),
    Bullet {
        id: BulletId,
        owner: PlayerId,
        damage: u8,
    },
    World,
}

impl BodyTag {
    pub fn is_bullet(&self) -> bool {
        matches!(self, Self::Bullet { .. })
    }
}

/// A bullet overlapping something, seen from the bullet's side.
#[derive(Debug, Clone)]
pub struct Intersection {
    pub tag: BodyTag,
    pub other_tag: BodyTag,
}
