mod fire;
mod manager;
mod mirror;

use std::fmt;

use glam::Vec3;
use rkyv::{Archive, Deserialize, Serialize};

use crate::session::PlayerId;

pub use fire::FireControl;
pub use manager::{Bullet, BulletManager, RetireReason};
pub use mirror::{BulletMirror, MirrorChange};

/// Firing player plus spawn timestamp; unique per player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct BulletId {
    pub owner: PlayerId,
    pub fired_at_ms: u64,
}

impl BulletId {
    pub fn new(owner: PlayerId, fired_at_ms: u64) -> Self {
        Self { owner, fired_at_ms }
    }
}

impl fmt::Display for BulletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.owner, self.fired_at_ms)
    }
}

/// Published form of one live bullet.
#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct BulletState {
    pub id: BulletId,
    pub owner: PlayerId,
    pub origin: [f32; 3],
    pub position: [f32; 3],
    pub angle: f32,
    pub damage: u8,
    pub enabled: bool,
}

impl BulletState {
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }
}

/// The whole live bullet set, republished every tick.
#[derive(Debug, Clone, Default, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct BulletSnapshot {
    pub version: u64,
    pub bullets: Vec<BulletState>,
}

pub fn bullet_direction(angle: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    Vec3::new(sin, 0.0, cos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_formats_as_player_dash_timestamp() {
        assert_eq!(BulletId::new(4, 1_700_000).to_string(), "4-1700000");
    }
}
