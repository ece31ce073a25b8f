use glam::Vec3;

use crate::bullet::{BulletId, RetireReason};
use crate::session::PlayerId;

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PlayerJoined {
        player: PlayerId,
    },
    PlayerLeft {
        player: PlayerId,
    },
    BulletFired {
        bullet: BulletId,
    },
    BulletRetired {
        bullet: BulletId,
        reason: RetireReason,
    },
    PlayerDamaged {
        victim: PlayerId,
        attacker: PlayerId,
        health: u8,
    },
    PlayerKilled {
        victim: PlayerId,
        killer: PlayerId,
    },
    PlayerRespawned {
        player: PlayerId,
        position: Vec3,
    },
    PlayerHurt {
        player: PlayerId,
        health: u8,
    },
    PlayerDied {
        player: PlayerId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedEvent {
    Respawn { player: PlayerId },
}

impl TimedEvent {
    pub fn player(&self) -> PlayerId {
        match self {
            Self::Respawn { player } => *player,
        }
    }
}
