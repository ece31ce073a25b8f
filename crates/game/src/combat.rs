//! Damage, death and respawn on the host.
//!
//! This is the only place that writes `health`, `dead`, `kills` and `deaths`.

use std::collections::HashMap;

use glam::Vec3;
use rapier3d::dynamics::RigidBodyHandle;

use crate::error::SessionError;
use crate::event::{Schedule, TimedEvent};
use crate::physics::PhysicsWorld;
use crate::replication::{FieldValue, PlayerStore};
use crate::session::{PlayerId, Roster};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeState {
    Alive { health: u8 },
    Dead { died_at_ms: u64 },
}

impl LifeState {
    pub fn is_dead(&self) -> bool {
        matches!(self, Self::Dead { .. })
    }

    pub fn health(&self) -> u8 {
        match self {
            Self::Alive { health } => *health,
            Self::Dead { .. } => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    VictimDead,
    StaleVictim,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    Damaged { health: u8 },
    Killed { killer_credited: bool },
    Ignored(IgnoreReason),
}

pub struct CombatContext<'a> {
    pub store: &'a mut PlayerStore,
    pub physics: &'a mut PhysicsWorld,
    pub bodies: &'a HashMap<PlayerId, RigidBodyHandle>,
    pub roster: &'a Roster,
    pub schedule: &'a mut Schedule,
}

#[derive(Debug)]
pub struct CombatResolver {
    max_health: u8,
    respawn_delay_ms: u64,
    lives: HashMap<PlayerId, LifeState>,
}

impl CombatResolver {
    pub fn new(max_health: u8, respawn_delay_ms: u64) -> Self {
        Self {
            max_health,
            respawn_delay_ms,
            lives: HashMap::new(),
        }
    }

    /// Writes the initial combat fields for a freshly joined player.
    pub fn enroll(&mut self, store: &mut PlayerStore, player: PlayerId) -> Result<(), SessionError> {
        self.lives.insert(
            player,
            LifeState::Alive {
                health: self.max_health,
            },
        );
        store.set_state(player, FieldValue::Health(self.max_health))?;
        store.set_state(player, FieldValue::Dead(false))?;
        store.set_state(player, FieldValue::Kills(0))?;
        store.set_state(player, FieldValue::Deaths(0))?;
        Ok(())
    }

    /// Overrides a living player's health, clamped to `1..=max_health`.
    /// Returns false for dead or unknown players.
    pub fn set_health(
        &mut self,
        store: &mut PlayerStore,
        player: PlayerId,
        health: u8,
    ) -> Result<bool, SessionError> {
        let Some(LifeState::Alive { health: current }) = self.lives.get_mut(&player) else {
            return Ok(false);
        };
        let health = health.clamp(1, self.max_health);
        *current = health;
        store.set_state(player, FieldValue::Health(health))?;
        Ok(true)
    }

    pub fn forget(&mut self, player: PlayerId) {
        self.lives.remove(&player);
    }

    pub fn life(&self, player: PlayerId) -> Option<LifeState> {
        self.lives.get(&player).copied()
    }

    pub fn resolve_hit(
        &mut self,
        ctx: &mut CombatContext<'_>,
        victim: PlayerId,
        attacker: PlayerId,
        damage: u8,
        now_ms: u64,
    ) -> Result<HitOutcome, SessionError> {
        if !ctx.roster.contains(victim) {
            log::debug!("hit on departed player {} ignored", victim);
            return Ok(HitOutcome::Ignored(IgnoreReason::StaleVictim));
        }

        let health = match self.lives.get(&victim) {
            Some(LifeState::Alive { health }) => *health,
            Some(LifeState::Dead { .. }) => {
                return Ok(HitOutcome::Ignored(IgnoreReason::VictimDead));
            }
            None => return Ok(HitOutcome::Ignored(IgnoreReason::StaleVictim)),
        };

        if health > damage {
            let health = health - damage;
            self.lives.insert(victim, LifeState::Alive { health });
            ctx.store.set_state(victim, FieldValue::Health(health))?;
            log::debug!("player {} hit by {} ({} hp left)", victim, attacker, health);
            return Ok(HitOutcome::Damaged { health });
        }

        let killer_credited = self.kill(ctx, victim, attacker, now_ms)?;
        Ok(HitOutcome::Killed { killer_credited })
    }

    fn kill(
        &mut self,
        ctx: &mut CombatContext<'_>,
        victim: PlayerId,
        killer: PlayerId,
        now_ms: u64,
    ) -> Result<bool, SessionError> {
        self.lives
            .insert(victim, LifeState::Dead { died_at_ms: now_ms });

        let deaths = ctx.store.player(victim).deaths + 1;
        ctx.store.set_state(victim, FieldValue::Deaths(deaths))?;
        ctx.store.set_state(victim, FieldValue::Dead(true))?;
        ctx.store.set_state(victim, FieldValue::Health(0))?;

        if let Some(&body) = ctx.bodies.get(&victim) {
            ctx.physics.set_enabled(body, false);
        }

        let killer_credited = ctx.roster.contains(killer);
        if killer_credited {
            let kills = ctx.store.player(killer).kills + 1;
            ctx.store.set_state(killer, FieldValue::Kills(kills))?;
        } else {
            log::debug!("killer {} already left, no kill credit", killer);
        }

        ctx.schedule.cancel_for(victim);
        ctx.schedule.push(
            now_ms + self.respawn_delay_ms,
            TimedEvent::Respawn { player: victim },
        );

        log::info!("player {} killed by {}", victim, killer);
        Ok(killer_credited)
    }

    /// Brings a dead player back at `position`. Returns false if the player is not dead.
    pub fn respawn(
        &mut self,
        ctx: &mut CombatContext<'_>,
        player: PlayerId,
        position: Vec3,
    ) -> Result<bool, SessionError> {
        if !matches!(self.lives.get(&player), Some(LifeState::Dead { .. })) {
            return Ok(false);
        }

        if let Some(&body) = ctx.bodies.get(&player) {
            ctx.physics.set_translation(body, position);
            ctx.physics.set_velocity(body, Vec3::ZERO);
        }
        ctx.store.set_state(player, FieldValue::position(position))?;

        if let Some(&body) = ctx.bodies.get(&player) {
            ctx.physics.set_enabled(body, true);
        }

        self.lives.insert(
            player,
            LifeState::Alive {
                health: self.max_health,
            },
        );
        ctx.store.set_state(player, FieldValue::Dead(false))?;
        ctx.store
            .set_state(player, FieldValue::Health(self.max_health))?;

        log::info!("player {} respawned at {:?}", player, position);
        Ok(true)
    }
}
