use std::collections::HashMap;

use glam::Vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rapier3d::dynamics::RigidBodyHandle;

use crate::bullet::{BulletManager, BulletSnapshot, FireControl, RetireReason};
use crate::combat::{CombatContext, CombatResolver, HitOutcome, LifeState};
use crate::config::ArenaConfig;
use crate::error::SessionError;
use crate::event::{GameEvent, Schedule, TimedEvent};
use crate::input::{FireTrigger, InputFrame};
use crate::map::{ArenaMap, SpawnPoints};
use crate::movement::{Animation, movement_impulse, resolve_heading};
use crate::physics::{BodyTag, Intersection, PhysicsWorld};
use crate::replication::{FieldValue, PlayerStore, PlayerUpdate};
use crate::session::{PlayerId, PlayerProfile, Roster};

use super::view::{PlayerView, ScoreLine, scoreboard};

#[derive(Debug, Default)]
struct PlayerControl {
    input: InputFrame,
    facing: f32,
    trigger: FireTrigger,
}

/// Everything the host produced during one tick.
#[derive(Debug, Default)]
pub struct TickReport {
    pub events: Vec<GameEvent>,
    pub updates: Vec<PlayerUpdate>,
    pub bullets: BulletSnapshot,
}

/// Authoritative simulation. Only the host runs one.
pub struct HostSimulation {
    config: ArenaConfig,
    store: PlayerStore,
    roster: Roster,
    physics: PhysicsWorld,
    spawns: SpawnPoints,
    rng: StdRng,
    bodies: HashMap<PlayerId, RigidBodyHandle>,
    controls: HashMap<PlayerId, PlayerControl>,
    fire: FireControl,
    bullets: BulletManager,
    combat: CombatResolver,
    schedule: Schedule,
    events: Vec<GameEvent>,
}

impl HostSimulation {
    pub fn new(config: ArenaConfig, map: &ArenaMap) -> Result<Self, SessionError> {
        let spawns = SpawnPoints::from_map(map)?;

        let mut physics = PhysicsWorld::from_config(&config);
        map.build(&mut physics);

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            store: PlayerStore::writer(),
            roster: Roster::new(),
            physics,
            spawns,
            rng,
            bodies: HashMap::new(),
            controls: HashMap::new(),
            fire: FireControl::new(config.fire_rate_ms),
            bullets: BulletManager::new(&config),
            combat: CombatResolver::new(config.max_health, config.respawn_delay_ms),
            schedule: Schedule::new(),
            events: Vec::new(),
            config,
        })
    }

    /// Admits a player at a random spawn point and initialises its replicated state.
    pub fn add_player(
        &mut self,
        id: PlayerId,
        profile: PlayerProfile,
        now_ms: u64,
    ) -> Result<Vec3, SessionError> {
        if self.roster.contains(id) {
            return Ok(self.store.position(id));
        }

        let position = self.spawns.pick(&mut self.rng);
        let body = self
            .physics
            .add_player(BodyTag::Player(id), position, &self.config);

        log::info!("player {} ({}) spawned at {:?}", id, profile.name, position);
        self.roster.admit(id, profile, now_ms);
        self.bodies.insert(id, body);
        self.controls.insert(id, PlayerControl::default());

        self.store.set_state(id, FieldValue::position(position))?;
        self.combat.enroll(&mut self.store, id)?;

        self.events.push(GameEvent::PlayerJoined { player: id });
        Ok(position)
    }

    /// Drops a player. Bullets it fired stay live.
    pub fn remove_player(&mut self, id: PlayerId) -> bool {
        if self.roster.remove(id).is_none() {
            return false;
        }

        self.schedule.cancel_for(id);
        if let Some(body) = self.bodies.remove(&id) {
            self.physics.remove_body(body);
        }
        self.controls.remove(&id);
        self.fire.forget(id);
        self.combat.forget(id);
        self.store.remove(id);

        log::info!("player {} left", id);
        self.events.push(GameEvent::PlayerLeft { player: id });
        true
    }

    pub fn set_input(&mut self, id: PlayerId, input: InputFrame) {
        match self.controls.get_mut(&id) {
            Some(control) => control.input = input,
            None => log::debug!("input for unknown player {} ignored", id),
        }
    }

    /// Moves a player without going through physics integration.
    pub fn teleport(&mut self, id: PlayerId, position: Vec3) -> Result<(), SessionError> {
        if let Some(&body) = self.bodies.get(&id) {
            self.physics.set_translation(body, position);
            self.physics.set_velocity(body, Vec3::ZERO);
            self.store.set_state(id, FieldValue::position(position))?;
        }
        Ok(())
    }

    /// Host override of a living player's health. Goes through the combat state so
    /// the two never disagree.
    pub fn set_health(&mut self, id: PlayerId, health: u8) -> Result<bool, SessionError> {
        self.combat.set_health(&mut self.store, id, health)
    }

    pub fn tick(&mut self, now_ms: u64, dt: f32) -> Result<TickReport, SessionError> {
        self.run_respawns(now_ms)?;
        self.drive_players(now_ms, dt);

        for (bullet, reason) in self.bullets.advance(&mut self.physics, now_ms) {
            log::debug!("bullet {} retired: {:?}", bullet.id, reason);
            self.events.push(GameEvent::BulletRetired {
                bullet: bullet.id,
                reason,
            });
        }

        self.physics.step();

        // Hits resolve in bullet spawn order.
        let bodies: Vec<_> = self.bullets.live().iter().filter_map(|b| b.body()).collect();
        for hit in self.physics.bullet_intersections(bodies) {
            self.handle_intersection(&hit, now_ms)?;
        }

        self.publish_positions()?;

        Ok(TickReport {
            events: std::mem::take(&mut self.events),
            updates: self.store.take_updates(),
            bullets: self.bullets.snapshot(),
        })
    }

    fn run_respawns(&mut self, now_ms: u64) -> Result<(), SessionError> {
        for event in self.schedule.drain_due(now_ms) {
            match event {
                TimedEvent::Respawn { player } => {
                    if !self.roster.contains(player) {
                        continue;
                    }
                    let position = self.spawns.pick(&mut self.rng);
                    let mut ctx = CombatContext {
                        store: &mut self.store,
                        physics: &mut self.physics,
                        bodies: &self.bodies,
                        roster: &self.roster,
                        schedule: &mut self.schedule,
                    };
                    if self.combat.respawn(&mut ctx, player, position)? {
                        self.events
                            .push(GameEvent::PlayerRespawned { player, position });
                    }
                }
            }
        }
        Ok(())
    }

    fn drive_players(&mut self, now_ms: u64, dt: f32) {
        for id in self.roster.ids() {
            let Some(&body) = self.bodies.get(&id) else {
                continue;
            };
            let alive = self.combat.life(id).is_some_and(|l| !l.is_dead());
            let Some(control) = self.controls.get_mut(&id) else {
                continue;
            };

            let pressed = control.trigger.update(control.input.fire);
            if !alive {
                continue;
            }

            let heading = resolve_heading(&control.input, control.facing);
            control.facing = heading;

            if pressed && self.fire.try_fire(id, now_ms) {
                let origin = self.physics.translation(body).unwrap_or_default();
                let bullet = self
                    .bullets
                    .spawn(&mut self.physics, id, origin, heading, now_ms);
                self.events.push(GameEvent::BulletFired { bullet });
            }

            if control.input.moving {
                let impulse = movement_impulse(heading, self.config.movement_speed, dt);
                self.physics.apply_impulse(body, impulse);
            }
        }
    }

    /// Resolves one bullet intersection reported by physics.
    ///
    /// Bullet-on-bullet and owner contacts are ignored. Otherwise the bullet is
    /// retired before any damage is applied.
    pub fn handle_intersection(&mut self, hit: &Intersection, now_ms: u64) -> Result<(), SessionError> {
        let BodyTag::Bullet { id, owner, damage } = hit.tag else {
            return Ok(());
        };
        if hit.other_tag.is_bullet() || hit.other_tag == BodyTag::Player(owner) {
            return Ok(());
        }

        if self.bullets.retire(&mut self.physics, id).is_none() {
            return Ok(());
        }
        self.events.push(GameEvent::BulletRetired {
            bullet: id,
            reason: RetireReason::Hit,
        });

        let BodyTag::Player(victim) = hit.other_tag else {
            return Ok(());
        };

        let mut ctx = CombatContext {
            store: &mut self.store,
            physics: &mut self.physics,
            bodies: &self.bodies,
            roster: &self.roster,
            schedule: &mut self.schedule,
        };
        match self
            .combat
            .resolve_hit(&mut ctx, victim, owner, damage, now_ms)?
        {
            HitOutcome::Damaged { health } => self.events.push(GameEvent::PlayerDamaged {
                victim,
                attacker: owner,
                health,
            }),
            HitOutcome::Killed { .. } => self.events.push(GameEvent::PlayerKilled {
                victim,
                killer: owner,
            }),
            HitOutcome::Ignored(reason) => {
                log::debug!("hit on {} ignored: {:?}", victim, reason);
            }
        }
        Ok(())
    }

    fn publish_positions(&mut self) -> Result<(), SessionError> {
        for id in self.roster.ids() {
            if self.combat.life(id).is_none_or(|l| l.is_dead()) {
                continue;
            }
            let Some(position) = self.bodies.get(&id).and_then(|&b| self.physics.translation(b))
            else {
                continue;
            };
            if self.store.position(id) != position {
                self.store.set_state(id, FieldValue::position(position))?;
            }
        }
        Ok(())
    }

    pub fn store(&self) -> &PlayerStore {
        &self.store
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn bullets(&self) -> &BulletManager {
        &self.bullets
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn spawns(&self) -> &SpawnPoints {
        &self.spawns
    }

    pub fn life(&self, id: PlayerId) -> Option<LifeState> {
        self.combat.life(id)
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn body(&self, id: PlayerId) -> Option<RigidBodyHandle> {
        self.bodies.get(&id).copied()
    }

    pub fn players(&self) -> Vec<PlayerView> {
        self.roster
            .iter()
            .map(|player| {
                let fields = self.store.player(player.id);
                let input = self
                    .controls
                    .get(&player.id)
                    .map(|c| c.input)
                    .unwrap_or_default();
                PlayerView {
                    id: player.id,
                    name: player.profile.name.clone(),
                    color: player.profile.color,
                    position: fields.position,
                    health: fields.health,
                    dead: fields.dead,
                    kills: fields.kills,
                    deaths: fields.deaths,
                    animation: Animation::select(fields.dead, input.moving, input.fire),
                }
            })
            .collect()
    }

    pub fn scoreboard(&self) -> Vec<ScoreLine> {
        scoreboard(&self.players())
    }
}
