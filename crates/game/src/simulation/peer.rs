use std::collections::HashMap;

use crate::bullet::{BulletMirror, BulletState, MirrorChange};
use crate::config::ArenaConfig;
use crate::error::SessionError;
use crate::event::GameEvent;
use crate::input::InputFrame;
use crate::movement::{Animation, Reconciler};
use crate::net::Message;
use crate::replication::{FieldValue, PlayerStore};
use crate::session::{PlayerId, Roster};

use super::view::{PlayerView, ScoreLine, scoreboard};

#[derive(Debug, Clone, Copy)]
struct Observed {
    health: u8,
    dead: bool,
}

/// Read-only mirror of the host's state on a non-host peer.
#[derive(Debug)]
pub struct PeerReplica {
    local: PlayerId,
    store: PlayerStore,
    roster: Roster,
    bullets: BulletMirror,
    reconciler: Reconciler,
    observed: HashMap<PlayerId, Observed>,
    local_input: InputFrame,
    events: Vec<GameEvent>,
}

impl PeerReplica {
    pub fn new(local: PlayerId, config: &ArenaConfig) -> Self {
        Self {
            local,
            store: PlayerStore::replica(),
            roster: Roster::new(),
            bullets: BulletMirror::new(),
            reconciler: Reconciler::new(config.smoothing_factor),
            observed: HashMap::new(),
            local_input: InputFrame::idle(),
            events: Vec::new(),
        }
    }

    pub fn local(&self) -> PlayerId {
        self.local
    }

    pub fn apply(&mut self, message: Message, now_ms: u64) {
        match message {
            Message::Joined { player, profile } => {
                if self.roster.admit(player, profile, now_ms) {
                    self.events.push(GameEvent::PlayerJoined { player });
                }
            }
            Message::Quit { player } => {
                if self.roster.remove(player).is_some() {
                    self.store.remove(player);
                    self.reconciler.forget(player);
                    self.observed.remove(&player);
                    self.events.push(GameEvent::PlayerLeft { player });
                }
            }
            Message::State(update) => {
                if !self.store.apply(&update.to_update()) {
                    log::trace!("stale update for {} dropped", update.player);
                }
            }
            Message::Bullets(snapshot) => {
                if let Some(changes) = self.bullets.apply(&snapshot) {
                    for change in changes {
                        if let MirrorChange::Added(bullet) = change {
                            self.events.push(GameEvent::BulletFired { bullet: bullet.id });
                        }
                    }
                }
            }
            Message::Input { player, .. } => {
                log::warn!("peer {} received input for {}", self.local, player);
            }
        }
    }

    pub fn set_local_input(&mut self, input: InputFrame) {
        self.local_input = input;
    }

    /// Writes are never allowed on a replica; this always fails with `NotAuthorized`.
    pub fn try_set_state(&mut self, player: PlayerId, value: FieldValue) -> Result<u64, SessionError> {
        self.store.set_state(player, value)
    }

    /// Smooths every known player toward its replicated position and reports the
    /// health transitions observed since the last tick.
    pub fn tick(&mut self) -> Vec<GameEvent> {
        for id in self.roster.ids() {
            let Some(fields) = self.store.fields(id).cloned() else {
                continue;
            };
            self.reconciler.step(id, fields.position);

            let now = Observed {
                health: fields.health,
                dead: fields.dead,
            };
            if let Some(before) = self.observed.insert(id, now) {
                if !before.dead && now.dead {
                    self.events.push(GameEvent::PlayerDied { player: id });
                } else if before.dead && !now.dead {
                    self.events.push(GameEvent::PlayerRespawned {
                        player: id,
                        position: fields.position,
                    });
                } else if !now.dead && now.health < before.health {
                    self.events.push(GameEvent::PlayerHurt {
                        player: id,
                        health: now.health,
                    });
                }
            }
        }
        std::mem::take(&mut self.events)
    }

    pub fn store(&self) -> &PlayerStore {
        &self.store
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn bullets(&self) -> &[BulletState] {
        self.bullets.bullets()
    }

    pub fn players(&self) -> Vec<PlayerView> {
        self.roster
            .iter()
            .map(|player| {
                let fields = self.store.player(player.id);
                let position = self
                    .reconciler
                    .position(player.id)
                    .unwrap_or(fields.position);
                let (moving, shooting) = if player.id == self.local {
                    (self.local_input.moving, self.local_input.fire)
                } else {
                    (self.reconciler.is_converging(player.id, fields.position), false)
                };
                PlayerView {
                    id: player.id,
                    name: player.profile.name.clone(),
                    color: player.profile.color,
                    position,
                    health: fields.health,
                    dead: fields.dead,
                    kills: fields.kills,
                    deaths: fields.deaths,
                    animation: Animation::select(fields.dead, moving, shooting),
                }
            })
            .collect()
    }

    pub fn scoreboard(&self) -> Vec<ScoreLine> {
        scoreboard(&self.players())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::net::StateUpdate;
    use crate::session::PlayerProfile;

    fn state(player: PlayerId, version: u64, value: FieldValue) -> Message {
        Message::State(StateUpdate {
            player,
            version,
            value,
        })
    }

    fn replica_with(players: &[PlayerId]) -> PeerReplica {
        let mut replica = PeerReplica::new(players[0], &ArenaConfig::default());
        for &id in players {
            replica.apply(
                Message::Joined {
                    player: id,
                    profile: PlayerProfile::default(),
                },
                0,
            );
        }
        replica
    }

    #[test]
    fn replica_rejects_writes() {
        let mut replica = replica_with(&[2]);
        replica.apply(state(2, 1, FieldValue::Health(100)), 0);

        let result = replica.try_set_state(2, FieldValue::Health(0));

        assert!(matches!(result, Err(SessionError::NotAuthorized)));
        assert_eq!(replica.store().player(2).health, 100);
    }

    #[test]
    fn positions_converge_by_smoothing() {
        let mut replica = replica_with(&[2, 1]);
        replica.apply(state(1, 1, FieldValue::position(Vec3::ZERO)), 0);
        replica.tick();

        replica.apply(state(1, 2, FieldValue::position(Vec3::new(10.0, 0.0, 0.0))), 0);
        replica.tick();

        let view = replica.players().into_iter().find(|p| p.id == 1).unwrap();
        assert!((view.position.x - 1.5).abs() < 1e-4);
        assert_eq!(view.animation, Animation::Run);
    }

    #[test]
    fn stale_and_duplicate_updates_are_ignored() {
        let mut replica = replica_with(&[2]);
        replica.apply(state(2, 5, FieldValue::Health(40)), 0);
        replica.apply(state(2, 3, FieldValue::Health(90)), 0);
        replica.apply(state(2, 5, FieldValue::Health(40)), 0);

        assert_eq!(replica.store().player(2).health, 40);
    }

    #[test]
    fn health_transitions_become_events() {
        let mut replica = replica_with(&[2]);
        replica.apply(state(2, 1, FieldValue::Health(100)), 0);
        replica.tick();

        replica.apply(state(2, 2, FieldValue::Health(90)), 0);
        assert_eq!(
            replica.tick(),
            vec![GameEvent::PlayerHurt { player: 2, health: 90 }]
        );

        replica.apply(state(2, 3, FieldValue::Dead(true)), 0);
        replica.apply(state(2, 4, FieldValue::Health(0)), 0);
        assert_eq!(replica.tick(), vec![GameEvent::PlayerDied { player: 2 }]);

        replica.apply(state(2, 5, FieldValue::Dead(false)), 0);
        replica.apply(state(2, 6, FieldValue::Health(100)), 0);
        assert!(matches!(
            replica.tick()[..],
            [GameEvent::PlayerRespawned { player: 2, .. }]
        ));
    }

    #[test]
    fn quit_forgets_player() {
        let mut replica = replica_with(&[2, 1]);
        replica.apply(state(1, 1, FieldValue::Kills(3)), 0);
        replica.apply(Message::Quit { player: 1 }, 0);

        assert_eq!(replica.roster().ids(), vec![2]);
        assert!(!replica.store().contains(1));
    }
}
