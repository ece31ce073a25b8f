use glam::Vec3;

use crate::config::ArenaConfig;
use crate::error::SessionError;
use crate::event::GameEvent;
use crate::input::InputFrame;
use crate::map::ArenaMap;
use crate::net::{Channel, Message, StateUpdate};
use crate::replication::{FieldValue, PlayerField};
use crate::simulation::{HostSimulation, PlayerView, ScoreLine};

use super::registry::{Player, PlayerId, PlayerProfile, Session};

/// Write capability for a session. Only the peer the channel named host gets one.
pub struct HostHandle<C: Channel> {
    session: Session,
    sim: HostSimulation,
    channel: C,
    resync_interval_ticks: u32,
    ticks: u64,
}

impl<C: Channel> HostHandle<C> {
    pub(crate) fn start(
        session: Session,
        channel: C,
        profile: PlayerProfile,
        config: ArenaConfig,
        map: &ArenaMap,
    ) -> Result<Self, SessionError> {
        let resync_interval_ticks = config.resync_interval_ticks;
        let mut sim = HostSimulation::new(config, map)?;
        sim.add_player(session.local, profile, 0)?;

        log::info!("hosting session {} as player {}", session.id, session.local);
        Ok(Self {
            session,
            sim,
            channel,
            resync_interval_ticks,
            ticks: 0,
        })
    }

    pub fn session(&self) -> Session {
        self.session
    }

    pub fn local(&self) -> PlayerId {
        self.session.local
    }

    pub fn is_host(&self) -> bool {
        true
    }

    /// Runs one authoritative tick: drains the channel, simulates, then publishes
    /// field updates and the bullet set.
    pub fn tick(
        &mut self,
        now_ms: u64,
        dt: f32,
        local_input: InputFrame,
    ) -> Result<Vec<GameEvent>, SessionError> {
        for message in self.channel.receive() {
            self.handle(message, now_ms)?;
        }
        self.sim.set_input(self.session.local, local_input);

        let report = self.sim.tick(now_ms, dt)?;
        self.ticks += 1;

        for update in report.updates {
            self.channel.send(Message::State(StateUpdate::from(update)));
        }
        if self.resync_interval_ticks > 0 && self.ticks % self.resync_interval_ticks as u64 == 0 {
            self.resync();
        }
        self.channel.send(Message::Bullets(report.bullets));

        Ok(report.events)
    }

    fn handle(&mut self, message: Message, now_ms: u64) -> Result<(), SessionError> {
        match message {
            Message::Joined { player, profile } => {
                if player != self.session.local {
                    self.sim.add_player(player, profile, now_ms)?;
                }
            }
            Message::Quit { player } => {
                self.sim.remove_player(player);
            }
            Message::Input { player, input } => self.sim.set_input(player, input),
            Message::State(_) | Message::Bullets(_) => {
                log::warn!("host received replicated state, ignored");
            }
        }
        Ok(())
    }

    /// Republishes every retained field at its current version.
    pub fn resync(&mut self) {
        let retained = self.sim.store().retained();
        log::trace!("resync of {} fields", retained.len());
        for update in retained {
            self.channel.send(Message::State(StateUpdate::from(update)));
        }
    }

    pub fn teleport(&mut self, player: PlayerId, position: Vec3) -> Result<(), SessionError> {
        self.sim.teleport(player, position)
    }

    pub fn set_health(&mut self, player: PlayerId, health: u8) -> Result<bool, SessionError> {
        self.sim.set_health(player, health)
    }

    pub fn get_state(&self, player: PlayerId, field: PlayerField) -> FieldValue {
        self.sim.store().get_state(player, field)
    }

    pub fn list_players(&self) -> impl Iterator<Item = &Player> {
        self.sim.roster().iter()
    }

    pub fn players(&self) -> Vec<PlayerView> {
        self.sim.players()
    }

    pub fn scoreboard(&self) -> Vec<ScoreLine> {
        self.sim.scoreboard()
    }

    pub fn simulation(&self) -> &HostSimulation {
        &self.sim
    }

    pub fn quit(mut self) {
        log::info!("host {} quitting session {}", self.session.local, self.session.id);
        self.channel.leave();
    }
}
