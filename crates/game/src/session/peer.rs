use crate::bullet::BulletState;
use crate::config::ArenaConfig;
use crate::error::SessionError;
use crate::event::GameEvent;
use crate::input::InputFrame;
use crate::net::{Channel, Message};
use crate::replication::{FieldValue, PlayerField};
use crate::simulation::{PeerReplica, PlayerView, ScoreLine};

use super::registry::{Player, PlayerId, Session};

/// Read-only participation in a session. Exposes no replicated writes.
pub struct PeerHandle<C: Channel> {
    session: Session,
    replica: PeerReplica,
    channel: C,
}

impl<C: Channel> PeerHandle<C> {
    pub(crate) fn new(session: Session, channel: C, config: &ArenaConfig) -> Self {
        log::info!(
            "joined session {} as player {} (host {})",
            session.id,
            session.local,
            session.host
        );
        Self {
            session,
            replica: PeerReplica::new(session.local, config),
            channel,
        }
    }

    pub fn session(&self) -> Session {
        self.session
    }

    pub fn local(&self) -> PlayerId {
        self.session.local
    }

    pub fn is_host(&self) -> bool {
        false
    }

    /// Applies everything received, forwards local input to the host and smooths.
    pub fn tick(&mut self, now_ms: u64, local_input: InputFrame) -> Vec<GameEvent> {
        for message in self.channel.receive() {
            self.replica.apply(message, now_ms);
        }

        self.replica.set_local_input(local_input);
        self.channel.send(Message::Input {
            player: self.session.local,
            input: local_input,
        });

        self.replica.tick()
    }

    /// Attempted authoritative write from a replica. Always `NotAuthorized`.
    pub fn try_set_state(&mut self, player: PlayerId, value: FieldValue) -> Result<u64, SessionError> {
        self.replica.try_set_state(player, value)
    }

    pub fn get_state(&self, player: PlayerId, field: PlayerField) -> FieldValue {
        self.replica.store().get_state(player, field)
    }

    pub fn list_players(&self) -> impl Iterator<Item = &Player> {
        self.replica.roster().iter()
    }

    pub fn players(&self) -> Vec<PlayerView> {
        self.replica.players()
    }

    pub fn scoreboard(&self) -> Vec<ScoreLine> {
        self.replica.scoreboard()
    }

    pub fn bullets(&self) -> &[BulletState] {
        self.replica.bullets()
    }

    pub fn replica(&self) -> &PeerReplica {
        &self.replica
    }

    pub fn quit(mut self) {
        log::info!("player {} quitting session {}", self.session.local, self.session.id);
        self.channel.leave();
    }
}
