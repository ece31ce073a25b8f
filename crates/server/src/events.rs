use arena::{GameEvent, PlayerId, ScoreLine};

/// Host events worth a log line. Bullet traffic stays at debug level.
pub fn log_event(event: &GameEvent) {
    match event {
        GameEvent::PlayerJoined { player } => log::info!("player {} joined", player),
        GameEvent::PlayerLeft { player } => log::info!("player {} left", player),
        GameEvent::PlayerKilled { victim, killer } => {
            log::info!("player {} fragged player {}", killer, victim)
        }
        GameEvent::PlayerRespawned { player, position } => {
            log::info!("player {} respawned at {:.1?}", player, position)
        }
        GameEvent::PlayerDamaged {
            victim,
            attacker,
            health,
        } => log::debug!("player {} hit {} ({} hp)", attacker, victim, health),
        GameEvent::BulletFired { bullet } => log::debug!("bullet {} fired", bullet),
        GameEvent::BulletRetired { bullet, reason } => {
            log::debug!("bullet {} retired ({:?})", bullet, reason)
        }
        GameEvent::PlayerHurt { .. } | GameEvent::PlayerDied { .. } => {}
    }
}

/// Peer-side observations, used to check that replicas agree with the host.
#[derive(Debug, Default, Clone)]
pub struct PeerTally {
    pub deaths_seen: u64,
    pub respawns_seen: u64,
}

impl PeerTally {
    pub fn record(&mut self, observer: PlayerId, event: &GameEvent) {
        match event {
            GameEvent::PlayerDied { player } => {
                log::trace!("peer {} saw {} die", observer, player);
                self.deaths_seen += 1;
            }
            GameEvent::PlayerRespawned { .. } => self.respawns_seen += 1,
            _ => {}
        }
    }
}

pub fn log_scoreboard(title: &str, lines: &[ScoreLine]) {
    log::info!("{}:", title);
    for (rank, line) in lines.iter().enumerate() {
        log::info!(
            "  #{} player {} ({}): {} kills, {} deaths",
            rank + 1,
            line.id,
            line.name,
            line.kills,
            line.deaths
        );
    }
}
