use std::collections::HashMap;

use crate::session::PlayerId;

/// Host-side fire-rate cooldown per player.
#[derive(Debug)]
pub struct FireControl {
    fire_rate_ms: u64,
    last_fired: HashMap<PlayerId, u64>,
}

impl FireControl {
    pub fn new(fire_rate_ms: u64) -> Self {
        Self {
            fire_rate_ms,
            last_fired: HashMap::new(),
        }
    }

    pub fn can_fire(&self, player: PlayerId, now_ms: u64) -> bool {
        match self.last_fired.get(&player) {
            Some(&last) => now_ms.saturating_sub(last) >= self.fire_rate_ms,
            None => true,
        }
    }

    /// Records a shot if the cooldown has elapsed. Suppressed attempts leave the
    /// timestamp unchanged.
    pub fn try_fire(&mut self, player: PlayerId, now_ms: u64) -> bool {
        if !self.can_fire(player, now_ms) {
            return false;
        }
        self.last_fired.insert(player, now_ms);
        true
    }

    pub fn last_fired(&self, player: PlayerId) -> Option<u64> {
        self.last_fired.get(&player).copied()
    }

    pub fn forget(&mut self, player: PlayerId) {
        self.last_fired.remove(&player);
    }
}
