use rkyv::{Archive, Deserialize, Serialize};

pub type PlayerId = u32;
pub type SessionId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct PlayerProfile {
    pub name: String,
    pub color: [u8; 3],
}

impl PlayerProfile {
    pub fn new(name: impl Into<String>, color: [u8; 3]) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self::new("Player", [255, 255, 255])
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub profile: PlayerProfile,
    pub joined_at_ms: u64,
}

/// Players of one session, ordered by join time.
#[derive(Debug, Default)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&mut self, id: PlayerId, profile: PlayerProfile, joined_at_ms: u64) -> bool {
        if self.contains(id) {
            return false;
        }
        self.players.push(Player {
            id,
            profile,
            joined_at_ms,
        });
        true
    }

    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        let pos = self.players.iter().position(|p| p.id == id)?;
        Some(self.players.remove(pos))
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// One running game instance as seen by a single peer.
///
/// `host` names the peer holding write authority. It is fixed when the session is
/// joined and never reassigned, even if that player later quits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub host: PlayerId,
    pub local: PlayerId,
}

impl Session {
    pub fn new(id: SessionId, host: PlayerId, local: PlayerId) -> Self {
        Self { id, host, local }
    }

    pub fn is_host(&self) -> bool {
        self.host == self.local
    }
}
