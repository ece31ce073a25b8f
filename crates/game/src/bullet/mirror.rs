use super::{BulletId, BulletSnapshot, BulletState};

#[derive(Debug, Clone, PartialEq)]
pub enum MirrorChange {
    Added(BulletState),
    Removed(BulletId),
}

/// Read-only copy of the host's bullet set on a non-host peer.
#[derive(Debug, Default)]
pub struct BulletMirror {
    version: u64,
    bullets: Vec<BulletState>,
}

impl BulletMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the mirrored set with a newer snapshot. Older or repeated
    /// snapshots are ignored and yield `None`.
    pub fn apply(&mut self, snapshot: &BulletSnapshot) -> Option<Vec<MirrorChange>> {
        if snapshot.version <= self.version {
            return None;
        }

        let mut changes: Vec<MirrorChange> = self
            .bullets
            .iter()
            .filter(|old| !snapshot.bullets.iter().any(|b| b.id == old.id))
            .map(|old| MirrorChange::Removed(old.id))
            .collect();

        changes.extend(
            snapshot
                .bullets
                .iter()
                .filter(|new| !self.bullets.iter().any(|b| b.id == new.id))
                .map(|new| MirrorChange::Added(*new)),
        );

        self.version = snapshot.version;
        self.bullets = snapshot.bullets.clone();
        Some(changes)
    }

    pub fn bullets(&self) -> &[BulletState] {
        &self.bullets
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}
