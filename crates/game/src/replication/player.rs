use glam::Vec3;
use rkyv::{Archive, Deserialize, Serialize};

use crate::session::PlayerId;

use super::map::{FieldSet, FieldUpdate, ReplicatedMap};

pub const MAX_HEALTH: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlayerField {
    Position,
    Health,
    Dead,
    Kills,
    Deaths,
}

#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum FieldValue {
    Position([f32; 3]),
    Health(u8),
    Dead(bool),
    Kills(u32),
    Deaths(u32),
}

impl FieldValue {
    pub fn position(position: Vec3) -> Self {
        Self::Position(position.into())
    }

    pub fn field(&self) -> PlayerField {
        match self {
            Self::Position(_) => PlayerField::Position,
            Self::Health(_) => PlayerField::Health,
            Self::Dead(_) => PlayerField::Dead,
            Self::Kills(_) => PlayerField::Kills,
            Self::Deaths(_) => PlayerField::Deaths,
        }
    }

    pub fn as_position(&self) -> Option<Vec3> {
        match self {
            Self::Position(p) => Some(Vec3::from(*p)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerFields {
    pub position: Vec3,
    pub health: u8,
    pub dead: bool,
    pub kills: u32,
    pub deaths: u32,
}

impl Default for PlayerFields {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            health: MAX_HEALTH,
            dead: false,
            kills: 0,
            deaths: 0,
        }
    }
}

impl FieldSet for PlayerFields {
    type Field = PlayerField;
    type Value = FieldValue;

    fn field_of(value: &FieldValue) -> PlayerField {
        value.field()
    }

    fn read(&self, field: PlayerField) -> FieldValue {
        match field {
            PlayerField::Position => FieldValue::position(self.position),
            PlayerField::Health => FieldValue::Health(self.health),
            PlayerField::Dead => FieldValue::Dead(self.dead),
            PlayerField::Kills => FieldValue::Kills(self.kills),
            PlayerField::Deaths => FieldValue::Deaths(self.deaths),
        }
    }

    fn write(&mut self, value: FieldValue) {
        match value {
            FieldValue::Position(p) => self.position = Vec3::from(p),
            FieldValue::Health(h) => self.health = h,
            FieldValue::Dead(d) => self.dead = d,
            FieldValue::Kills(k) => self.kills = k,
            FieldValue::Deaths(d) => self.deaths = d,
        }
    }
}

pub type PlayerStore = ReplicatedMap<PlayerId, PlayerFields>;
pub type PlayerUpdate = FieldUpdate<PlayerId, FieldValue>;

impl PlayerStore {
    pub fn player(&self, id: PlayerId) -> PlayerFields {
        self.fields(id).cloned().unwrap_or_default()
    }

    pub fn position(&self, id: PlayerId) -> Vec3 {
        self.player(id).position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;

    #[test]
    fn defaults_match_fresh_player() {
        let store = PlayerStore::replica();
        assert_eq!(store.get_state(1, PlayerField::Health), FieldValue::Health(100));
        assert_eq!(store.get_state(1, PlayerField::Dead), FieldValue::Dead(false));
        assert_eq!(store.get_state(1, PlayerField::Kills), FieldValue::Kills(0));
    }

    #[test]
    fn replica_health_write_is_not_authorized() {
        let mut writer = PlayerStore::writer();
        writer.set_state(2, FieldValue::Health(70)).unwrap();

        let mut replica = PlayerStore::replica();
        for update in writer.take_updates() {
            replica.apply(&update);
        }

        let result = replica.set_state(2, FieldValue::Health(5));
        assert!(matches!(result, Err(SessionError::NotAuthorized)));
        assert_eq!(replica.get_state(2, PlayerField::Health), FieldValue::Health(70));
    }

    #[test]
    fn health_is_stored_as_written() {
        let mut writer = PlayerStore::writer();
        writer.set_state(1, FieldValue::Health(150)).unwrap();
        assert_eq!(writer.player(1).health, 150);
    }

    #[test]
    fn repeating_the_same_write_is_a_no_op() {
        let mut writer = PlayerStore::writer();
        writer.set_state(1, FieldValue::Kills(3)).unwrap();
        let once = writer.player(1);
        writer.set_state(1, FieldValue::Kills(3)).unwrap();

        assert_eq!(writer.player(1), once);
    }
}
