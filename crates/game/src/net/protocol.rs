use rkyv::{Archive, Deserialize, Serialize, rancor};

use crate::bullet::BulletSnapshot;
use crate::input::InputFrame;
use crate::replication::{FieldValue, PlayerUpdate};
use crate::session::{PlayerId, PlayerProfile};

#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct StateUpdate {
    pub player: PlayerId,
    pub version: u64,
    pub value: FieldValue,
}

impl From<PlayerUpdate> for StateUpdate {
    fn from(update: PlayerUpdate) -> Self {
        Self {
            player: update.key,
            version: update.version,
            value: update.value,
        }
    }
}

impl StateUpdate {
    pub fn to_update(&self) -> PlayerUpdate {
        PlayerUpdate {
            key: self.player,
            version: self.version,
            value: self.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum Message {
    Joined {
        player: PlayerId,
        profile: PlayerProfile,
    },
    Quit {
        player: PlayerId,
    },
    State(StateUpdate),
    Bullets(BulletSnapshot),
    Input {
        player: PlayerId,
        input: InputFrame,
    },
}

impl Message {
    /// Membership notifications. These are delivered reliably and in order.
    pub fn is_system(&self) -> bool {
        matches!(self, Self::Joined { .. } | Self::Quit { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Envelope {
    pub sender: PlayerId,
    pub sequence: u32,
    pub message: Message,
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
}

impl Envelope {
    pub fn new(sender: PlayerId, sequence: u32, message: Message) -> Self {
        Self {
            sender,
            sequence,
            message,
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, ProtocolError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(ProtocolError::Serialize)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, ProtocolError> {
        rkyv::from_bytes::<Self, rancor::Error>(data).map_err(ProtocolError::Deserialize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bullet::{BulletId, BulletState};

    #[test]
    fn state_update_survives_the_wire() {
        let envelope = Envelope::new(
            1,
            42,
            Message::State(StateUpdate {
                player: 2,
                version: 17,
                value: FieldValue::Position([1.5, 0.0, -3.25]),
            }),
        );

        let bytes = envelope.serialize().unwrap();
        assert_eq!(Envelope::deserialize(&bytes).unwrap(), envelope);
    }

    #[test]
    fn bullet_snapshot_survives_the_wire() {
        let snapshot = BulletSnapshot {
            version: 3,
            bullets: vec![BulletState {
                id: BulletId::new(1, 900),
                owner: 1,
                origin: [0.0, 0.0, 0.0],
                position: [0.0, 1.4, 5.0],
                angle: 0.0,
                damage: 10,
                enabled: true,
            }],
        };
        let envelope = Envelope::new(1, 0, Message::Bullets(snapshot));

        let bytes = envelope.serialize().unwrap();
        assert_eq!(Envelope::deserialize(&bytes).unwrap(), envelope);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(Envelope::deserialize(&[0xde, 0xad, 0xbe, 0xef]).is_err());
    }

    #[test]
    fn only_membership_is_system() {
        assert!(Message::Quit { player: 1 }.is_system());
        assert!(
            !Message::Input {
                player: 1,
                input: InputFrame::idle()
            }
            .is_system()
        );
    }
}
