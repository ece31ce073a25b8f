mod map;
mod player;

pub use map::{Authority, FieldSet, FieldUpdate, ReplicatedMap};
pub use player::{FieldValue, MAX_HEALTH, PlayerField, PlayerFields, PlayerStore, PlayerUpdate};
