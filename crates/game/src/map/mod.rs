mod arena;
mod objects;
mod spawn;

pub use arena::ArenaMap;
pub use objects::{MapObject, MapObjectKind, Marker};
pub use spawn::SpawnPoints;
