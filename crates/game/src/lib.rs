pub mod bullet;
pub mod combat;
pub mod config;
pub mod error;
pub mod event;
pub mod input;
pub mod map;
pub mod movement;
pub mod net;
pub mod physics;
pub mod replication;
pub mod session;
pub mod simulation;

pub use bullet::{
    Bullet, BulletId, BulletManager, BulletMirror, BulletSnapshot, BulletState, FireControl,
    RetireReason,
};
pub use combat::{CombatResolver, HitOutcome, IgnoreReason, LifeState};
pub use config::ArenaConfig;
pub use error::SessionError;
pub use event::{GameEvent, Schedule, TimedEvent};
pub use input::{FireTrigger, InputFrame, JoystickState, Keys};
pub use map::{ArenaMap, SpawnPoints};
pub use movement::{Animation, Reconciler};
pub use net::{
    Admission, Channel, ChannelError, Envelope, LoopbackChannel, LoopbackHub, Message,
    NetworkStats, PacketLossSimulation, ProtocolError, StateUpdate,
};
pub use physics::{BodyTag, PhysicsWorld};
pub use replication::{
    Authority, FieldSet, FieldUpdate, FieldValue, MAX_HEALTH, PlayerField, PlayerFields,
    PlayerStore, ReplicatedMap,
};
pub use session::{
    HostHandle, Joined, PeerHandle, Player, PlayerId, PlayerProfile, Roster, Session, SessionId,
    join,
};
pub use simulation::{FixedTimestep, HostSimulation, PeerReplica, PlayerView, ScoreLine, TickReport};
