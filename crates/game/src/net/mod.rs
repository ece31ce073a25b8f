mod channel;
mod loopback;
mod protocol;
mod stats;

pub use channel::{Admission, Channel, ChannelError};
pub use loopback::{LoopbackChannel, LoopbackHub};
pub use protocol::{Envelope, Message, ProtocolError, StateUpdate};
pub use stats::{NetworkStats, PacketLossSimulation};
