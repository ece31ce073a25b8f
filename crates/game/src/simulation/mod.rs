mod host;
mod peer;
mod tick;
mod view;

pub use host::{HostSimulation, TickReport};
pub use peer::PeerReplica;
pub use tick::FixedTimestep;
pub use view::{PlayerView, ScoreLine, scoreboard};
