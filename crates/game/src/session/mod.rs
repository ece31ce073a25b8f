mod host;
mod peer;
mod registry;

pub use host::HostHandle;
pub use peer::PeerHandle;
pub use registry::{Player, PlayerId, PlayerProfile, Roster, Session, SessionId};

use crate::config::ArenaConfig;
use crate::error::SessionError;
use crate::map::ArenaMap;
use crate::net::Channel;

/// Outcome of joining: exactly one peer per session receives `Host`.
pub enum Joined<C: Channel> {
    Host(HostHandle<C>),
    Peer(PeerHandle<C>),
}

impl<C: Channel> Joined<C> {
    pub fn is_host(&self) -> bool {
        matches!(self, Self::Host(_))
    }

    pub fn local(&self) -> PlayerId {
        match self {
            Self::Host(host) => host.local(),
            Self::Peer(peer) => peer.local(),
        }
    }

    pub fn into_host(self) -> Option<HostHandle<C>> {
        match self {
            Self::Host(host) => Some(host),
            Self::Peer(_) => None,
        }
    }

    pub fn into_peer(self) -> Option<PeerHandle<C>> {
        match self {
            Self::Host(_) => None,
            Self::Peer(peer) => Some(peer),
        }
    }
}

/// Waits for the channel to admit the local peer, then hands back the matching
/// capability. This is the only suspension point before simulation starts.
pub async fn join<C: Channel>(
    mut channel: C,
    profile: PlayerProfile,
    config: ArenaConfig,
    map: &ArenaMap,
) -> Result<Joined<C>, SessionError> {
    let admission = channel.admit(profile.clone()).await?;
    let session = Session::new(admission.session_id, admission.host, admission.local_player);

    if admission.is_host() {
        HostHandle::start(session, channel, profile, config, map).map(Joined::Host)
    } else {
        Ok(Joined::Peer(PeerHandle::new(session, channel, &config)))
    }
}
