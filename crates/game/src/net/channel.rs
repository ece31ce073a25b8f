use std::future::Future;

use crate::session::{PlayerId, PlayerProfile, SessionId};

use super::protocol::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub session_id: SessionId,
    pub local_player: PlayerId,
    pub host: PlayerId,
}

impl Admission {
    pub fn is_host(&self) -> bool {
        self.host == self.local_player
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("session is full ({capacity} players)")]
    SessionFull { capacity: usize },
    #[error("channel closed")]
    Closed,
}

/// Transport between the peers of one session.
///
/// Membership messages (`Joined`, `Quit`) arrive reliably and in order on every
/// peer. Data messages are best-effort: they may be lost or reordered.
pub trait Channel: Send {
    /// Joins the session. The first admitted peer becomes the host for the
    /// session's lifetime.
    fn admit(
        &mut self,
        profile: PlayerProfile,
    ) -> impl Future<Output = Result<Admission, ChannelError>> + Send;

    fn send(&mut self, message: Message);

    fn receive(&mut self) -> Vec<Message>;

    fn leave(&mut self);
}
