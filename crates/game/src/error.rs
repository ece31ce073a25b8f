use crate::net::ChannelError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("only the host may write replicated state")]
    NotAuthorized,
    #[error("map has no spawn markers (expected spawn_0)")]
    MissingSpawnPoint,
    #[error("session is full ({capacity} players)")]
    SessionFull { capacity: usize },
    #[error("channel unavailable: {0}")]
    ChannelUnavailable(ChannelError),
}

impl From<ChannelError> for SessionError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::SessionFull { capacity } => Self::SessionFull { capacity },
            other => Self::ChannelUnavailable(other),
        }
    }
}
