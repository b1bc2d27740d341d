use reagent_core::SessionId;

/// Faults of one output channel. Absorbed by the aggregator: each one
/// counts as that channel's completion and is only logged.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("channel selection failed: {0}")]
    Selection(String),
    #[error("channel stream failed: {0}")]
    Stream(String),
}

impl ChannelError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Selection(_) => "selection",
            Self::Stream(_) => "stream",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    #[error("aggregate expects {expected} channels, all already attached")]
    TooManyChannels { expected: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("{channel} channel for session {session_id} is closed")]
    ChannelClosed {
        session_id: SessionId,
        channel: &'static str,
    },
    #[error("render data is not serializable: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("event is not serializable: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame does not start with the data prefix")]
    MissingPrefix,
}

/// A write or close on a transport that is already closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("transport is closed")]
pub struct SinkClosed;
