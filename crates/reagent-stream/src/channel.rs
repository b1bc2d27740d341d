use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream::{BoxStream, StreamExt};
use reagent_core::SessionId;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::errors::{ChannelError, ContextError};

/// Lazily produced items of one channel. An `Err` item ends the channel.
pub type ChannelStream<T> = BoxStream<'static, Result<T, ChannelError>>;

/// One asynchronous output source of an invocation, selected by session.
#[async_trait]
pub trait ChannelSource<T: Send + 'static>: Send + Sync {
    /// `Ok(None)` means the session is not known to this source.
    async fn select(&self, session_id: &SessionId) -> Result<Option<ChannelStream<T>>, ChannelError>;
}

/// In-memory channel provisioning keyed by session.
///
/// `create` hands the producer side to the execution context; `select` hands
/// the consumer side to the aggregator, once. Items written before the
/// channel is selected are buffered.
pub struct ChannelHub<T> {
    pending: DashMap<SessionId, mpsc::UnboundedReceiver<Result<T, ChannelError>>>,
}

impl<T> Default for ChannelHub<T> {
    fn default() -> Self {
        Self {
            pending: DashMap::new(),
        }
    }
}

impl<T> ChannelHub<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the channel for a session. A channel created earlier for the
    /// same session and not yet selected is replaced.
    pub fn create(&self, session_id: SessionId, name: &'static str) -> ChannelWriter<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.pending.insert(session_id.clone(), rx).is_some() {
            tracing::warn!(session_id = %session_id, channel = name, "replaced unselected channel");
        }
        ChannelWriter {
            session_id,
            name,
            tx,
        }
    }

    /// Number of channels created but not yet selected.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[async_trait]
impl<T: Send + 'static> ChannelSource<T> for ChannelHub<T> {
    async fn select(&self, session_id: &SessionId) -> Result<Option<ChannelStream<T>>, ChannelError> {
        Ok(self
            .pending
            .remove(session_id)
            .map(|(_, rx)| UnboundedReceiverStream::new(rx).boxed()))
    }
}

/// Producer side of one session channel. Dropping every clone completes the
/// channel.
#[derive(Debug)]
pub struct ChannelWriter<T> {
    session_id: SessionId,
    name: &'static str,
    tx: mpsc::UnboundedSender<Result<T, ChannelError>>,
}

impl<T> Clone for ChannelWriter<T> {
    fn clone(&self) -> Self {
        Self {
            session_id: self.session_id.clone(),
            name: self.name,
            tx: self.tx.clone(),
        }
    }
}

impl<T> ChannelWriter<T> {
    pub fn send(&self, item: T) -> Result<(), ContextError> {
        self.tx.send(Ok(item)).map_err(|_| self.closed())
    }

    /// End the channel with a fault.
    pub fn fail(self, error: ChannelError) -> Result<(), ContextError> {
        self.tx.send(Err(error)).map_err(|_| self.closed())
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn closed(&self) -> ContextError {
        ContextError::ChannelClosed {
            session_id: self.session_id.clone(),
            channel: self.name,
        }
    }
}
