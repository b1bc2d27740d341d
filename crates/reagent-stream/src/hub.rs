use std::sync::Arc;

use dashmap::DashMap;
use futures::Stream;
use reagent_core::{ChatResponse, SessionId};

use crate::aggregate::SessionAggregate;

/// Live aggregates keyed by session, for readers that join by session id.
///
/// An aggregate is dropped from the hub once it closes; readers already
/// holding it keep draining their replay.
#[derive(Clone, Default)]
pub struct StreamHub {
    aggregates: Arc<DashMap<SessionId, SessionAggregate>>,
}

impl StreamHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open and register an aggregate expecting `expected` channels.
    /// Replaces any live aggregate of the same session.
    pub fn open(&self, session_id: SessionId, expected: usize) -> SessionAggregate {
        let aggregate = SessionAggregate::open(session_id.clone(), expected);
        if let Some(previous) = self.aggregates.insert(session_id.clone(), aggregate.clone()) {
            tracing::warn!(
                session_id = %session_id,
                message_id = %previous.message_id(),
                "replaced live aggregate for session"
            );
        }

        let aggregates = Arc::clone(&self.aggregates);
        let watched = aggregate.clone();
        tokio::spawn(async move {
            watched.closed().await;
            aggregates.remove_if(watched.session_id(), |_, current| current.ptr_eq(&watched));
        });

        aggregate
    }

    pub fn get(&self, session_id: &SessionId) -> Option<SessionAggregate> {
        self.aggregates.get(session_id).map(|entry| entry.value().clone())
    }

    /// Replay-then-follow reader for a live session, if any.
    pub fn read(&self, session_id: &SessionId) -> Option<impl Stream<Item = Arc<ChatResponse>> + Send + 'static> {
        self.get(session_id).map(|aggregate| aggregate.read())
    }

    pub fn len(&self) -> usize {
        self.aggregates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }
}
