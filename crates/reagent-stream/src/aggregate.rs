use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::{FutureExt, Stream, StreamExt};
use parking_lot::Mutex;
use reagent_core::{ChatResponse, MessageId, SessionId};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::channel::ChannelSource;
use crate::errors::AggregateError;

/// How one attached channel ended. Every variant counts as one completion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "error", rename_all = "snake_case")]
pub enum ChannelOutcome {
    /// The channel's stream ended normally.
    Completed,
    /// Selection resolved to nothing for this session.
    Unresolved,
    SelectionFailed(String),
    /// The stream yielded an error, or the channel task panicked.
    Faulted(String),
}

/// Inspectable state of the completion counter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JoinStatus {
    pub expected: usize,
    pub attached: usize,
    pub completed: Vec<(String, ChannelOutcome)>,
    pub closed: bool,
}

/// Fan-in of the output channels of one invocation.
///
/// Owns an append-only replay buffer that starts with the initial record,
/// and closes it once exactly `expected` channels have completed. Readers
/// created at any time see the whole buffer from the start, then live
/// events until close. Cloning shares the same aggregate.
#[derive(Clone)]
pub struct SessionAggregate {
    shared: Arc<Shared>,
}

struct Shared {
    session_id: SessionId,
    message_id: MessageId,
    expected: usize,
    mailbox: Mutex<Mailbox>,
    // Bumped on every append and on close; readers wait on it.
    version: watch::Sender<u64>,
}

struct Mailbox {
    events: Vec<Arc<ChatResponse>>,
    attached: usize,
    completed: Vec<(String, ChannelOutcome)>,
    closed: bool,
}

impl SessionAggregate {
    /// Open the aggregate of one invocation expecting `expected` channels.
    /// The initial record is in the buffer before this returns.
    pub fn open(session_id: SessionId, expected: usize) -> Self {
        let message_id = MessageId::new();
        let initial = Arc::new(ChatResponse::initial(message_id.clone()));
        let (version, _) = watch::channel(0);

        tracing::debug!(
            session_id = %session_id,
            message_id = %message_id,
            expected,
            "opened session aggregate"
        );

        Self {
            shared: Arc::new(Shared {
                session_id,
                message_id,
                expected,
                mailbox: Mutex::new(Mailbox {
                    events: vec![initial],
                    attached: 0,
                    completed: Vec::new(),
                    closed: expected == 0,
                }),
                version,
            }),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.shared.session_id
    }

    /// Id of the response message every event of this invocation carries.
    pub fn message_id(&self) -> &MessageId {
        &self.shared.message_id
    }

    /// Subscribe to one channel on a background task.
    ///
    /// Items are mapped with `map` and appended in the order they arrive.
    /// Selection failure, an unknown session, a stream error, a panic in
    /// `map` and a normal end are all this channel's single completion.
    pub fn attach<T, S, F>(
        &self,
        channel: impl Into<String>,
        source: Arc<S>,
        map: F,
    ) -> Result<JoinHandle<()>, AggregateError>
    where
        T: Send + 'static,
        S: ChannelSource<T> + ?Sized + 'static,
        F: Fn(&MessageId, T) -> ChatResponse + Send + Sync + 'static,
    {
        {
            let mut mailbox = self.shared.mailbox.lock();
            if mailbox.attached >= self.shared.expected {
                return Err(AggregateError::TooManyChannels {
                    expected: self.shared.expected,
                });
            }
            mailbox.attached += 1;
        }

        let channel = channel.into();
        let aggregate = self.clone();
        Ok(tokio::spawn(async move {
            let outcome = AssertUnwindSafe(aggregate.drain(&channel, source.as_ref(), &map))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| ChannelOutcome::Faulted("channel task panicked".into()));
            aggregate.complete(&channel, outcome);
        }))
    }

    async fn drain<T, S, F>(&self, channel: &str, source: &S, map: &F) -> ChannelOutcome
    where
        T: Send + 'static,
        S: ChannelSource<T> + ?Sized,
        F: Fn(&MessageId, T) -> ChatResponse,
    {
        let session_id = &self.shared.session_id;
        let mut stream = match source.select(session_id).await {
            Ok(Some(stream)) => stream,
            Ok(None) => {
                tracing::debug!(session_id = %session_id, channel, "channel not found for session");
                return ChannelOutcome::Unresolved;
            }
            Err(err) => {
                tracing::warn!(
                    session_id = %session_id,
                    channel,
                    kind = err.error_kind(),
                    error = %err,
                    "channel selection failed"
                );
                return ChannelOutcome::SelectionFailed(err.to_string());
            }
        };

        while let Some(item) = stream.next().await {
            match item {
                Ok(value) => self.push(map(&self.shared.message_id, value)),
                Err(err) => {
                    tracing::warn!(
                        session_id = %session_id,
                        channel,
                        kind = err.error_kind(),
                        error = %err,
                        "channel failed mid-stream"
                    );
                    return ChannelOutcome::Faulted(err.to_string());
                }
            }
        }
        ChannelOutcome::Completed
    }

    fn push(&self, event: ChatResponse) {
        {
            let mut mailbox = self.shared.mailbox.lock();
            if mailbox.closed {
                tracing::warn!(
                    session_id = %self.shared.session_id,
                    event_type = event.event_type(),
                    "dropping event for closed aggregate"
                );
                return;
            }
            mailbox.events.push(Arc::new(event));
        }
        self.shared.version.send_modify(|v| *v += 1);
    }

    fn complete(&self, channel: &str, outcome: ChannelOutcome) {
        let (completed, closed_now) = {
            let mut mailbox = self.shared.mailbox.lock();
            mailbox.completed.push((channel.to_owned(), outcome.clone()));
            let closed_now = !mailbox.closed && mailbox.completed.len() >= self.shared.expected;
            if closed_now {
                mailbox.closed = true;
            }
            (mailbox.completed.len(), closed_now)
        };

        tracing::debug!(
            session_id = %self.shared.session_id,
            channel,
            ?outcome,
            completed,
            expected = self.shared.expected,
            "channel completed"
        );

        if closed_now {
            tracing::info!(
                session_id = %self.shared.session_id,
                events = self.len(),
                "session aggregate closed"
            );
            self.shared.version.send_modify(|v| *v += 1);
        }
    }

    /// Replay the whole buffer, then follow live events until close.
    pub fn read(&self) -> impl Stream<Item = Arc<ChatResponse>> + Send + 'static {
        let shared = Arc::clone(&self.shared);
        let mut version = shared.version.subscribe();
        async_stream::stream! {
            let mut cursor = 0;
            loop {
                version.borrow_and_update();
                let (batch, closed) = {
                    let mailbox = shared.mailbox.lock();
                    (mailbox.events[cursor..].to_vec(), mailbox.closed)
                };
                cursor += batch.len();
                for event in batch {
                    yield event;
                }
                if closed || version.changed().await.is_err() {
                    break;
                }
            }
        }
    }

    /// Resolves once the aggregate has closed.
    pub async fn closed(&self) {
        let mut version = self.shared.version.subscribe();
        while !self.is_closed() {
            if version.changed().await.is_err() {
                return;
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.mailbox.lock().closed
    }

    /// Number of buffered events, initial record included.
    pub fn len(&self) -> usize {
        self.shared.mailbox.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the buffered events.
    pub fn snapshot(&self) -> Vec<Arc<ChatResponse>> {
        self.shared.mailbox.lock().events.clone()
    }

    pub fn completions(&self) -> JoinStatus {
        let mailbox = self.shared.mailbox.lock();
        JoinStatus {
            expected: self.shared.expected,
            attached: mailbox.attached,
            completed: mailbox.completed.clone(),
            closed: mailbox.closed,
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl std::fmt::Debug for SessionAggregate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAggregate")
            .field("session_id", &self.shared.session_id)
            .field("message_id", &self.shared.message_id)
            .field("status", &self.completions())
            .finish()
    }
}
