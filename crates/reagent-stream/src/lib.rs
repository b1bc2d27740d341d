//! Runtime half of reagent.
//!
//! An invocation writes to two session channels through its
//! [`ExecutionContext`]: UI renders and text deltas. A [`SessionAggregate`]
//! fans those channels into one replayable sequence of [`ChatResponse`]
//! events, closed once every channel has completed, and the encoder frames
//! the sequence for server-sent events.
//!
//! [`ChatResponse`]: reagent_core::ChatResponse

pub mod aggregate;
pub mod channel;
pub mod context;
pub mod encoder;
pub mod errors;
pub mod hub;
pub mod invocation;
pub mod transport;

pub use aggregate::{ChannelOutcome, JoinStatus, SessionAggregate};
pub use channel::{ChannelHub, ChannelSource, ChannelStream, ChannelWriter};
pub use context::ExecutionContext;
pub use encoder::{decode_frame, decode_frames, encode_frame, pump, FrameSink, PumpReport};
pub use errors::{AggregateError, ChannelError, ContextError, EncodeError, SinkClosed};
pub use hub::StreamHub;
pub use transport::{frame_channel, sse_response, ChannelSink};
