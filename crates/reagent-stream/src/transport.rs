use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use futures::{Stream, StreamExt};
use reagent_core::ChatResponse;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::encoder::{pump, FrameSink};
use crate::errors::SinkClosed;

pub const EVENT_STREAM: &str = "text/event-stream";

/// [`FrameSink`] over an in-process frame queue.
pub struct ChannelSink {
    tx: Option<mpsc::UnboundedSender<String>>,
}

impl FrameSink for ChannelSink {
    fn send(&mut self, frame: String) -> Result<(), SinkClosed> {
        let tx = self.tx.as_ref().ok_or(SinkClosed)?;
        tx.send(frame).map_err(|_| SinkClosed)
    }

    fn close(&mut self) -> Result<(), SinkClosed> {
        self.tx.take().map(drop).ok_or(SinkClosed)
    }
}

/// A connected sink and the frames it receives.
pub fn frame_channel() -> (ChannelSink, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink { tx: Some(tx) }, rx)
}

/// Serve an event stream as `text/event-stream`.
///
/// A background task pumps the events into the response body. When the
/// client goes away the remaining frames are dropped, but the events are
/// still consumed.
pub fn sse_response<S>(events: S) -> Response
where
    S: Stream<Item = Arc<ChatResponse>> + Send + 'static,
{
    let (mut sink, frames) = frame_channel();
    tokio::spawn(async move {
        pump(events, &mut sink).await;
    });

    let body = Body::from_stream(UnboundedReceiverStream::new(frames).map(Ok::<_, Infallible>));
    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(EVENT_STREAM));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}
