use std::sync::Arc;

use futures::{Stream, StreamExt};
use reagent_core::ChatResponse;
use serde::Serialize;

use crate::errors::{EncodeError, SinkClosed};

pub const FRAME_PREFIX: &str = "data: ";
pub const FRAME_SEPARATOR: &str = "\n\n";

/// One server-sent event frame: `data: <compact json>\n\n`.
pub fn encode_frame(event: &ChatResponse) -> Result<String, EncodeError> {
    let json = serde_json::to_string(event)?;
    let mut frame = String::with_capacity(FRAME_PREFIX.len() + json.len() + FRAME_SEPARATOR.len());
    frame.push_str(FRAME_PREFIX);
    frame.push_str(&json);
    frame.push_str(FRAME_SEPARATOR);
    Ok(frame)
}

/// Parse one frame back into an event. The trailing separator is optional.
pub fn decode_frame(frame: &str) -> Result<ChatResponse, EncodeError> {
    let body = frame
        .strip_prefix(FRAME_PREFIX)
        .ok_or(EncodeError::MissingPrefix)?;
    let body = body.strip_suffix(FRAME_SEPARATOR).unwrap_or(body);
    Ok(serde_json::from_str(body)?)
}

/// Parse every complete frame of a received body, in order.
pub fn decode_frames(body: &str) -> Result<Vec<ChatResponse>, EncodeError> {
    body.split(FRAME_SEPARATOR)
        .filter(|frame| !frame.trim().is_empty())
        .map(decode_frame)
        .collect()
}

/// Write side of a push transport.
pub trait FrameSink: Send {
    fn send(&mut self, frame: String) -> Result<(), SinkClosed>;
    fn close(&mut self) -> Result<(), SinkClosed>;
}

/// Counts from one [`pump`] run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PumpReport {
    /// Frames accepted by the sink.
    pub sent: usize,
    /// Frames the sink refused because it was already closed.
    pub dropped: usize,
    /// Events that failed to encode.
    pub skipped: usize,
}

/// Write one frame per event to `sink`, then close it once the stream ends.
///
/// Neither a closed sink nor an unencodable event stops the pump: both are
/// logged and counted, and the stream is always consumed to the end.
pub async fn pump<S, K>(events: S, sink: &mut K) -> PumpReport
where
    S: Stream<Item = Arc<ChatResponse>>,
    K: FrameSink + ?Sized,
{
    let mut report = PumpReport::default();
    let mut events = std::pin::pin!(events);

    while let Some(event) = events.next().await {
        let frame = match encode_frame(&event) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!(event_type = event.event_type(), error = %err, "skipping unencodable event");
                report.skipped += 1;
                continue;
            }
        };
        match sink.send(frame) {
            Ok(()) => report.sent += 1,
            Err(err) => {
                if report.dropped == 0 {
                    tracing::debug!(
                        message_id = %event.message_id(),
                        error = %err,
                        "transport closed, dropping frames"
                    );
                }
                report.dropped += 1;
            }
        }
    }

    if let Err(err) = sink.close() {
        tracing::debug!(error = %err, "transport already closed at end of stream");
    }
    tracing::debug!(
        sent = report.sent,
        dropped = report.dropped,
        skipped = report.skipped,
        "event stream pumped"
    );
    report
}
