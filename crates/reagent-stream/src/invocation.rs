use std::sync::Arc;

use reagent_core::{ChatResponse, RenderEvent, SessionId, TextDelta};

use crate::aggregate::SessionAggregate;
use crate::channel::ChannelSource;
use crate::context::{TEXT_CHANNEL, UI_CHANNEL};
use crate::errors::AggregateError;
use crate::hub::StreamHub;

/// Channels every invocation produces: UI renders and text deltas.
pub const INVOCATION_CHANNELS: usize = 2;

/// Start streaming one invocation: open its aggregate on `hub` and attach
/// the UI and text channels of `session_id`.
///
/// The returned aggregate already holds the initial record. It closes once
/// both channels have completed, whatever way they end.
pub fn start(
    hub: &StreamHub,
    session_id: SessionId,
    ui: Arc<dyn ChannelSource<RenderEvent>>,
    text: Arc<dyn ChannelSource<TextDelta>>,
) -> Result<SessionAggregate, AggregateError> {
    let aggregate = hub.open(session_id, INVOCATION_CHANNELS);
    aggregate.attach(UI_CHANNEL, ui, |id, event| ChatResponse::ui_update(id.clone(), event))?;
    aggregate.attach(TEXT_CHANNEL, text, |id, delta| ChatResponse::content_delta(id.clone(), delta))?;
    tracing::info!(
        session_id = %aggregate.session_id(),
        message_id = %aggregate.message_id(),
        "invocation stream started"
    );
    Ok(aggregate)
}
