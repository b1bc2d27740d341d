use reagent_core::{RenderEvent, RenderId, SessionId, TextDelta};
use serde::Serialize;

use crate::channel::{ChannelHub, ChannelWriter};
use crate::errors::ContextError;

pub const UI_CHANNEL: &str = "ui";
pub const TEXT_CHANNEL: &str = "text";

/// Handle given to agent logic while a node executes.
///
/// `render` takes the call site's `RenderId` rather than a component: on the
/// server the `#[render_ids]` attribute rewrites `ctx.render(Component, data)`
/// into `ctx.render(RenderId::from_index(n), data)`, with `n` assigned in the
/// same source order the client registry uses.
#[derive(Clone, Debug)]
pub struct ExecutionContext {
    node_id: String,
    ui: ChannelWriter<RenderEvent>,
    text: ChannelWriter<TextDelta>,
}

impl ExecutionContext {
    pub fn new(
        node_id: impl Into<String>,
        ui: ChannelWriter<RenderEvent>,
        text: ChannelWriter<TextDelta>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            ui,
            text,
        }
    }

    /// Create both output channels of a session and bind a context to them.
    pub fn provision(
        session_id: SessionId,
        node_id: impl Into<String>,
        ui: &ChannelHub<RenderEvent>,
        text: &ChannelHub<TextDelta>,
    ) -> Self {
        Self::new(
            node_id,
            ui.create(session_id.clone(), UI_CHANNEL),
            text.create(session_id, TEXT_CHANNEL),
        )
    }

    /// A context for another node of the same invocation, sharing channels.
    pub fn for_node(&self, node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            ui: self.ui.clone(),
            text: self.text.clone(),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        self.ui.session_id()
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn render(&self, render_id: RenderId, data: impl Serialize) -> Result<(), ContextError> {
        let event = RenderEvent {
            session_id: self.session_id().clone(),
            node_id: self.node_id.clone(),
            render_id,
            data: serde_json::to_value(data)?,
        };
        tracing::trace!(
            session_id = %event.session_id,
            node_id = %event.node_id,
            render_id = %render_id,
            "render"
        );
        self.ui.send(event)
    }

    pub fn text(&self, delta: impl Into<String>) -> Result<(), ContextError> {
        self.text.send(TextDelta::new(delta))
    }

    /// Complete this context's share of both channels.
    pub fn finish(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelSource;
    use futures::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn render_and_text_land_on_their_channels() {
        let ui = ChannelHub::new();
        let text = ChannelHub::new();
        let session = SessionId::from_raw("s1");
        let ctx = ExecutionContext::provision(session.clone(), "agent-error", &ui, &text);

        ctx.render(RenderId::from_index(0), json!({"error": "boom"})).unwrap();
        ctx.text("Hello").unwrap();
        ctx.finish();

        let renders: Vec<_> = ui.select(&session).await.unwrap().unwrap().collect().await;
        assert_eq!(renders.len(), 1);
        let event = renders[0].as_ref().unwrap();
        assert_eq!(event.node_id, "agent-error");
        assert_eq!(event.render_id, RenderId::from_index(0));
        assert_eq!(event.data, json!({"error": "boom"}));

        let deltas: Vec<_> = text.select(&session).await.unwrap().unwrap().collect().await;
        assert_eq!(deltas, vec![Ok(TextDelta::new("Hello"))]);
    }

    #[tokio::test]
    async fn channels_complete_when_every_node_context_is_gone() {
        let ui = ChannelHub::new();
        let text = ChannelHub::<TextDelta>::new();
        let session = SessionId::from_raw("s1");
        let root = ExecutionContext::provision(session.clone(), "input", &ui, &text);
        let child = root.for_node("user");
        assert_eq!(child.node_id(), "user");
        assert_eq!(child.session_id(), &session);

        let mut stream = ui.select(&session).await.unwrap().unwrap();
        root.finish();
        child.render(RenderId::from_index(1), 42).unwrap();
        child.finish();

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.node_id, "user");
        assert!(stream.next().await.is_none());
    }
}
