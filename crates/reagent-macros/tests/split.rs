use futures::StreamExt;
use reagent_core::{NodeRegistry, RegistryError, RenderId, RenderRegistry, SessionId, UiNode};
use reagent_stream::{ChannelHub, ChannelSource, ExecutionContext};
use serde_json::{json, Value};

/// Client build: presentation functions only, no agent logic.
mod client {
    use serde_json::Value;

    pub type Component = fn(&Value) -> String;

    pub fn retry_banner(data: &Value) -> String {
        format!("retrying in {}s", data["seconds"])
    }

    pub fn error_card(data: &Value) -> String {
        format!("error: {}", data["error"].as_str().unwrap_or("unknown"))
    }

    pub fn step_row(data: &Value) -> String {
        format!("step {}", data["step"])
    }

    #[reagent_macros::render_sites(component = Component)]
    pub async fn execute(
        ctx: &reagent_stream::ExecutionContext,
        input: Value,
    ) -> Result<(), reagent_stream::ContextError> {
        if let Some(seconds) = input["retryAfter"].as_u64() {
            ctx.render(retry_banner, serde_json::json!({ "seconds": seconds }))?;
        }
        for step in input["steps"].as_array().into_iter().flatten() {
            ctx.render(step_row, serde_json::json!({ "step": step }))?;
        }
        ctx.render(error_card, serde_json::json!({ "error": input["error"] }))?;
        Ok(())
    }

    pub mod inline {
        use super::Component;

        /// Inline closures coerce to the component type.
        #[reagent_macros::render_sites(component = Component, render = paint)]
        pub fn execute(ctx: &Painter) {
            ctx.paint(|_| "first".to_owned(), ());
            ctx.paint(|data| format!("second {data}"), ());
        }
    }
}

/// Server build: agent logic only; component names are replaced by ids.
mod server {
    use reagent_stream::{ContextError, ExecutionContext};
    use serde_json::{json, Value};

    #[reagent_macros::render_ids]
    pub async fn execute(ctx: &ExecutionContext, input: Value) -> Result<(), ContextError> {
        if let Some(seconds) = input["retryAfter"].as_u64() {
            ctx.render(retry_banner, json!({ "seconds": seconds }))?;
        }
        for step in input["steps"].as_array().into_iter().flatten() {
            ctx.render(step_row, json!({ "step": step }))?;
        }
        ctx.render(error_card, json!({ "error": input["error"] }))?;
        Ok(())
    }
}

#[test]
fn client_registry_follows_call_site_order() {
    let registry = RenderRegistry::from_sites(client::execute()).unwrap();
    assert_eq!(registry.len(), 3);

    let data = json!({ "seconds": 5, "step": 2, "error": "boom" });
    let painted: Vec<String> = registry.iter().map(|(_, component)| component(&data)).collect();
    assert_eq!(painted, ["retrying in 5s", "step 2", "error: boom"]);

    assert!(matches!(
        registry.resolve(RenderId::from_index(3)),
        Err(RegistryError::UnknownRenderId(_))
    ));
}

#[test]
fn inline_closures_and_custom_render_name() {
    let sites = client::inline::execute();
    assert_eq!(sites.len(), 2);
    assert_eq!(sites[0].0, RenderId::from_index(0));
    assert_eq!((sites[1].1)(&json!(1)), "second 1");
}

#[tokio::test]
async fn server_events_resolve_against_the_client_registry() {
    let ui = ChannelHub::new();
    let text = ChannelHub::new();
    let session = SessionId::from_raw("s1");
    let ctx = ExecutionContext::provision(session.clone(), "agent-error", &ui, &text);

    let input = json!({ "retryAfter": 30, "steps": ["a", "b"], "error": "rate limited" });
    server::execute(&ctx, input).await.unwrap();
    ctx.finish();

    let events: Vec<_> = ui.select(&session).await.unwrap().unwrap().collect().await;
    let ids: Vec<String> = events
        .iter()
        .map(|e| e.as_ref().unwrap().render_id.to_string())
        .collect();
    assert_eq!(ids, ["render-0", "render-1", "render-1", "render-2"]);

    let nodes = NodeRegistry::new()
        .with_node("agent-error", RenderRegistry::from_sites(client::execute()).unwrap());
    let painted: Vec<String> = events
        .into_iter()
        .map(|e| {
            let event = e.unwrap();
            let component = nodes.resolve(&event.node()).unwrap();
            component(&event.data)
        })
        .collect();
    assert_eq!(
        painted,
        ["retrying in 30s", "step \"a\"", "step \"b\"", "error: rate limited"]
    );

    let unknown = UiNode {
        id: "other-node".into(),
        render_id: RenderId::from_index(0),
    };
    assert!(matches!(nodes.resolve(&unknown), Err(RegistryError::UnknownNode(_))));
}

#[tokio::test]
async fn skipped_branches_keep_their_slot() {
    let ui = ChannelHub::new();
    let text = ChannelHub::<reagent_core::TextDelta>::new();
    let session = SessionId::from_raw("s2");
    let ctx = ExecutionContext::provision(session.clone(), "agent-error", &ui, &text);

    server::execute(&ctx, json!({ "error": "timeout" })).await.unwrap();
    drop(ctx);

    let events: Vec<_> = ui.select(&session).await.unwrap().unwrap().collect().await;
    assert_eq!(events.len(), 1);
    let event = events[0].as_ref().unwrap();
    assert_eq!(event.render_id, RenderId::from_index(2));
    assert_eq!(event.data, json!({ "error": Value::from("timeout") }));
}
