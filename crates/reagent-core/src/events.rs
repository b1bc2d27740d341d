use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::ids::MessageId;
use crate::render::{RenderEvent, TextDelta, UiNode};

/// Events pushed to the client for one invocation. Encodes as
/// `{"type": ..., "data": ...}`, in that order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ChatResponse {
    #[serde(rename = "message/content")]
    Content(MessageContent),

    #[serde(rename = "message/ui/update")]
    UiUpdate(MessageUiUpdate),

    #[serde(rename = "message/content/delta")]
    ContentDelta(MessageContentDelta),
}

impl ChatResponse {
    /// The empty assistant message every stream starts with.
    pub fn initial(id: MessageId) -> Self {
        Self::Content(MessageContent {
            id,
            message: ContentBody {
                content: String::new(),
            },
            role: Role::Ai,
            created_at: Utc::now(),
        })
    }

    pub fn ui_update(id: MessageId, event: RenderEvent) -> Self {
        Self::UiUpdate(MessageUiUpdate {
            id,
            message: UiBody {
                ui: UiPayload {
                    node: event.node(),
                    render: event.data,
                },
            },
        })
    }

    pub fn content_delta(id: MessageId, delta: TextDelta) -> Self {
        Self::ContentDelta(MessageContentDelta {
            id,
            message: DeltaBody { content: delta },
        })
    }

    pub fn message_id(&self) -> &MessageId {
        match self {
            Self::Content(c) => &c.id,
            Self::UiUpdate(u) => &u.id,
            Self::ContentDelta(d) => &d.id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Content(_) => "message/content",
            Self::UiUpdate(_) => "message/ui/update",
            Self::ContentDelta(_) => "message/content/delta",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Ai,
    User,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContent {
    pub id: MessageId,
    pub message: ContentBody,
    pub role: Role,
    #[serde(serialize_with = "iso_millis")]
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBody {
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageUiUpdate {
    pub id: MessageId,
    pub message: UiBody,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UiBody {
    pub ui: UiPayload,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UiPayload {
    pub node: UiNode,
    pub render: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContentDelta {
    pub id: MessageId,
    pub message: DeltaBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaBody {
    pub content: TextDelta,
}

fn iso_millis<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}
