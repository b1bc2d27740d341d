use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::errors::RegistryError;
use crate::ids::SessionId;

const RENDER_ID_PREFIX: &str = "render-";

/// Positional id of a render call site: `render-{index}`.
///
/// Assigned by source order of `render` calls inside an execution method.
/// Reordering the calls reassigns every id after the moved one.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct RenderId(usize);

impl RenderId {
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{RENDER_ID_PREFIX}{}", self.0)
    }
}

impl FromStr for RenderId {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(RENDER_ID_PREFIX)
            .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|n| n.parse().ok())
            .map(Self)
            .ok_or_else(|| RegistryError::UnknownRenderId(s.to_owned()))
    }
}

impl Serialize for RenderId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RenderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Reference to the presentation function a UI update should be painted with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiNode {
    /// Id of the agent node whose registry owns `render_id`.
    pub id: String,
    pub render_id: RenderId,
}

/// Emitted by a running invocation each time agent logic calls `render`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderEvent {
    pub session_id: SessionId,
    pub node_id: String,
    pub render_id: RenderId,
    pub data: Value,
}

impl RenderEvent {
    pub fn node(&self) -> UiNode {
        UiNode {
            id: self.node_id.clone(),
            render_id: self.render_id,
        }
    }
}

/// One chunk of streamed markdown text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDelta {
    pub delta: String,
}

impl TextDelta {
    pub fn new(delta: impl Into<String>) -> Self {
        Self { delta: delta.into() }
    }
}
