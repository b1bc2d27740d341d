use std::collections::HashMap;

use crate::errors::RegistryError;
use crate::render::{RenderId, UiNode};

/// Immutable render id → component table for one agent node.
///
/// Built once from the pairs produced by the client-side rewrite of the
/// node's execution method, then only read.
#[derive(Clone, Debug)]
pub struct RenderRegistry<C> {
    entries: Vec<(RenderId, C)>,
    index: HashMap<RenderId, usize>,
}

impl<C> RenderRegistry<C> {
    pub fn from_sites(sites: impl IntoIterator<Item = (RenderId, C)>) -> Result<Self, RegistryError> {
        let mut entries = Vec::new();
        let mut index = HashMap::new();
        for (render_id, component) in sites {
            if index.insert(render_id, entries.len()).is_some() {
                return Err(RegistryError::DuplicateRenderId(render_id.to_string()));
            }
            entries.push((render_id, component));
        }
        Ok(Self { entries, index })
    }

    pub fn resolve(&self, render_id: RenderId) -> Result<&C, RegistryError> {
        self.index
            .get(&render_id)
            .map(|&slot| &self.entries[slot].1)
            .ok_or_else(|| RegistryError::UnknownRenderId(render_id.to_string()))
    }

    /// Resolve a raw `render-N` string as received over the wire.
    pub fn resolve_str(&self, raw: &str) -> Result<&C, RegistryError> {
        self.resolve(raw.parse()?)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the order they were registered.
    pub fn iter(&self) -> impl Iterator<Item = (RenderId, &C)> {
        self.entries.iter().map(|(id, c)| (*id, c))
    }
}

/// The registries of every node a client knows how to paint, keyed by node id.
#[derive(Clone, Debug)]
pub struct NodeRegistry<C> {
    nodes: HashMap<String, RenderRegistry<C>>,
}

impl<C> Default for NodeRegistry<C> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }
}

impl<C> NodeRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, node_id: impl Into<String>, registry: RenderRegistry<C>) -> Self {
        self.nodes.insert(node_id.into(), registry);
        self
    }

    pub fn node(&self, node_id: &str) -> Option<&RenderRegistry<C>> {
        self.nodes.get(node_id)
    }

    pub fn resolve(&self, node: &UiNode) -> Result<&C, RegistryError> {
        self.nodes
            .get(&node.id)
            .ok_or_else(|| RegistryError::UnknownNode(node.id.clone()))?
            .resolve(node.render_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
