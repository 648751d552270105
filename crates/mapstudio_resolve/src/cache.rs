//! Operation-scoped cache of synthesized placeholder nodes.

use std::collections::HashMap;

use mapstudio_foundation::{Family, NodeId};
use mapstudio_schema::Subtype;
use mapstudio_storage::EntityStore;

/// Placeholders created during one pipeline call.
///
/// The caller creates the cache, passes it to the call, and drops it when the
/// call returns. Two dangling references to the same name and subtype share
/// one placeholder and produce one warning.
#[derive(Clone, Debug, Default)]
pub struct PlaceholderCache {
    nodes: HashMap<(Family, Subtype, String), NodeId>,
}

impl PlaceholderCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached placeholder if it is still a live placeholder in
    /// `store`.
    #[must_use]
    pub fn get(&self, store: &EntityStore, subtype: Subtype, name: &str) -> Option<NodeId> {
        let id = *self
            .nodes
            .get(&(subtype.family(), subtype, name.to_string()))?;
        store
            .get(id)
            .ok()
            .filter(|node| node.is_placeholder && node.name == name)
            .map(|_| id)
    }

    /// Records a placeholder.
    pub fn insert(&mut self, subtype: Subtype, name: impl Into<String>, id: NodeId) {
        self.nodes.insert((subtype.family(), subtype, name.into()), id);
    }

    /// Number of cached placeholders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if nothing has been cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Forgets every entry.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}
