//! Handles into the linked entity graph.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Handle to a part, region or event node in an entity store.
///
/// `index` names a storage slot. `generation` is the slot's generation when
/// the handle was issued: a slot starts at 1 and is bumped on every insert
/// and every removal, so a live slot always has an odd generation and a free
/// one an even generation. A handle is valid only while its generation
/// equals the slot's, which turns a handle kept across a removal into a
/// stale-node error rather than a reference to whatever reuses the slot.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId {
    /// Storage slot.
    pub index: u32,
    /// Slot generation at issue time; odd for every handle a store hands out.
    pub generation: u32,
}

impl NodeId {
    /// Builds a handle from a slot and its generation.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Handle of a node that has not been inserted yet.
    ///
    /// Slot `u32::MAX` is never allocated and generation 0 is never live.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            index: u32::MAX,
            generation: 0,
        }
    }

    /// Returns true for the not-yet-inserted handle.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index == u32::MAX
    }

    /// Returns true if the generation marks an occupied slot.
    #[must_use]
    pub const fn is_live_generation(self) -> bool {
        self.generation % 2 == 1
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("NodeId(unset)")
        } else {
            write!(f, "NodeId({}@{})", self.index, self.generation)
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("unset node")
        } else {
            write!(f, "node #{}@{}", self.index, self.generation)
        }
    }
}

/// Index of a model in a model table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModelId(pub u32);

impl ModelId {
    /// Returns the raw index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Model({})", self.0)
    }
}

/// A resolved reference target: either a graph node or a shared model.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Handle {
    /// A part, region or event node.
    Node(NodeId),
    /// A model in the model table.
    Model(ModelId),
}

impl Handle {
    /// Returns the node ID if this handle points at a node.
    #[must_use]
    pub const fn as_node(self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(id),
            Self::Model(_) => None,
        }
    }

    /// Returns the model ID if this handle points at a model.
    #[must_use]
    pub const fn as_model(self) -> Option<ModelId> {
        match self {
            Self::Model(id) => Some(id),
            Self::Node(_) => None,
        }
    }
}

impl From<NodeId> for Handle {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<ModelId> for Handle {
    fn from(id: ModelId) -> Self {
        Self::Model(id)
    }
}
