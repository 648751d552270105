//! The entity store: owner of every graph node and model in a session.
//!
//! Node slots are allocated with generational indices. A slot's generation
//! is odd while a node lives in it and even while it is free, so a handle to
//! a removed node is detected as stale even after the slot is reused.
//!
//! Storage is backed by `im` collections; cloning a store is O(1) and the
//! clone shares structure with the original until either side is modified.

// Slot indices are u32 by construction
#![allow(clippy::cast_possible_truncation)]

use mapstudio_foundation::{Error, ErrorKind, Family, GameVariant, NodeId, Result};
use mapstudio_schema::Subtype;

use crate::model::ModelTable;
use crate::node::GraphNode;

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    node: Option<GraphNode>,
}

/// Insertion order and name index for one family.
#[derive(Clone, Debug, Default)]
struct FamilyIndex {
    order: im::Vector<NodeId>,
    names: im::OrdMap<String, NodeId>,
}

/// Owner of every node and model produced by one import.
#[derive(Clone, Debug)]
pub struct EntityStore {
    variant: GameVariant,
    map_id: String,
    slots: im::Vector<Slot>,
    free_list: Vec<u32>,
    live_count: usize,
    parts: FamilyIndex,
    regions: FamilyIndex,
    events: FamilyIndex,
    models: ModelTable,
}

impl EntityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(variant: GameVariant, map_id: impl Into<String>) -> Self {
        Self {
            variant,
            map_id: map_id.into(),
            slots: im::Vector::new(),
            free_list: Vec::new(),
            live_count: 0,
            parts: FamilyIndex::default(),
            regions: FamilyIndex::default(),
            events: FamilyIndex::default(),
            models: ModelTable::new(),
        }
    }

    /// Game variant the store was built for.
    #[must_use]
    pub const fn variant(&self) -> GameVariant {
        self.variant
    }

    /// Map identifier, e.g. `m10_00_00_00`.
    #[must_use]
    pub fn map_id(&self) -> &str {
        &self.map_id
    }

    /// Changes the map identifier used for derived model paths.
    pub fn set_map_id(&mut self, map_id: impl Into<String>) {
        self.map_id = map_id.into();
    }

    /// The model table.
    #[must_use]
    pub const fn models(&self) -> &ModelTable {
        &self.models
    }

    /// The model table, mutably.
    pub fn models_mut(&mut self) -> &mut ModelTable {
        &mut self.models
    }

    /// Replaces the model table.
    pub fn set_models(&mut self, models: ModelTable) {
        self.models = models;
    }

    /// Inserts a node and indexes it by name.
    ///
    /// If another node of the family already has the name, the new node
    /// takes over the name index; the old node stays in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the node belongs to the model family, which is
    /// kept in the model table instead.
    pub fn insert(&mut self, node: GraphNode) -> Result<NodeId> {
        let name = node.name.clone();
        let (id, family) = self.allocate(node)?;
        self.index_mut(family)?.names.insert(name, id);
        Ok(id)
    }

    /// Inserts a placeholder node.
    ///
    /// The placeholder is indexed by name only if no other node of the
    /// family has the name.
    ///
    /// # Errors
    ///
    /// Returns an error if the node belongs to the model family.
    pub fn insert_placeholder(&mut self, mut node: GraphNode) -> Result<NodeId> {
        node.is_placeholder = true;
        let name = node.name.clone();
        let (id, family) = self.allocate(node)?;
        let index = self.index_mut(family)?;
        if !index.names.contains_key(&name) {
            index.names.insert(name, id);
        }
        Ok(id)
    }

    fn allocate(&mut self, mut node: GraphNode) -> Result<(NodeId, Family)> {
        let family = node.family();
        self.index(family)?;

        let id = if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            NodeId::new(index, slot.generation)
        } else {
            let index = u32::try_from(self.slots.len())
                .map_err(|_| Error::new(ErrorKind::Internal("node slots exhausted".into())))?;
            self.slots.push_back(Slot {
                generation: 1,
                node: None,
            });
            NodeId::new(index, 1)
        };

        node.id = id;
        self.slots[id.index as usize].node = Some(node);
        self.index_mut(family)?.order.push_back(id);
        self.live_count += 1;
        Ok((id, family))
    }

    /// Removes a node and frees its slot.
    ///
    /// References to the removed node held by other nodes are left as they
    /// are and become stale.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale or unknown.
    pub fn remove(&mut self, id: NodeId) -> Result<GraphNode> {
        self.validate(id)?;
        let slot = &mut self.slots[id.index as usize];
        slot.generation += 1;
        let node = slot.node.take().ok_or_else(|| Error::node_not_found(id))?;
        self.free_list.push(id.index);
        self.live_count -= 1;

        let index = self.index_mut(node.family())?;
        if let Some(pos) = index.order.index_of(&id) {
            index.order.remove(pos);
        }
        if index.names.get(&node.name) == Some(&id) {
            index.names.remove(&node.name);
        }
        Ok(node)
    }

    /// Checks that a handle refers to a live node.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for unknown or free slots and a stale error
    /// for handles from an earlier generation.
    pub fn validate(&self, id: NodeId) -> Result<()> {
        let Some(slot) = self.slots.get(id.index as usize) else {
            return Err(Error::node_not_found(id));
        };
        if slot.generation != id.generation {
            return Err(Error::stale_node(id));
        }
        if !id.is_live_generation() {
            return Err(Error::node_not_found(id));
        }
        Ok(())
    }

    /// Returns true if the handle refers to a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.validate(id).is_ok()
    }

    /// Returns a node.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale or unknown.
    pub fn get(&self, id: NodeId) -> Result<&GraphNode> {
        self.validate(id)?;
        self.slots[id.index as usize]
            .node
            .as_ref()
            .ok_or_else(|| Error::node_not_found(id))
    }

    /// Returns a node mutably.
    ///
    /// Renaming through this reference bypasses the name index; use
    /// [`EntityStore::rename`] instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale or unknown.
    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut GraphNode> {
        self.validate(id)?;
        self.slots[id.index as usize]
            .node
            .as_mut()
            .ok_or_else(|| Error::node_not_found(id))
    }

    /// Looks up a node by family and exact name.
    #[must_use]
    pub fn by_name(&self, family: Family, name: &str) -> Option<NodeId> {
        self.index(family).ok()?.names.get(name).copied()
    }

    /// Handles of a family in insertion order.
    pub fn ids(&self, family: Family) -> impl Iterator<Item = NodeId> + '_ {
        self.index(family)
            .ok()
            .into_iter()
            .flat_map(|index| index.order.iter().copied())
    }

    /// Nodes of a family in insertion order.
    pub fn iter_family(&self, family: Family) -> impl Iterator<Item = &GraphNode> + '_ {
        self.ids(family).filter_map(|id| self.get(id).ok())
    }

    /// Nodes of one subtype in insertion order.
    pub fn iter_subtype(&self, subtype: Subtype) -> impl Iterator<Item = &GraphNode> + '_ {
        self.iter_family(subtype.family())
            .filter(move |node| node.subtype() == subtype)
    }

    /// Every live node, family by family in container order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> + '_ {
        [Family::Part, Family::Region, Family::Event]
            .into_iter()
            .flat_map(|family| self.iter_family(family))
    }

    /// Every placeholder node.
    pub fn placeholders(&self) -> impl Iterator<Item = &GraphNode> + '_ {
        self.nodes().filter(|node| node.is_placeholder)
    }

    /// Turns a placeholder into a real node that export will serialize.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is invalid or another node of the
    /// family already owns the placeholder's name.
    pub fn materialize(&mut self, id: NodeId) -> Result<()> {
        let (family, name) = {
            let node = self.get(id)?;
            (node.family(), node.name.clone())
        };
        if let Some(owner) = self.by_name(family, &name) {
            if owner != id {
                return Err(Error::duplicate_name(family, name));
            }
        }
        self.get_mut(id)?.is_placeholder = false;
        self.index_mut(family)?.names.insert(name, id);
        tracing::debug!(%family, node = %id, "materialized placeholder");
        Ok(())
    }

    /// Renames a node and updates the name index.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is invalid or another node of the
    /// family already has the new name.
    pub fn rename(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let (family, old) = {
            let node = self.get(id)?;
            (node.family(), node.name.clone())
        };
        if let Some(owner) = self.by_name(family, &name) {
            if owner != id {
                return Err(Error::duplicate_name(family, name));
            }
        }
        let is_placeholder = self.get(id)?.is_placeholder;
        let index = self.index_mut(family)?;
        if index.names.get(&old) == Some(&id) {
            index.names.remove(&old);
        }
        if !is_placeholder || !index.names.contains_key(&name) {
            index.names.insert(name.clone(), id);
        }
        self.get_mut(id)?.name = name;
        Ok(())
    }

    /// Total number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live_count
    }

    /// Returns true if there are no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Number of live nodes in a family.
    #[must_use]
    pub fn family_len(&self, family: Family) -> usize {
        self.index(family).map_or(0, |index| index.order.len())
    }

    fn index(&self, family: Family) -> Result<&FamilyIndex> {
        match family {
            Family::Part => Ok(&self.parts),
            Family::Region => Ok(&self.regions),
            Family::Event => Ok(&self.events),
            Family::Model => Err(models_are_not_nodes()),
        }
    }

    fn index_mut(&mut self, family: Family) -> Result<&mut FamilyIndex> {
        match family {
            Family::Part => Ok(&mut self.parts),
            Family::Region => Ok(&mut self.regions),
            Family::Event => Ok(&mut self.events),
            Family::Model => Err(models_are_not_nodes()),
        }
    }
}

fn models_are_not_nodes() -> Error {
    Error::new(ErrorKind::Internal(
        "models live in the model table, not as graph nodes".into(),
    ))
}
