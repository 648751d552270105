//! Integration tests for the entity store
//!
//! Tests generational handles, per-family name indices, placeholders,
//! materialization, renaming and persistent cloning.

use mapstudio_foundation::{ErrorKind, Family, GameVariant, Handle, NodeId, NodeValue};
use mapstudio_schema::{EventSubtype, PartSubtype, RegionSubtype};
use mapstudio_storage::{EntityStore, GraphNode};

use crate::support::descriptor;

const VARIANT: GameVariant = GameVariant::DarkSouls3;

fn node(subtype: impl Into<mapstudio_schema::Subtype>, name: &str) -> GraphNode {
    GraphNode::new(name, descriptor(VARIANT, subtype))
}

// =============================================================================
// Handles
// =============================================================================

#[test]
fn removed_handles_become_stale() {
    let mut store = EntityStore::new(VARIANT, "m30");
    let a = store.insert(node(RegionSubtype::Point, "A")).unwrap();
    store.remove(a).unwrap();
    let b = store.insert(node(RegionSubtype::Point, "B")).unwrap();

    assert_eq!(a.index, b.index);
    assert_ne!(a.generation, b.generation);
    assert!(matches!(store.get(a).unwrap_err().kind, ErrorKind::StaleNode(_)));
    assert_eq!(store.get(b).unwrap().name, "B");
    assert!(!store.contains(NodeId::null()));
}

#[test]
fn families_are_indexed_separately() {
    let mut store = EntityStore::new(VARIANT, "m30");
    let region = store.insert(node(RegionSubtype::Box, "shared")).unwrap();
    let event = store.insert(node(EventSubtype::Sound, "shared")).unwrap();

    assert_eq!(store.by_name(Family::Region, "shared"), Some(region));
    assert_eq!(store.by_name(Family::Event, "shared"), Some(event));
    assert_eq!(store.by_name(Family::Part, "shared"), None);
    assert_eq!(store.len(), 2);
    assert_eq!(store.family_len(Family::Region), 1);
}

#[test]
fn iteration_keeps_insertion_order_and_filters_subtype() {
    let mut store = EntityStore::new(VARIANT, "m30");
    for (subtype, name) in [
        (RegionSubtype::Box, "b1"),
        (RegionSubtype::Sphere, "s1"),
        (RegionSubtype::Box, "b2"),
    ] {
        store.insert(node(subtype, name)).unwrap();
    }
    let all: Vec<_> = store.iter_family(Family::Region).map(|n| n.name.as_str()).collect();
    assert_eq!(all, ["b1", "s1", "b2"]);
    let boxes: Vec<_> = store
        .iter_subtype(RegionSubtype::Box.into())
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(boxes, ["b1", "b2"]);
}

#[test]
fn model_nodes_are_rejected() {
    let mut store = EntityStore::new(VARIANT, "m30");
    let model = GraphNode::new(
        "m0001",
        descriptor(VARIANT, mapstudio_schema::ModelSubtype::MapPiece),
    );
    assert!(store.insert(model).is_err());
}

// =============================================================================
// Placeholders
// =============================================================================

#[test]
fn placeholder_does_not_steal_a_real_name() {
    let mut store = EntityStore::new(VARIANT, "m30");
    let real = store.insert(node(RegionSubtype::Box, "R1")).unwrap();
    let placeholder = store
        .insert_placeholder(GraphNode::placeholder("R1", descriptor(VARIANT, RegionSubtype::Point)))
        .unwrap();

    assert_eq!(store.by_name(Family::Region, "R1"), Some(real));
    assert!(store.get(placeholder).unwrap().is_placeholder);
    assert_eq!(store.placeholders().count(), 1);

    let err = store.materialize(placeholder).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateName { .. }));
}

#[test]
fn materialize_clears_the_tag() {
    let mut store = EntityStore::new(VARIANT, "m30");
    let id = store
        .insert_placeholder(GraphNode::placeholder(
            "R_missing",
            descriptor(VARIANT, RegionSubtype::Point),
        ))
        .unwrap();
    store.materialize(id).unwrap();
    assert!(!store.get(id).unwrap().is_placeholder);
    assert_eq!(store.by_name(Family::Region, "R_missing"), Some(id));
    assert_eq!(store.placeholders().count(), 0);
}

// =============================================================================
// Editing
// =============================================================================

#[test]
fn rename_keeps_the_index_consistent() {
    let mut store = EntityStore::new(VARIANT, "m30");
    let a = store.insert(node(PartSubtype::MapPiece, "A")).unwrap();
    let b = store.insert(node(PartSubtype::MapPiece, "B")).unwrap();

    store.rename(a, "C").unwrap();
    assert_eq!(store.by_name(Family::Part, "A"), None);
    assert_eq!(store.by_name(Family::Part, "C"), Some(a));

    let err = store.rename(b, "C").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateName { .. }));
    assert_eq!(store.get(b).unwrap().name, "B");
}

#[test]
fn typed_setters_reject_wrong_types() {
    let mut store = EntityStore::new(VARIANT, "m30");
    let id = store.insert(node(EventSubtype::Sfx, "fx")).unwrap();
    let fx = store.get_mut(id).unwrap();
    fx.set("sfx_id", NodeValue::I32(42)).unwrap();
    assert!(fx.set("sfx_id", NodeValue::F32(1.0)).is_err());
    assert!(fx.set("no_such_field", NodeValue::I32(1)).is_err());
    assert_eq!(fx.get("sfx_id").unwrap(), &NodeValue::I32(42));
}

#[test]
fn clones_are_independent() {
    let mut store = EntityStore::new(VARIANT, "m30");
    let part = store.insert(node(PartSubtype::Collision, "h0001")).unwrap();
    let region = store.insert(node(RegionSubtype::Box, "R1")).unwrap();

    let snapshot = store.clone();
    store
        .get_mut(region)
        .unwrap()
        .set("attached_part", NodeValue::Ref(Some(Handle::Node(part))))
        .unwrap();
    store.remove(part).unwrap();

    assert!(snapshot.contains(part));
    assert_eq!(
        snapshot.get(region).unwrap().reference("attached_part").unwrap(),
        None
    );
    assert_eq!(
        store.get(region).unwrap().outgoing().collect::<Vec<_>>(),
        vec![("attached_part", Handle::Node(part))]
    );
}
