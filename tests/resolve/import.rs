//! Integration tests for import
//!
//! Tests reference binding, placeholder substitution, duplicate handling and
//! derived parents.

use mapstudio_codec::FlatContainer;
use mapstudio_foundation::{DiagnosticKind, Diagnostics, Family, FlatValue, GameVariant, Handle};
use mapstudio_resolve::{Import, PlaceholderCache, import_container, verify_references};
use mapstudio_schema::{
    EventSubtype, ModelSubtype, PartSubtype, RegionSubtype, Subtype, SubtypeRegistry,
};
use mapstudio_storage::EntityStore;

use crate::support::{init_tracing, minimal_map, name, record};

fn registry() -> &'static SubtypeRegistry {
    SubtypeRegistry::standard()
}

fn import(container: &FlatContainer) -> (EntityStore, Diagnostics) {
    init_tracing();
    let (store, diagnostics) =
        import_container(container, registry(), &mut PlaceholderCache::new()).unwrap();
    verify_references(&store).unwrap();
    (store, diagnostics)
}

// =============================================================================
// Binding
// =============================================================================

#[test]
fn declared_references_bind_to_live_handles() {
    for variant in GameVariant::ALL {
        let (store, diagnostics) = import(&minimal_map(variant));
        assert!(diagnostics.is_empty(), "{variant}: {diagnostics:?}");

        let piece = store.by_name(Family::Part, "PieceA").unwrap();
        let model = store.models().find("m_test").unwrap();
        assert_eq!(
            store.get(piece).unwrap().reference("model").unwrap(),
            Some(Handle::Model(model))
        );
        assert_eq!(store.placeholders().count(), 0);
    }
}

#[test]
fn null_references_stay_null() {
    let variant = GameVariant::Sekiro;
    let mut container = FlatContainer::new(variant, "m11_00_00_00");
    container.push(record(variant, EventSubtype::Treasure, "chest", &[]));
    let (store, diagnostics) = import(&container);

    let chest = store.get(store.by_name(Family::Event, "chest").unwrap()).unwrap();
    assert_eq!(chest.reference("attached_region").unwrap(), None);
    assert_eq!(chest.parent, None);
    assert!(diagnostics.is_empty());
}

#[test]
fn reference_arrays_bind_slot_by_slot() {
    let variant = GameVariant::DarkSouls1;
    let mut container = FlatContainer::new(variant, "m10_00_00_00");
    container.push(record(variant, ModelSubtype::Character, "c2300", &[]));
    container.push(record(variant, RegionSubtype::Point, "P1", &[]));
    container.push(record(variant, RegionSubtype::Point, "P2", &[]));
    let mut patrol = vec![None; 8];
    patrol[0] = Some("P2".to_string());
    patrol[3] = Some("P1".to_string());
    container.push(record(
        variant,
        PartSubtype::Character,
        "c2300_0000",
        &[
            ("model", name("c2300")),
            ("patrol_regions", FlatValue::RefArray(patrol)),
        ],
    ));
    let (store, _) = import(&container);

    let enemy = store.get(store.by_name(Family::Part, "c2300_0000").unwrap()).unwrap();
    let slots = enemy.references("patrol_regions").unwrap();
    assert_eq!(slots.len(), 8);
    assert_eq!(slots[0], store.by_name(Family::Region, "P2").map(Handle::Node));
    assert_eq!(slots[3], store.by_name(Family::Region, "P1").map(Handle::Node));
    assert_eq!(slots.iter().flatten().count(), 2);
}

// =============================================================================
// Placeholders
// =============================================================================

#[test]
fn missing_region_gets_one_shared_placeholder() {
    let variant = GameVariant::DarkSouls3;
    let mut container = FlatContainer::new(variant, "m30_00_00_00");
    for event in ["E1", "E2"] {
        container.push(record(
            variant,
            EventSubtype::Sound,
            event,
            &[("attached_region", name("R_missing"))],
        ));
    }
    let (store, diagnostics) = import(&container);

    let placeholders: Vec<_> = store.placeholders().collect();
    assert_eq!(placeholders.len(), 1);
    assert_eq!(placeholders[0].name, "R_missing");
    assert_eq!(placeholders[0].subtype(), Subtype::Region(RegionSubtype::Point));
    assert_eq!(diagnostics.count_of(DiagnosticKind::PlaceholderNode), 1);

    let target = Some(Handle::Node(placeholders[0].id));
    for event in store.iter_family(Family::Event) {
        assert_eq!(event.reference("attached_region").unwrap(), target);
        assert_eq!(event.parent, Some(placeholders[0].id));
    }
}

#[test]
fn undeclared_model_becomes_placeholder_model() {
    let variant = GameVariant::EldenRing;
    let mut container = FlatContainer::new(variant, "m60_42_36_00");
    container.push(record(
        variant,
        PartSubtype::Asset,
        "AEG099_001_9000",
        &[("model", name("AEG099_001"))],
    ));
    let (store, diagnostics) = import(&container);

    let model = store.models().get(store.models().find("AEG099_001").unwrap()).unwrap();
    assert!(model.is_placeholder);
    assert_eq!(model.subtype, ModelSubtype::Asset);
    assert_eq!(diagnostics.count_of(DiagnosticKind::PlaceholderModel), 1);
    assert_eq!(store.placeholders().count(), 0);
}

#[test]
fn wrong_subtype_gets_placeholder_of_expected_subtype() {
    let variant = GameVariant::DarkSouls3;
    let mut container = minimal_map(variant);
    container.push(record(
        variant,
        RegionSubtype::Box,
        "R1",
        &[("attached_part", name("PieceA"))],
    ));
    let (store, diagnostics) = import(&container);

    assert_eq!(diagnostics.count_of(DiagnosticKind::SubtypeMismatch), 1);
    assert_eq!(diagnostics.count_of(DiagnosticKind::PlaceholderNode), 1);

    let piece = store.by_name(Family::Part, "PieceA").unwrap();
    let region = store.get(store.by_name(Family::Region, "R1").unwrap()).unwrap();
    let Some(Handle::Node(target)) = region.reference("attached_part").unwrap() else {
        panic!("attached_part should be bound");
    };
    assert_ne!(target, piece);
    let placeholder = store.get(target).unwrap();
    assert!(placeholder.is_placeholder);
    assert_eq!(placeholder.name, "PieceA");
    assert_eq!(placeholder.subtype(), Subtype::Part(PartSubtype::Collision));
    assert_eq!(store.by_name(Family::Part, "PieceA"), Some(piece));
}

#[test]
fn wrong_model_subtype_binds_with_a_warning() {
    let variant = GameVariant::DarkSouls1;
    let mut container = minimal_map(variant);
    container.push(record(
        variant,
        PartSubtype::Collision,
        "h_floor",
        &[("model", name("m_test"))],
    ));
    let (store, diagnostics) = import(&container);

    let floor = store.get(store.by_name(Family::Part, "h_floor").unwrap()).unwrap();
    assert_eq!(
        floor.reference("model").unwrap(),
        store.models().find("m_test").map(Handle::Model)
    );
    assert_eq!(diagnostics.count_of(DiagnosticKind::SubtypeMismatch), 1);
    assert_eq!(store.models().len(), 1);
}

#[test]
fn cache_is_reused_across_phases() {
    let variant = GameVariant::Bloodborne;
    let mut container = FlatContainer::new(variant, "m21_00_00_00");
    container.push(record(
        variant,
        EventSubtype::Treasure,
        "T1",
        &[("attached_region", name("R_gone"))],
    ));
    let mut cache = PlaceholderCache::new();
    let created = Import::create_nodes(&container, registry()).unwrap();
    assert_eq!(created.store().family_len(Family::Event), 1);
    assert_eq!(created.store().placeholders().count(), 0);
    let (store, _) = created.resolve(registry(), &mut cache).unwrap().into_parts();

    assert_eq!(cache.len(), 1);
    let id = cache
        .get(&store, Subtype::Region(RegionSubtype::Point), "R_gone")
        .unwrap();
    assert!(store.get(id).unwrap().is_placeholder);
}

// =============================================================================
// Names and Parents
// =============================================================================

#[test]
fn duplicate_names_keep_the_last_record() {
    let variant = GameVariant::DarkSouls1;
    let mut container = FlatContainer::new(variant, "m10_00_00_00");
    container.push(record(variant, RegionSubtype::Sphere, "R1", &[("radius", FlatValue::F32(1.0))]));
    container.push(record(variant, RegionSubtype::Sphere, "R1", &[("radius", FlatValue::F32(2.0))]));
    let (store, diagnostics) = import(&container);

    assert_eq!(store.family_len(Family::Region), 1);
    assert_eq!(diagnostics.count_of(DiagnosticKind::DuplicateName), 1);
    let region = store.get(store.by_name(Family::Region, "R1").unwrap()).unwrap();
    assert_eq!(region.get("radius").unwrap(), &mapstudio_foundation::NodeValue::F32(2.0));
}

#[test]
fn parents_follow_the_parent_field() {
    let variant = GameVariant::DarkSouls3;
    let mut container = FlatContainer::new(variant, "m30_00_00_00");
    container.push(record(variant, ModelSubtype::Object, "o0001", &[]));
    container.push(record(variant, ModelSubtype::Collision, "h0001", &[]));
    container.push(record(variant, PartSubtype::Collision, "h0001_0000", &[("model", name("h0001"))]));
    container.push(record(
        variant,
        PartSubtype::Object,
        "o0001_0000",
        &[("model", name("o0001")), ("draw_parent", name("h0001_0000"))],
    ));
    let (store, _) = import(&container);

    let floor = store.by_name(Family::Part, "h0001_0000").unwrap();
    let object = store.get(store.by_name(Family::Part, "o0001_0000").unwrap()).unwrap();
    assert_eq!(object.parent, Some(floor));
    assert_eq!(store.get(floor).unwrap().parent, None);
}

#[test]
fn foreign_subtype_is_a_configuration_error() {
    let mut container = FlatContainer::new(GameVariant::DarkSouls1, "m10_00_00_00");
    container.push(record(GameVariant::EldenRing, PartSubtype::Asset, "AEG", &[]));
    let err = import_container(&container, registry(), &mut PlaceholderCache::new()).unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(err.context.unwrap().record.as_deref(), Some("AEG"));
}
