//! Named end-to-end scenarios.

use mapstudio_codec::{FlatContainer, encode};
use mapstudio_foundation::{DiagnosticKind, ErrorKind, Family, FlatValue, GameVariant, Handle};
use mapstudio_pipeline::{Pipeline, PipelineConfig};
use mapstudio_resolve::{ExportOptions, PlaceholderCache, verify_references};
use mapstudio_schema::{EventSubtype, ModelSubtype, PartSubtype, RegionSubtype, Subtype, SubtypeRegistry};

use crate::support::{descriptor, init_tracing, minimal_map, name, record};

fn pipeline() -> Pipeline<'static> {
    init_tracing();
    Pipeline::new(PipelineConfig::offline())
}

// =============================================================================
// Minimal Graph
// =============================================================================

/// The minimal map with its model declaration filled in the way a shipped
/// container carries it.
fn declared_minimal_map(variant: GameVariant) -> FlatContainer {
    let mut container = minimal_map(variant);
    let desc = descriptor(variant, ModelSubtype::MapPiece);
    let model = &mut container.models[0];
    model
        .set(&desc, "sib_path", FlatValue::String(r"N:\FDP\custom\m_test.sib".into()))
        .unwrap();
    model.set(&desc, "instance_count", FlatValue::I32(1)).unwrap();
    container
}

#[test]
fn minimal_graph_links_and_reproduces_its_records() {
    let variant = GameVariant::DarkSouls3;
    let container = declared_minimal_map(variant);
    let bytes = encode(&container, SubtypeRegistry::standard()).unwrap();
    let imported = pipeline().import(&bytes, &mut PlaceholderCache::new()).unwrap();
    let store = &imported.store;

    assert!(imported.diagnostics.is_empty());
    assert_eq!(store.len(), 1);
    assert_eq!(store.family_len(Family::Part), 1);
    let model = store.models().find("m_test").unwrap();
    let piece = store.get(store.by_name(Family::Part, "PieceA").unwrap()).unwrap();
    assert_eq!(piece.reference("model").unwrap(), Some(Handle::Model(model)));

    let exported = pipeline()
        .export_container(store, &ExportOptions::all())
        .unwrap()
        .container;
    assert_eq!(exported.models, container.models);
    assert_eq!(exported.parts, container.parts);
    assert_eq!(
        encode(&exported, SubtypeRegistry::standard()).unwrap(),
        bytes
    );
}

// =============================================================================
// Dangling Event Reference
// =============================================================================

fn dangling(variant: GameVariant) -> FlatContainer {
    let mut container = FlatContainer::new(variant, "m10_00_00_00");
    container.push(record(
        variant,
        EventSubtype::Treasure,
        "E_chest",
        &[("attached_region", name("R_missing"))],
    ));
    container
}

#[test]
fn dangling_region_gets_a_placeholder_and_one_warning() {
    for variant in GameVariant::ALL {
        let imported = pipeline()
            .import_container(&dangling(variant), &mut PlaceholderCache::new())
            .unwrap();
        let store = &imported.store;

        assert_eq!(imported.diagnostics.len(), 1, "{variant}");
        assert_eq!(imported.diagnostics.count_of(DiagnosticKind::PlaceholderNode), 1);
        verify_references(store).unwrap();

        let chest = store.get(store.by_name(Family::Event, "E_chest").unwrap()).unwrap();
        let Some(Handle::Node(target)) = chest.reference("attached_region").unwrap() else {
            panic!("{variant}: attached_region should be bound");
        };
        let region = store.get(target).unwrap();
        assert!(region.is_placeholder);
        assert_eq!(region.name, "R_missing");
        assert_eq!(region.subtype(), Subtype::Region(RegionSubtype::Point));
    }
}

#[test]
fn dangling_region_blocks_reexport() {
    let imported = pipeline()
        .import_container(&dangling(GameVariant::DarkSouls1), &mut PlaceholderCache::new())
        .unwrap();

    let err = pipeline()
        .export(&imported.store, &ExportOptions::all())
        .unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::PlaceholderExport { ref source_name, ref target, .. }
            if source_name == "E_chest" && target == "R_missing"
    ));
    assert!(err.to_string().contains("materialize"));
}

#[test]
fn materialized_region_exports_as_a_real_record() {
    let mut store = pipeline()
        .import_container(&dangling(GameVariant::Bloodborne), &mut PlaceholderCache::new())
        .unwrap()
        .store;
    let placeholder = store.placeholders().next().unwrap().id;
    store.materialize(placeholder).unwrap();

    let exported = pipeline().export(&store, &ExportOptions::all()).unwrap();
    let reimported = pipeline()
        .import(&exported.bytes, &mut PlaceholderCache::new())
        .unwrap();
    assert!(reimported.diagnostics.is_empty());
    assert_eq!(reimported.store.placeholders().count(), 0);
    assert!(reimported.store.by_name(Family::Region, "R_missing").is_some());
}

// =============================================================================
// Editing Between Import and Export
// =============================================================================

#[test]
fn edits_survive_a_round_trip() {
    let variant = GameVariant::EldenRing;
    let mut container = minimal_map(variant);
    container.push(record(variant, ModelSubtype::Collision, "h0001", &[]));
    container.push(record(
        variant,
        PartSubtype::Collision,
        "h0001_0000",
        &[("model", name("h0001"))],
    ));
    let mut store = pipeline()
        .import_container(&container, &mut PlaceholderCache::new())
        .unwrap()
        .store;

    let floor = store.by_name(Family::Part, "h0001_0000").unwrap();
    store.rename(floor, "h0001_0001").unwrap();
    let piece = store.by_name(Family::Part, "PieceA").unwrap();
    store
        .get_mut(piece)
        .unwrap()
        .set("translate", mapstudio_foundation::NodeValue::Vec3([1.0, 2.0, 3.0]))
        .unwrap();

    let bytes = pipeline().export(&store, &ExportOptions::all()).unwrap().bytes;
    let store = pipeline()
        .import(&bytes, &mut PlaceholderCache::new())
        .unwrap()
        .store;
    assert!(store.by_name(Family::Part, "h0001_0000").is_none());
    assert!(store.by_name(Family::Part, "h0001_0001").is_some());
    let piece = store.get(store.by_name(Family::Part, "PieceA").unwrap()).unwrap();
    assert_eq!(
        piece.get("translate").unwrap(),
        &mapstudio_foundation::NodeValue::Vec3([1.0, 2.0, 3.0])
    );
}

#[test]
fn corrupt_bytes_yield_no_store() {
    let bytes = encode(&minimal_map(GameVariant::Sekiro), SubtypeRegistry::standard()).unwrap();
    let err = pipeline()
        .import(&bytes[..bytes.len() - 3], &mut PlaceholderCache::new())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Truncated { .. } | ErrorKind::Corrupt(_)));
}
