//! Integration tests for the region/collision reference pair
//!
//! Tests that reconciliation picks the first pointing region, flags the
//! others, and that a reconciled pair exports with both sides written.

use mapstudio_codec::FlatContainer;
use mapstudio_foundation::{DiagnosticKind, Family, GameVariant, Handle};
use mapstudio_resolve::{ExportOptions, PlaceholderCache, export_store, import_container};
use mapstudio_schema::{ModelSubtype, PartSubtype, RegionSubtype, SubtypeRegistry};
use mapstudio_storage::StandardPathConvention;

use crate::support::{descriptor, name, record};

fn registry() -> &'static SubtypeRegistry {
    SubtypeRegistry::standard()
}

fn floor_map(variant: GameVariant, regions: &[&str]) -> FlatContainer {
    let mut container = FlatContainer::new(variant, "m30_00_00_00");
    container.push(record(variant, ModelSubtype::Collision, "h0001", &[]));
    container.push(record(
        variant,
        PartSubtype::Collision,
        "h0001_0000",
        &[("model", name("h0001"))],
    ));
    for region in regions {
        container.push(record(
            variant,
            RegionSubtype::Box,
            region,
            &[("attached_part", name("h0001_0000"))],
        ));
    }
    container
}

#[test]
fn first_pointing_region_fills_the_inverse() {
    let container = floor_map(GameVariant::DarkSouls3, &["R_b", "R_a", "R_c"]);
    let (store, diagnostics) =
        import_container(&container, registry(), &mut PlaceholderCache::new()).unwrap();

    let floor = store.get(store.by_name(Family::Part, "h0001_0000").unwrap()).unwrap();
    assert_eq!(
        floor.reference("linked_region").unwrap(),
        store.by_name(Family::Region, "R_b").map(Handle::Node)
    );
    // R_a and R_c keep pointing at a floor that names R_b.
    assert_eq!(diagnostics.count_of(DiagnosticKind::CycleDisagreement), 2);
    let flagged: Vec<_> = diagnostics.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(flagged, ["R_a", "R_c"]);
    for region in store.iter_family(Family::Region) {
        assert_eq!(region.parent, Some(floor.id));
    }
}

#[test]
fn reconciled_pair_exports_both_sides() {
    for variant in [GameVariant::DarkSouls3, GameVariant::Sekiro, GameVariant::EldenRing] {
        let container = floor_map(variant, &["R1"]);
        let (store, _) =
            import_container(&container, registry(), &mut PlaceholderCache::new()).unwrap();
        let output = export_store(
            &store,
            registry(),
            &StandardPathConvention,
            &ExportOptions::all(),
        )
        .unwrap();

        let desc = descriptor(variant, PartSubtype::Collision);
        let floor = output.container.find(Family::Part, "h0001_0000").unwrap();
        assert_eq!(floor.get(&desc, "linked_region").unwrap(), &name("R1"), "{variant}");
    }
}

#[test]
fn legacy_regions_have_no_attachment() {
    let desc = descriptor(GameVariant::DarkSouls1, RegionSubtype::Box);
    assert!(desc.field_index("attached_part").is_none());
    let desc = descriptor(GameVariant::Bloodborne, PartSubtype::Collision);
    assert!(desc.field_index("linked_region").is_none());
    assert!(desc.field_index("navmesh_groups").is_some());
}
