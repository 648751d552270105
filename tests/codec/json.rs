//! Integration tests for the JSON dump
//!
//! Tests that the dump shows adapted editor values and that it parses back
//! into the same container.

use mapstudio_codec::{FlatContainer, from_json, to_json, to_json_value};
use mapstudio_foundation::{ErrorKind, FlatValue, GameVariant};
use mapstudio_schema::{EventSubtype, ModelSubtype, PartSubtype, RegionSubtype, SubtypeRegistry};
use serde_json::json;

use crate::support::{minimal_map, name, record};

fn registry() -> &'static SubtypeRegistry {
    SubtypeRegistry::standard()
}

fn piece(variant: GameVariant) -> FlatContainer {
    let mut container = minimal_map(variant);
    container.parts[0] = record(
        variant,
        PartSubtype::MapPiece,
        "PieceA",
        &[
            ("model", name("m_test")),
            ("translate", FlatValue::Vec3([1.0, 2.0, 3.0])),
            ("rotate", FlatValue::Vec3([90.0, 0.0, 0.0])),
            ("draw_groups", FlatValue::Blocks(vec![5, 0, 0, 0])),
        ],
    );
    container
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn dump_shows_editor_values() {
    let dump = to_json_value(&piece(GameVariant::DarkSouls1), registry()).unwrap();
    assert_eq!(dump["variant"], "ds1");
    assert_eq!(dump["map_id"], "m10_00_00_00");

    let part = &dump["parts"][0];
    assert_eq!(part["name"], "PieceA");
    assert_eq!(part["subtype"], "MapPiece");

    let fields = &part["fields"];
    assert_eq!(fields["model"], "m_test");
    assert_eq!(fields["translate"], json!([1.0, 3.0, 2.0]));
    assert_eq!(fields["draw_groups"], json!([0, 2]));
    let roll = fields["rotate"][0].as_f64().unwrap();
    assert!((roll - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
}

#[test]
fn null_references_render_as_null() {
    let variant = GameVariant::Sekiro;
    let mut container = FlatContainer::new(variant, "m11_00_00_00");
    container.push(record(variant, EventSubtype::Treasure, "chest", &[]));
    let dump = to_json_value(&container, registry()).unwrap();
    assert!(dump["events"][0]["fields"]["attached_region"].is_null());
}

#[test]
fn non_finite_floats_are_rejected() {
    let variant = GameVariant::Bloodborne;
    let mut container = FlatContainer::new(variant, "m21_00_00_00");
    container.push(record(
        variant,
        RegionSubtype::Sphere,
        "bad",
        &[("radius", FlatValue::F32(f32::NAN))],
    ));
    let err = to_json(&container, registry()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Serialization(_)));
    assert_eq!(err.context.unwrap().record.as_deref(), Some("bad"));
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn dump_parses_back() {
    for variant in [GameVariant::DarkSouls1, GameVariant::EldenRing] {
        let mut container = piece(variant);
        if variant == GameVariant::EldenRing {
            container.parts[0] = record(
                variant,
                PartSubtype::MapPiece,
                "PieceA",
                &[
                    ("model", name("m_test")),
                    ("translate", FlatValue::Vec3([1.0, 2.0, 3.0])),
                    ("draw_groups", FlatValue::Blocks(vec![5, 0, 0, 0, 0, 0, 0, 1])),
                ],
            );
        }
        let text = to_json(&container, registry()).unwrap();
        assert_eq!(from_json(&text, registry()).unwrap(), container, "{variant}");
    }
}

#[test]
fn missing_fields_take_their_defaults() {
    let text = r#"{
        "variant": "ds3",
        "map_id": "m10_00_00_00",
        "models": [{ "name": "m_test", "subtype": "MapPiece" }],
        "parts": [{ "name": "PieceA", "subtype": "MapPiece", "fields": { "model": "m_test" } }]
    }"#;
    let container = from_json(text, registry()).unwrap();
    assert_eq!(container, minimal_map(GameVariant::DarkSouls3));
    assert!(container.regions.is_empty());
}

#[test]
fn unknown_fields_are_errors() {
    let text = r#"{
        "variant": "er",
        "map_id": "m60",
        "models": [{ "name": "m_test", "subtype": "MapPiece", "fields": { "colour": 3 } }]
    }"#;
    let err = from_json(text, registry()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::FieldNotFound { .. }));
    assert_eq!(err.context.unwrap().record.as_deref(), Some("m_test"));
}

#[test]
fn malformed_dumps_are_rejected() {
    let cases = [
        "not json",
        "[]",
        r#"{ "variant": "ds9", "map_id": "m" }"#,
        r#"{ "variant": "ds1" }"#,
        r#"{ "variant": "ds1", "map_id": "m", "parts": {} }"#,
        r#"{ "variant": "ds1", "map_id": "m", "models": [{ "name": "x", "subtype": "Asset" }] }"#,
        r#"{ "variant": "ds1", "map_id": "m", "regions": [{ "name": "r", "subtype": "Sphere", "fields": { "radius": "big" } }] }"#,
        r#"{ "variant": "ds1", "map_id": "m", "parts": [{ "name": "p", "subtype": "MapPiece", "fields": { "draw_groups": [128] } }] }"#,
    ];
    for text in cases {
        assert!(from_json(text, registry()).is_err(), "{text}");
    }
}

#[test]
fn model_dump_keeps_derived_fields() {
    let variant = GameVariant::DarkSouls1;
    let mut container = FlatContainer::new(variant, "m10_00_00_00");
    container.push(record(
        variant,
        ModelSubtype::Character,
        "c1000",
        &[
            ("sib_path", FlatValue::String("N:\\FRPG\\data\\Model\\chr\\c1000\\sib\\c1000.sib".into())),
            ("instance_count", FlatValue::I32(2)),
        ],
    ));
    let dump = to_json_value(&container, registry()).unwrap();
    assert_eq!(dump["models"][0]["fields"]["instance_count"], 2);
    assert_eq!(from_json(&dump.to_string(), registry()).unwrap(), container);
}
