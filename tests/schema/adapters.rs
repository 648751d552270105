//! Integration tests for field adapters
//!
//! Tests axis swapping, degree/radian conversion, bit-set unpacking and the
//! refusal to translate references outside the resolver.

use mapstudio_foundation::{
    BitSet128, BitSet256, BitWidth, ErrorKind, Family, FieldType, FlatValue, NodeValue,
};
use mapstudio_schema::{Conversion, FieldAdapter, RefTarget, RegionSubtype};
use proptest::prelude::*;

// =============================================================================
// Direct Conversions
// =============================================================================

#[test]
fn position_swaps_y_and_z() {
    let adapter = FieldAdapter::position("translate");
    let node = adapter.read(&FlatValue::Vec3([1.0, 2.0, 3.0])).unwrap();
    assert_eq!(node, NodeValue::Vec3([1.0, 3.0, 2.0]));
    assert_eq!(adapter.write(&node).unwrap(), FlatValue::Vec3([1.0, 2.0, 3.0]));
}

#[test]
fn rotation_becomes_radians_in_editor_axes() {
    let adapter = FieldAdapter::rotation("rotate");
    assert_eq!(adapter.node_type(), FieldType::Euler);
    let NodeValue::Euler([x, y, z]) = adapter.read(&FlatValue::Vec3([90.0, 180.0, 0.0])).unwrap()
    else {
        panic!("rotation should read as euler radians");
    };
    assert!((x - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    assert!(y.abs() < 1e-12);
    assert!((z - std::f64::consts::PI).abs() < 1e-12);
}

#[test]
fn scalar_degrees() {
    let adapter = FieldAdapter::direct("rotate_y", FieldType::F32, Conversion::Degrees);
    let node = adapter.read(&FlatValue::F32(45.0)).unwrap();
    assert_eq!(node, NodeValue::F64(45f64.to_radians()));
    assert_eq!(adapter.write(&node).unwrap(), FlatValue::F32(45.0));
}

#[test]
fn wrong_flat_type_is_a_type_mismatch() {
    let adapter = FieldAdapter::plain("entity_id", FieldType::I32);
    let err = adapter.read(&FlatValue::F32(1.0)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
}

// =============================================================================
// Bit-Sets
// =============================================================================

#[test]
fn bit_sets_unpack_to_declared_width() {
    let narrow = FieldAdapter::bits("draw_groups", BitWidth::W128);
    let wide = FieldAdapter::bits("draw_groups", BitWidth::W256);

    let node = narrow.read(&FlatValue::Blocks(vec![0b101, 0, 0, 1])).unwrap();
    assert_eq!(
        node,
        NodeValue::Bits128(BitSet128::from_enabled([0, 2, 96]).unwrap())
    );
    assert_eq!(
        narrow.write(&node).unwrap(),
        FlatValue::Blocks(vec![0b101, 0, 0, 1])
    );

    let err = wide.read(&FlatValue::Blocks(vec![0; 4])).unwrap_err();
    assert!(err.is_configuration());
    let err = narrow
        .write(&NodeValue::Bits256(BitSet256::new()))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::BitSetWidthMismatch { .. }));
}

// =============================================================================
// References
// =============================================================================

#[test]
fn references_are_not_translated_by_adapters() {
    let adapter = FieldAdapter::reference("attached_region", RefTarget::any(Family::Region));
    assert!(adapter.is_reference());
    assert_eq!(
        adapter.reference_target(),
        Some((RefTarget::any(Family::Region), 0))
    );
    assert!(adapter.read(&FlatValue::Ref(None)).is_err());
    assert_eq!(adapter.default_flat(), FlatValue::Ref(None));
}

#[test]
fn ref_target_filters_by_subtype() {
    let only_boxes = RefTarget::only(RegionSubtype::Box);
    assert!(only_boxes.accepts(RegionSubtype::Box.into()));
    assert!(!only_boxes.accepts(RegionSubtype::Point.into()));
    assert_eq!(only_boxes.placeholder_subtype(), RegionSubtype::Box.into());

    let any_region = RefTarget::any(Family::Region);
    assert!(any_region.accepts(RegionSubtype::Cylinder.into()));
    assert_eq!(any_region.placeholder_subtype(), RegionSubtype::Point.into());
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn position_round_trips_exactly(x in any::<f32>(), y in any::<f32>(), z in any::<f32>()) {
        prop_assume!(x.is_finite() && y.is_finite() && z.is_finite());
        let adapter = FieldAdapter::position("translate");
        let flat = FlatValue::Vec3([x, y, z]);
        let back = adapter.write(&adapter.read(&flat).unwrap()).unwrap();
        prop_assert_eq!(back, flat);
    }

    #[test]
    fn rotation_round_trips_exactly(x in -360f32..360.0, y in -360f32..360.0, z in -360f32..360.0) {
        let adapter = FieldAdapter::rotation("rotate");
        let flat = FlatValue::Vec3([x, y, z]);
        let back = adapter.write(&adapter.read(&flat).unwrap()).unwrap();
        prop_assert_eq!(back, flat);
    }
}
