//! Integration tests for field values

use mapstudio_foundation::{FieldType, FlatValue, Handle, ModelId, NodeId, NodeValue};

#[test]
fn defaults_have_declared_types() {
    for ty in [
        FieldType::Bool,
        FieldType::I16,
        FieldType::U32,
        FieldType::F32,
        FieldType::Vec3,
        FieldType::String,
        FieldType::Bits128,
        FieldType::Bits256,
        FieldType::Euler,
    ] {
        assert_eq!(FlatValue::default_for(ty).value_type(), ty);
    }
}

#[test]
fn zero_checks_scalars_strings_and_refs() {
    for ty in [FieldType::Bool, FieldType::I16, FieldType::U32, FieldType::F32, FieldType::String] {
        assert!(FlatValue::default_for(ty).is_zero());
    }
    assert!(FlatValue::Ref(None).is_zero());
    assert!(!FlatValue::I32(-1).is_zero());
    assert!(!FlatValue::Ref(Some("R1".into())).is_zero());
}

#[test]
fn map_refs_translates_names_to_handles() {
    let flat = FlatValue::RefArray(vec![Some("a".into()), None, Some("b".into())]);
    let node: NodeValue = flat
        .map_refs(|name| {
            Ok::<_, ()>(Handle::Node(NodeId::new(u32::from(name == "b"), 1)))
        })
        .unwrap();
    assert_eq!(
        node,
        NodeValue::RefArray(vec![
            Some(Handle::Node(NodeId::new(0, 1))),
            None,
            Some(Handle::Node(NodeId::new(1, 1))),
        ])
    );
}

#[test]
fn map_refs_stops_at_first_error() {
    let flat = FlatValue::Ref(Some("x".into()));
    let result: Result<NodeValue, &str> = flat.map_refs(|_| Err("nope"));
    assert_eq!(result, Err("nope"));
}

#[test]
fn plain_values_cast_between_representations() {
    let flat = FlatValue::Vec3([1.0, 2.0, 3.0]);
    let node: Option<NodeValue> = flat.cast_plain();
    assert_eq!(node, Some(NodeValue::Vec3([1.0, 2.0, 3.0])));

    let reference = NodeValue::Ref(Some(Handle::Model(ModelId(0))));
    assert_eq!(reference.cast_plain::<String>(), None);
}

#[test]
fn ref_names_lists_slots() {
    let flat = FlatValue::RefArray(vec![None, Some("R1".into())]);
    assert_eq!(flat.ref_names(), vec![None, Some("R1")]);
    assert!(FlatValue::I32(4).ref_names().is_empty());
}
