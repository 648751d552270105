//! Helpers shared by the integration test targets.

#![allow(dead_code)]

use std::sync::Arc;

use mapstudio_codec::{FlatContainer, Record};
use mapstudio_foundation::{FlatValue, GameVariant};
use mapstudio_schema::{EntityDescriptor, ModelSubtype, PartSubtype, Subtype, SubtypeRegistry};
use tracing_subscriber::EnvFilter;

/// Installs a test subscriber once per process; `RUST_LOG` controls output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn descriptor(variant: GameVariant, subtype: impl Into<Subtype>) -> Arc<EntityDescriptor> {
    SubtypeRegistry::standard()
        .descriptor(variant, subtype.into())
        .unwrap()
}

/// Builds a record with default values plus the given overrides.
pub fn record(
    variant: GameVariant,
    subtype: impl Into<Subtype>,
    name: &str,
    fields: &[(&str, FlatValue)],
) -> Record {
    let desc = descriptor(variant, subtype);
    let mut record = Record::new(name, &desc);
    for (field, value) in fields {
        record.set(&desc, field, value.clone()).unwrap();
    }
    record
}

pub fn name(target: &str) -> FlatValue {
    FlatValue::Ref(Some(target.to_string()))
}

/// One model and one map piece referencing it.
pub fn minimal_map(variant: GameVariant) -> FlatContainer {
    let mut container = FlatContainer::new(variant, "m10_00_00_00");
    container.push(record(variant, ModelSubtype::MapPiece, "m_test", &[]));
    container.push(record(
        variant,
        PartSubtype::MapPiece,
        "PieceA",
        &[("model", name("m_test"))],
    ));
    container
}
