//! Mapstudio - Map-layout entity graph engine
//!
//! This crate re-exports all layers of the mapstudio system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 5: mapstudio_pipeline    - Import/export pipeline, payload loading, file I/O
//! Layer 4: mapstudio_resolve     - Reference resolver, mutual-cycle reconciliation
//! Layer 3: mapstudio_codec       - Flat records, binary container, JSON dump
//! Layer 2: mapstudio_storage     - Model table, entity store, graph nodes
//! Layer 1: mapstudio_schema      - Field adapters, descriptors, subtype registry
//! Layer 0: mapstudio_foundation  - Core types (Value, NodeId, BitSet, Error)
//! ```

pub use mapstudio_codec as codec;
pub use mapstudio_foundation as foundation;
pub use mapstudio_pipeline as pipeline;
pub use mapstudio_resolve as resolve;
pub use mapstudio_schema as schema;
pub use mapstudio_storage as storage;
