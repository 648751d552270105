//! Field adapters, entity descriptors and the subtype registry for mapstudio.
//!
//! This crate provides:
//! - [`FieldAdapter`] - Per-field conversion between flat records and graph nodes
//! - [`EntityDescriptor`] - Ordered field list and parent rule for one subtype
//! - [`SubtypeRegistry`] - Lookup from `(game variant, subtype)` to descriptor
//! - [`Subtype`] - Closed subtype enums per record family

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod adapter;
pub mod descriptor;
pub mod registry;
pub mod subtype;
mod tables;

pub use adapter::{AdapterKind, Conversion, FieldAdapter, RefTarget};
pub use descriptor::{CycleSpec, Derivation, EntityDescriptor};
pub use registry::SubtypeRegistry;
pub use subtype::{EventSubtype, ModelSubtype, PartSubtype, RegionSubtype, Subtype};
