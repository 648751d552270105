//! Model table, graph nodes and the entity store for mapstudio.
//!
//! This crate provides:
//! - [`ModelTable`] - Name-keyed shared models with placeholder synthesis
//! - [`GraphNode`] - The linked form of one flat record
//! - [`EntityStore`] - Generational node storage with per-family name indices

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod model;
pub mod node;
pub mod store;

pub use model::{Model, ModelTable, PathConvention, PayloadHandle, StandardPathConvention};
pub use node::GraphNode;
pub use store::EntityStore;
