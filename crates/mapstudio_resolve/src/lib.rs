//! Reference resolver for mapstudio.
//!
//! Translates between name-addressed flat records and handle-addressed graph
//! nodes in two explicit phases per direction.
//!
//! This crate provides:
//! - [`Import`] - `NodesCreated` → `Resolved`, with placeholder substitution
//! - [`Export`] - `GraphReady` → `RecordsWithoutRefs` → `RecordsResolved`
//! - [`PlaceholderCache`] - Caller-owned cache of synthesized placeholders
//! - [`reconcile_cycle`] - The one mutual reference pair, reconciled after
//!   both forward passes

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cache;
pub mod cycle;
pub mod export;
pub mod import;

pub use cache::PlaceholderCache;
pub use cycle::reconcile_cycle;
pub use export::{
    Export, ExportOptions, ExportOutput, GraphReady, RecordsResolved, RecordsWithoutRefs,
    export_store,
};
pub use import::{Import, NodesCreated, Resolved, import_container, verify_references};
