//! Import/export pipeline for mapstudio.
//!
//! Orchestrates the lower layers into the two calls a host needs: container
//! bytes to a linked [`mapstudio_storage::EntityStore`], and back.
//!
//! This crate provides:
//! - [`Pipeline`] - Import and export with payload loading and write-back
//! - [`PipelineConfig`] - Serializable settings with builder methods
//! - [`PayloadSource`] / [`PayloadSink`] - Interfaces to the payload codecs
//! - [`ImportReport`] / [`ExportReport`] - JSON summaries of a call
//! - File helpers for the binary container and its JSON dump

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collab;
pub mod config;
pub mod loader;
pub mod pipeline;
pub mod report;
pub mod serialize;

pub use collab::{NoPayloads, PathConvention, PayloadSink, PayloadSource, StandardPathConvention};
pub use config::PipelineConfig;
pub use loader::{LoadSummary, load_payloads};
pub use pipeline::{Exported, ExportedContainer, Imported, Pipeline};
pub use report::{ExportReport, FamilyCounts, ImportReport};
pub use serialize::{dump_json_to_file, load_from_file, load_json_from_file, save_to_file};
