//! Serializable summaries of pipeline calls.

use serde::{Deserialize, Serialize};

use mapstudio_codec::FlatContainer;
use mapstudio_foundation::{DiagnosticKind, Diagnostics, Error, ErrorKind, Family, GameVariant, Result};
use mapstudio_storage::EntityStore;

use crate::pipeline::{Exported, ExportedContainer, Imported};

/// Entity counts per family.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyCounts {
    /// Models.
    pub models: usize,
    /// Parts.
    pub parts: usize,
    /// Regions.
    pub regions: usize,
    /// Events.
    pub events: usize,
}

impl FamilyCounts {
    /// Counts the nodes and models of a store, placeholders included.
    #[must_use]
    pub fn of_store(store: &EntityStore) -> Self {
        Self {
            models: store.models().len(),
            parts: store.family_len(Family::Part),
            regions: store.family_len(Family::Region),
            events: store.family_len(Family::Event),
        }
    }

    /// Counts the records of a container.
    #[must_use]
    pub fn of_container(container: &FlatContainer) -> Self {
        Self {
            models: container.models.len(),
            parts: container.parts.len(),
            regions: container.regions.len(),
            events: container.events.len(),
        }
    }

    /// Sum over every family.
    #[must_use]
    pub fn total(&self) -> usize {
        self.models + self.parts + self.regions + self.events
    }
}

/// Summary of an import.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Game variant of the container.
    pub variant: GameVariant,
    /// Map identifier of the published store.
    pub map_id: String,
    /// What the store holds.
    pub counts: FamilyCounts,
    /// Synthesized placeholder nodes.
    pub placeholders: usize,
    /// Models that received a payload.
    pub payloads_loaded: usize,
    /// Models whose payload was missing.
    pub payloads_missing: usize,
    /// Every recoverable condition, in the order it was met.
    pub diagnostics: Diagnostics,
}

impl ImportReport {
    /// Summarizes an import.
    #[must_use]
    pub fn new(imported: &Imported) -> Self {
        let store = &imported.store;
        Self {
            variant: store.variant(),
            map_id: store.map_id().to_string(),
            counts: FamilyCounts::of_store(store),
            placeholders: store.placeholders().count(),
            payloads_loaded: imported.payloads.loaded,
            payloads_missing: imported.payloads.missing,
            diagnostics: imported.diagnostics.clone(),
        }
    }

    /// Number of diagnostics of one kind.
    #[must_use]
    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.count_of(kind)
    }

    /// Renders the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        to_pretty_json(self)
    }
}

/// Summary of an export.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportReport {
    /// Records written per family.
    pub counts: FamilyCounts,
    /// Size of the encoded container, if it was encoded.
    pub bytes: Option<usize>,
    /// Model payload paths written back.
    pub written_models: Vec<String>,
    /// Every recoverable condition, in the order it was met.
    pub diagnostics: Diagnostics,
}

impl ExportReport {
    /// Summarizes an export to bytes.
    #[must_use]
    pub fn new(exported: &Exported) -> Self {
        Self {
            counts: exported.records,
            bytes: Some(exported.bytes.len()),
            written_models: exported.written_models.clone(),
            diagnostics: exported.diagnostics.clone(),
        }
    }

    /// Summarizes an export to records.
    #[must_use]
    pub fn from_container(exported: &ExportedContainer) -> Self {
        Self {
            counts: FamilyCounts::of_container(&exported.container),
            bytes: None,
            written_models: exported.written_models.clone(),
            diagnostics: exported.diagnostics.clone(),
        }
    }

    /// Renders the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        to_pretty_json(self)
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))
}
