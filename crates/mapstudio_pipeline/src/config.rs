//! Configuration for pipeline calls.

use serde::{Deserialize, Serialize};

/// Settings shared by every import and export a [`crate::Pipeline`] runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Map identifier given to imported stores, which export uses for model
    /// paths. Empty keeps the container's own map id.
    pub map_id: String,
    /// Worker threads for payload loading (0 = load on the calling thread).
    pub payload_workers: usize,
    /// Whether import asks the payload source for every declared model.
    pub load_payloads: bool,
    /// Whether a set pair of mutually exclusive fields fails the export
    /// instead of warning.
    pub strict_exclusive: bool,
    /// Whether export writes dirty model payloads through the payload sink.
    pub write_back_dirty_models: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            map_id: String::new(),
            payload_workers: 0,
            load_payloads: true,
            strict_exclusive: false,
            write_back_dirty_models: true,
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration that rejects exclusive-field violations.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict_exclusive: true,
            ..Self::default()
        }
    }

    /// Creates a configuration that never touches payload storage.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            load_payloads: false,
            write_back_dirty_models: false,
            ..Self::default()
        }
    }

    /// Builder method to set the map id.
    #[must_use]
    pub fn with_map_id(mut self, map_id: impl Into<String>) -> Self {
        self.map_id = map_id.into();
        self
    }

    /// Builder method to set the payload worker count.
    #[must_use]
    pub fn with_payload_workers(mut self, workers: usize) -> Self {
        self.payload_workers = workers;
        self
    }

    /// Builder method to enable/disable payload loading.
    #[must_use]
    pub fn with_load_payloads(mut self, load: bool) -> Self {
        self.load_payloads = load;
        self
    }

    /// Builder method to enable/disable strict exclusive-field checking.
    #[must_use]
    pub fn with_strict_exclusive(mut self, strict: bool) -> Self {
        self.strict_exclusive = strict;
        self
    }

    /// Builder method to enable/disable dirty model write-back.
    #[must_use]
    pub fn with_write_back_dirty_models(mut self, write_back: bool) -> Self {
        self.write_back_dirty_models = write_back;
        self
    }

    /// Returns the map id to use for a container declaring `container_map_id`.
    #[must_use]
    pub fn effective_map_id<'a>(&'a self, container_map_id: &'a str) -> &'a str {
        if self.map_id.is_empty() {
            container_map_id
        } else {
            &self.map_id
        }
    }
}
