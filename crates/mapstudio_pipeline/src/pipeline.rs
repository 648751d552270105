//! The import/export pipeline.
//!
//! Import: decode → model table → nodes in priority order → payload loading
//! → reference resolution → published [`EntityStore`].
//!
//! Export: published store → records without references → reference pass →
//! encoded container → dirty model write-back.
//!
//! Fatal conditions abort the call and return only the error. Recoverable
//! conditions are collected in the [`Diagnostics`] returned with the result.

use std::fmt;
use std::sync::Arc;

use mapstudio_codec::{FlatContainer, decode, encode};
use mapstudio_foundation::{Diagnostics, Error, ErrorContext, Family, ModelId, Result};
use mapstudio_resolve::{ExportOptions, ExportOutput, Import, PlaceholderCache, export_store};
use mapstudio_schema::SubtypeRegistry;
use mapstudio_storage::EntityStore;
use tracing::{debug, error, info, info_span, warn};

use crate::collab::{NoPayloads, PathConvention, PayloadSink, PayloadSource, StandardPathConvention};
use crate::config::PipelineConfig;
use crate::loader::{LoadSummary, load_payloads};
use crate::report::FamilyCounts;

// =============================================================================
// Results
// =============================================================================

/// A published import.
#[derive(Clone, Debug)]
pub struct Imported {
    /// The linked store.
    pub store: EntityStore,
    /// Recoverable conditions met along the way.
    pub diagnostics: Diagnostics,
    /// Payload loading counts (zero when loading is disabled).
    pub payloads: LoadSummary,
}

/// An export as flat records.
#[derive(Clone, Debug)]
pub struct ExportedContainer {
    /// Canonically ordered records.
    pub container: FlatContainer,
    /// Recoverable conditions met along the way.
    pub diagnostics: Diagnostics,
    /// Paths of model payloads written back through the sink.
    pub written_models: Vec<String>,
}

/// An export as container bytes.
#[derive(Clone, Debug)]
pub struct Exported {
    /// The encoded container.
    pub bytes: Vec<u8>,
    /// Records written per family.
    pub records: FamilyCounts,
    /// Recoverable conditions met along the way.
    pub diagnostics: Diagnostics,
    /// Paths of model payloads written back through the sink.
    pub written_models: Vec<String>,
}

// =============================================================================
// Pipeline
// =============================================================================

/// Registry, configuration and collaborators for import and export calls.
///
/// A pipeline holds no per-call state. Each call takes the caller's
/// [`PlaceholderCache`] where one is needed and returns everything it built.
#[derive(Clone)]
pub struct Pipeline<'r> {
    registry: &'r SubtypeRegistry,
    config: PipelineConfig,
    source: Arc<dyn PayloadSource>,
    sink: Arc<dyn PayloadSink>,
    paths: Arc<dyn PathConvention>,
}

impl Pipeline<'static> {
    /// Creates a pipeline over the standard registry with no payload storage
    /// and the standard path convention.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_registry(SubtypeRegistry::standard(), config)
    }
}

impl Default for Pipeline<'static> {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl<'r> Pipeline<'r> {
    /// Creates a pipeline over a specific registry.
    #[must_use]
    pub fn with_registry(registry: &'r SubtypeRegistry, config: PipelineConfig) -> Self {
        Self {
            registry,
            config,
            source: Arc::new(NoPayloads),
            sink: Arc::new(NoPayloads),
            paths: Arc::new(StandardPathConvention),
        }
    }

    /// Builder method to set where payloads are loaded from.
    #[must_use]
    pub fn with_payload_source(mut self, source: impl PayloadSource + 'static) -> Self {
        self.source = Arc::new(source);
        self
    }

    /// Builder method to set where dirty payloads are written.
    #[must_use]
    pub fn with_payload_sink(mut self, sink: impl PayloadSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Builder method to set the model path convention.
    #[must_use]
    pub fn with_path_convention(mut self, paths: impl PathConvention + 'static) -> Self {
        self.paths = Arc::new(paths);
        self
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The subtype registry.
    #[must_use]
    pub fn registry(&self) -> &'r SubtypeRegistry {
        self.registry
    }

    // -------------------------------------------------------------------------
    // Import
    // -------------------------------------------------------------------------

    /// Decodes container bytes and imports them.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is corrupt or truncated, names an
    /// unregistered subtype, or a payload lookup fails.
    pub fn import(&self, bytes: &[u8], cache: &mut PlaceholderCache) -> Result<Imported> {
        let span = info_span!(
            "import",
            bytes = bytes.len(),
            variant = tracing::field::Empty,
            map_id = tracing::field::Empty
        );
        let _guard = span.enter();

        let container = decode(bytes, self.registry).inspect_err(|e| {
            error!(error = %e, "container could not be decoded");
        })?;
        span.record("variant", container.variant.as_str());
        span.record("map_id", container.map_id.as_str());
        self.import_records(&container, cache)
    }

    /// Imports an already decoded container.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::import`].
    pub fn import_container(
        &self,
        container: &FlatContainer,
        cache: &mut PlaceholderCache,
    ) -> Result<Imported> {
        let span = info_span!(
            "import",
            variant = container.variant.as_str(),
            map_id = container.map_id.as_str()
        );
        let _guard = span.enter();
        self.import_records(container, cache)
    }

    fn import_records(
        &self,
        container: &FlatContainer,
        cache: &mut PlaceholderCache,
    ) -> Result<Imported> {
        self.try_import(container, cache).inspect_err(|e| {
            error!(error = %e, "import failed");
        })
    }

    fn try_import(
        &self,
        container: &FlatContainer,
        cache: &mut PlaceholderCache,
    ) -> Result<Imported> {
        let mut import = Import::create_nodes(container, self.registry)?;

        let payloads = if self.config.load_payloads {
            let (models, diagnostics) = import.models_mut();
            load_payloads(
                models,
                self.source.as_ref(),
                self.config.payload_workers,
                diagnostics,
            )?
        } else {
            LoadSummary::default()
        };

        let (mut store, diagnostics) = import.resolve(self.registry, cache)?.into_parts();
        store.set_map_id(self.config.effective_map_id(&container.map_id));

        info!(
            models = store.models().len(),
            parts = store.family_len(Family::Part),
            regions = store.family_len(Family::Region),
            events = store.family_len(Family::Event),
            placeholders = store.placeholders().count(),
            warnings = diagnostics.len(),
            "import complete"
        );
        Ok(Imported {
            store,
            diagnostics,
            payloads,
        })
    }

    // -------------------------------------------------------------------------
    // Export
    // -------------------------------------------------------------------------

    /// Exports a store (or the subset named in `options`) to container bytes.
    ///
    /// Dirty models are written through the payload sink only once the
    /// container has been encoded. The store is not modified; callers that
    /// keep editing it should clear the dirty flags themselves after a
    /// successful export.
    ///
    /// # Errors
    ///
    /// Returns an error if a reference targets a node outside the exported
    /// set or a placeholder, two exported nodes of one family share a name,
    /// an exclusive pair is violated under strict checking, or a payload
    /// write fails.
    pub fn export(&self, store: &EntityStore, options: &ExportOptions) -> Result<Exported> {
        let span = info_span!(
            "export",
            variant = store.variant().as_str(),
            map_id = store.map_id()
        );
        let _guard = span.enter();

        let output = self.export_records(store, options)?;
        self.encode_export(store, output)
    }

    /// Exports a store to flat records without encoding them.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::export`].
    pub fn export_container(
        &self,
        store: &EntityStore,
        options: &ExportOptions,
    ) -> Result<ExportedContainer> {
        let span = info_span!(
            "export",
            variant = store.variant().as_str(),
            map_id = store.map_id()
        );
        let _guard = span.enter();
        let output = self.export_records(store, options)?;
        self.complete_export(store, output)
    }

    fn export_records(&self, store: &EntityStore, options: &ExportOptions) -> Result<ExportOutput> {
        let options = options
            .clone()
            .strict_exclusive(options.is_strict_exclusive() || self.config.strict_exclusive);
        export_store(store, self.registry, self.paths.as_ref(), &options).inspect_err(|e| {
            error!(error = %e, "export failed");
        })
    }

    fn encode_export(&self, store: &EntityStore, output: ExportOutput) -> Result<Exported> {
        let bytes = encode(&output.container, self.registry).inspect_err(|e| {
            error!(error = %e, "container could not be encoded");
        })?;
        info!(bytes = bytes.len(), "encoded container");
        let exported = self.complete_export(store, output)?;
        Ok(Exported {
            bytes,
            records: FamilyCounts::of_container(&exported.container),
            diagnostics: exported.diagnostics,
            written_models: exported.written_models,
        })
    }

    /// Writes dirty payloads back once the records are final.
    fn complete_export(&self, store: &EntityStore, output: ExportOutput) -> Result<ExportedContainer> {
        let written_models = if self.config.write_back_dirty_models {
            self.write_back(store, &output.dirty_models).inspect_err(|e| {
                error!(error = %e, "model write-back failed");
            })?
        } else {
            Vec::new()
        };

        info!(
            models = output.container.models.len(),
            parts = output.container.parts.len(),
            regions = output.container.regions.len(),
            events = output.container.events.len(),
            written = written_models.len(),
            warnings = output.diagnostics.len(),
            "export complete"
        );
        Ok(ExportedContainer {
            container: output.container,
            diagnostics: output.diagnostics,
            written_models,
        })
    }

    fn write_back(&self, store: &EntityStore, dirty: &[ModelId]) -> Result<Vec<String>> {
        let mut written = Vec::new();
        let mut errors = Vec::new();
        for &id in dirty {
            let Some(model) = store.models().get(id) else {
                continue;
            };
            if model.payload.is_none() {
                warn!(model = %model.name, "dirty model has no payload; nothing to write");
                continue;
            }
            let path =
                self.paths
                    .model_path(store.variant(), &model.name, model.subtype, store.map_id());
            match self.sink.write(model, &path) {
                Ok(()) => {
                    debug!(model = %model.name, %path, "wrote model payload");
                    written.push(path);
                }
                Err(e) => errors.push(e.with_context(
                    ErrorContext::new().with_record(Family::Model, model.name.clone()),
                )),
            }
        }
        if errors.is_empty() {
            Ok(written)
        } else {
            Err(Error::aggregate(errors))
        }
    }
}

impl fmt::Debug for Pipeline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
