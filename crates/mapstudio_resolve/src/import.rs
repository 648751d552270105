//! Import: flat records to a linked entity store.
//!
//! The two phases are separate types. [`Import<NodesCreated>`] owns a store
//! whose nodes carry every non-reference field and no references;
//! [`Import::resolve`] consumes it and returns [`Import<Resolved>`], where
//! every reference field holds a live handle or `None`.

use std::marker::PhantomData;

use mapstudio_codec::FlatContainer;
use mapstudio_foundation::{
    DiagnosticKind, Diagnostics, Error, ErrorContext, ErrorKind, Family, FlatValue, Handle,
    ModelId, NodeId, Result,
};
use mapstudio_schema::{ModelSubtype, RefTarget, Subtype, SubtypeRegistry};
use mapstudio_storage::{EntityStore, GraphNode, ModelTable};

use crate::cache::PlaceholderCache;
use crate::cycle::reconcile_cycle;

// =============================================================================
// Phases
// =============================================================================

/// Nodes exist with plain fields populated; references are unset.
#[derive(Debug)]
pub struct NodesCreated;

/// Every reference is a live handle or `None`.
#[derive(Debug)]
pub struct Resolved;

/// A reference field waiting for the resolve pass.
#[derive(Debug)]
struct PendingRef {
    node: NodeId,
    field: usize,
    names: FlatValue,
}

/// An import in progress.
#[derive(Debug)]
pub struct Import<S> {
    store: EntityStore,
    diagnostics: Diagnostics,
    pending: Vec<PendingRef>,
    _phase: PhantomData<S>,
}

impl<S> Import<S> {
    /// The store built so far.
    #[must_use]
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Diagnostics recorded so far.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

// =============================================================================
// NodesCreated
// =============================================================================

impl Import<NodesCreated> {
    /// Builds the model table and one node per part, region and event record.
    ///
    /// Families are instantiated in [`Family::PRIORITY_ORDER`]. A record
    /// whose name repeats an earlier record of the same family replaces it
    /// and records a duplicate-name diagnostic.
    ///
    /// # Errors
    ///
    /// Returns an error if a record's subtype is not registered for the
    /// container's variant or a plain value does not fit its adapter.
    pub fn create_nodes(container: &FlatContainer, registry: &SubtypeRegistry) -> Result<Self> {
        let variant = container.variant;
        let mut store = EntityStore::new(variant, container.map_id.clone());
        let mut diagnostics = Diagnostics::new();

        for record in &container.models {
            let subtype = record.subtype.as_model().ok_or_else(|| {
                Error::new(ErrorKind::Internal(format!(
                    "{} record {:?} in the model list",
                    record.subtype, record.name
                )))
            })?;
            let descriptor = registry.descriptor(variant, record.subtype)?;
            let sib_path = descriptor
                .field_index("sib_path")
                .and_then(|i| record.values.get(i))
                .and_then(FlatValue::as_str)
                .unwrap_or_default();
            store
                .models_mut()
                .insert_declared(&record.name, subtype, sib_path, &mut diagnostics);
        }

        let mut pending = Vec::new();
        for family in Family::PRIORITY_ORDER {
            for record in container.records(family) {
                let context = || ErrorContext::new().with_record(family, record.name.clone());
                let descriptor = registry
                    .descriptor(variant, record.subtype)
                    .map_err(|e| e.with_context(context()))?;
                if record.values.len() != descriptor.fields().len() {
                    return Err(Error::new(ErrorKind::Internal(format!(
                        "record has {} values, {} has {} fields",
                        record.values.len(),
                        record.subtype,
                        descriptor.fields().len()
                    )))
                    .with_context(context()));
                }

                let mut node = GraphNode::new(record.name.clone(), descriptor.clone());
                let mut refs = Vec::new();
                for (index, (field, value)) in
                    descriptor.fields().iter().zip(&record.values).enumerate()
                {
                    if field.is_reference() {
                        refs.push((index, value.clone()));
                        continue;
                    }
                    field
                        .read(value)
                        .and_then(|v| node.set_at(index, v))
                        .map_err(|e| e.with_context(context().with_field(field.name)))?;
                }

                if let Some(previous) = store.by_name(family, &record.name) {
                    diagnostics.push(
                        DiagnosticKind::DuplicateName,
                        family,
                        record.name.clone(),
                        "declared twice; the last declaration wins",
                    );
                    store.remove(previous)?;
                }
                let id = store.insert(node)?;
                pending.extend(refs.into_iter().map(|(field, names)| PendingRef {
                    node: id,
                    field,
                    names,
                }));
            }
            tracing::debug!(%family, count = store.family_len(family), "created nodes");
        }
        pending.retain(|p| store.contains(p.node));

        Ok(Self {
            store,
            diagnostics,
            pending,
            _phase: PhantomData,
        })
    }

    /// Lends the model table and the diagnostics list to a step that runs
    /// between the phases, such as payload loading.
    pub fn models_mut(&mut self) -> (&mut ModelTable, &mut Diagnostics) {
        (self.store.models_mut(), &mut self.diagnostics)
    }

    /// Binds every pending reference, reconciles the mutual reference pair
    /// and derives presentation parents.
    ///
    /// A name with no matching node gets a placeholder of the expected
    /// subtype, shared through `cache` and announced once. A name matching a
    /// node of the wrong subtype also gets a placeholder, plus a
    /// subtype-mismatch diagnostic. Model names are bound by name alone.
    ///
    /// # Errors
    ///
    /// Returns an error only if a placeholder subtype is not registered,
    /// which is a schema bug.
    pub fn resolve(
        self,
        registry: &SubtypeRegistry,
        cache: &mut PlaceholderCache,
    ) -> Result<Import<Resolved>> {
        let Self {
            mut store,
            mut diagnostics,
            pending,
            ..
        } = self;

        let mut linker = Linker {
            store: &mut store,
            registry,
            cache: &mut *cache,
            diagnostics: &mut diagnostics,
        };
        let total = pending.len();
        for PendingRef { node, field, names } in pending {
            linker.bind(node, field, names)?;
        }
        tracing::debug!(references = total, placeholders = cache.len(), "resolved references");

        if let Some(cycle) = registry.cycle(store.variant()) {
            reconcile_cycle(&mut store, cycle, &mut diagnostics)?;
        }
        derive_parents(&mut store)?;

        Ok(Import {
            store,
            diagnostics,
            pending: Vec::new(),
            _phase: PhantomData,
        })
    }
}

// =============================================================================
// Resolved
// =============================================================================

impl Import<Resolved> {
    /// Publishes the store and the diagnostics recorded along the way.
    #[must_use]
    pub fn into_parts(self) -> (EntityStore, Diagnostics) {
        (self.store, self.diagnostics)
    }
}

/// Runs both import phases.
///
/// # Errors
///
/// See [`Import::create_nodes`] and [`Import::resolve`].
pub fn import_container(
    container: &FlatContainer,
    registry: &SubtypeRegistry,
    cache: &mut PlaceholderCache,
) -> Result<(EntityStore, Diagnostics)> {
    Ok(Import::create_nodes(container, registry)?
        .resolve(registry, cache)?
        .into_parts())
}

/// Checks that every reference in `store` is `None` or a live handle whose
/// target satisfies the field's family and subtype filter.
///
/// Model references are checked for existence only.
///
/// # Errors
///
/// Returns every violation, aggregated.
pub fn verify_references(store: &EntityStore) -> Result<()> {
    let mut errors = Vec::new();
    for node in store.nodes() {
        for (_, field, target, _) in node.descriptor().references() {
            let Ok(slots) = node.references(field.name) else {
                continue;
            };
            for handle in slots.iter().flatten() {
                let ok = match *handle {
                    Handle::Node(id) => store
                        .get(id)
                        .is_ok_and(|t| target.accepts(t.subtype())),
                    Handle::Model(id) => {
                        target.family == Family::Model && store.models().get(id).is_some()
                    }
                };
                if !ok {
                    errors.push(
                        Error::new(ErrorKind::Internal(format!(
                            "dangling or mistyped reference {handle:?}"
                        )))
                        .with_context(
                            ErrorContext::new()
                                .with_record(node.family(), node.name.clone())
                                .with_field(field.name),
                        ),
                    );
                }
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::aggregate(errors))
    }
}

// =============================================================================
// Linking
// =============================================================================

struct Linker<'a> {
    store: &'a mut EntityStore,
    registry: &'a SubtypeRegistry,
    cache: &'a mut PlaceholderCache,
    diagnostics: &'a mut Diagnostics,
}

impl Linker<'_> {
    fn bind(&mut self, id: NodeId, field: usize, names: FlatValue) -> Result<()> {
        let (descriptor, source_name) = {
            let node = self.store.get(id)?;
            (node.descriptor().clone(), node.name.clone())
        };
        let adapter = &descriptor.fields()[field];
        let (target, _) = adapter.reference_target().ok_or_else(|| {
            Error::new(ErrorKind::Internal(format!(
                "{} field {} is not a reference",
                descriptor.subtype, adapter.name
            )))
        })?;
        let source = Source {
            family: descriptor.family(),
            name: &source_name,
            field: adapter.name,
        };
        let value = names.map_refs(|name| self.link(target, &name, &source))?;
        self.store.get_mut(id)?.set_at(field, value)
    }

    fn link(&mut self, target: RefTarget, name: &str, source: &Source<'_>) -> Result<Handle> {
        if target.family == Family::Model {
            return Ok(Handle::Model(self.link_model(target, name, source)));
        }

        if let Some(id) = self.store.by_name(target.family, name) {
            let node = self.store.get(id)?;
            if target.accepts(node.subtype()) {
                return Ok(Handle::Node(id));
            }
            if !node.is_placeholder {
                let actual = node.subtype();
                self.diagnostics.push(
                    DiagnosticKind::SubtypeMismatch,
                    source.family,
                    source.name,
                    format!(
                        "field {} names {actual} {name:?}, expected {}; using a placeholder",
                        source.field,
                        target.placeholder_subtype()
                    ),
                );
            }
        }

        let subtype = target.placeholder_subtype();
        if let Some(id) = self.cache.get(&*self.store, subtype, name) {
            return Ok(Handle::Node(id));
        }
        let id = self.placeholder(subtype, name)?;
        self.diagnostics.push(
            DiagnosticKind::PlaceholderNode,
            target.family,
            name,
            format!(
                "referenced by {} {:?} field {} but not declared; created a placeholder {subtype}",
                source.family, source.name, source.field
            ),
        );
        Ok(Handle::Node(id))
    }

    fn placeholder(&mut self, subtype: Subtype, name: &str) -> Result<NodeId> {
        let descriptor = self.registry.descriptor(self.store.variant(), subtype)?;
        let id = self
            .store
            .insert_placeholder(GraphNode::placeholder(name, descriptor))?;
        self.cache.insert(subtype, name, id);
        Ok(id)
    }

    fn link_model(&mut self, target: RefTarget, name: &str, source: &Source<'_>) -> ModelId {
        let expected = target
            .placeholder_subtype()
            .as_model()
            .unwrap_or(ModelSubtype::MapPiece);
        let models = self.store.models_mut();
        let Some(id) = models.find(name) else {
            return models.get_or_create_placeholder(name, expected, self.diagnostics);
        };
        if let Some(model) = models.get(id) {
            if !target.accepts(model.subtype.into()) {
                self.diagnostics.push(
                    DiagnosticKind::SubtypeMismatch,
                    source.family,
                    source.name,
                    format!(
                        "field {} names {} model {name:?}, expected {expected}; bound anyway",
                        source.field, model.subtype
                    ),
                );
            }
        }
        id
    }
}

struct Source<'a> {
    family: Family,
    name: &'a str,
    field: &'static str,
}

fn derive_parents(store: &mut EntityStore) -> Result<()> {
    let parents: Vec<(NodeId, Option<NodeId>)> = store
        .nodes()
        .map(|node| {
            let parent = node
                .descriptor()
                .parent_field()
                .and_then(|field| node.references(field).ok())
                .and_then(|slots| slots.first().copied().flatten())
                .and_then(Handle::as_node);
            (node.id, parent)
        })
        .collect();
    for (id, parent) in parents {
        store.get_mut(id)?.parent = parent;
    }
    Ok(())
}
