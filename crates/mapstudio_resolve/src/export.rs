//! Export: a linked entity store back to flat records.
//!
//! Mirror of the import phases. [`Export<GraphReady>`] fixes the export set;
//! [`Export::records_without_refs`] copies every plain field and the model
//! declarations; [`Export::resolve_refs`] translates handles back to names.
//! A reference to a node outside the export set, or to a placeholder, is
//! fatal: the flat format cannot express either.

use std::collections::{HashMap, HashSet, VecDeque};
use std::marker::PhantomData;

use mapstudio_codec::{FlatContainer, Record};
use mapstudio_foundation::{
    DiagnosticKind, Diagnostics, Error, ErrorContext, ErrorKind, Family, FlatValue, Handle,
    ModelId, NodeId, Result,
};
use mapstudio_schema::{Derivation, Subtype, SubtypeRegistry};
use mapstudio_storage::{EntityStore, GraphNode, Model, PathConvention};

// =============================================================================
// Options and output
// =============================================================================

/// Which nodes to export and how strictly to validate them.
#[derive(Clone, Debug, Default)]
pub struct ExportOptions {
    subset: Option<Vec<NodeId>>,
    with_dependencies: bool,
    strict_exclusive: bool,
}

impl ExportOptions {
    /// Export every non-placeholder node and every model.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Export only the given nodes and the models they reference.
    #[must_use]
    pub fn subset(ids: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            subset: Some(ids.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Also export every node reachable from the subset through references.
    #[must_use]
    pub fn with_dependencies(mut self) -> Self {
        self.with_dependencies = true;
        self
    }

    /// Treat both fields of an exclusive pair being set as a fatal error.
    #[must_use]
    pub fn strict_exclusive(mut self, strict: bool) -> Self {
        self.strict_exclusive = strict;
        self
    }

    /// Returns true if exclusive-pair violations are fatal.
    #[must_use]
    pub fn is_strict_exclusive(&self) -> bool {
        self.strict_exclusive
    }

    /// Returns true if only part of the store is exported.
    #[must_use]
    pub fn is_subset(&self) -> bool {
        self.subset.is_some()
    }
}

/// Result of a completed export.
#[derive(Clone, Debug)]
pub struct ExportOutput {
    /// Records in canonical order, ready to encode.
    pub container: FlatContainer,
    /// Recoverable conditions found along the way.
    pub diagnostics: Diagnostics,
    /// Exported models whose payload needs writing back.
    pub dirty_models: Vec<ModelId>,
}

// =============================================================================
// Phases
// =============================================================================

/// The export set is fixed; no records exist yet.
#[derive(Debug)]
pub struct GraphReady;

/// Records exist with plain fields; reference fields are null.
#[derive(Debug)]
pub struct RecordsWithoutRefs;

/// Every reference field names a record in the container.
#[derive(Debug)]
pub struct RecordsResolved;

/// An export in progress.
#[derive(Debug)]
pub struct Export<'a, S> {
    store: &'a EntityStore,
    members: Vec<NodeId>,
    subset: bool,
    strict_exclusive: bool,
    container: FlatContainer,
    sources: Vec<(Family, usize, NodeId)>,
    model_names: HashMap<ModelId, String>,
    diagnostics: Diagnostics,
    dirty_models: Vec<ModelId>,
    _phase: PhantomData<S>,
}

impl<'a, S> Export<'a, S> {
    /// Records built so far.
    #[must_use]
    pub fn container(&self) -> &FlatContainer {
        &self.container
    }

    /// Diagnostics recorded so far.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn advance<T>(self) -> Export<'a, T> {
        Export {
            store: self.store,
            members: self.members,
            subset: self.subset,
            strict_exclusive: self.strict_exclusive,
            container: self.container,
            sources: self.sources,
            model_names: self.model_names,
            diagnostics: self.diagnostics,
            dirty_models: self.dirty_models,
            _phase: PhantomData,
        }
    }
}

// =============================================================================
// GraphReady
// =============================================================================

impl<'a> Export<'a, GraphReady> {
    /// Fixes the export set.
    ///
    /// Placeholder nodes are never part of the set. With
    /// [`ExportOptions::with_dependencies`], every live node reachable from
    /// the subset is added.
    ///
    /// # Errors
    ///
    /// Returns an error if a subset handle is stale or unknown.
    pub fn new(store: &'a EntityStore, options: &ExportOptions) -> Result<Self> {
        let members = match &options.subset {
            None => Family::PRIORITY_ORDER
                .iter()
                .flat_map(|&family| store.iter_family(family))
                .filter(|node| !node.is_placeholder)
                .map(|node| node.id)
                .collect(),
            Some(ids) => {
                for &id in ids {
                    store.validate(id)?;
                }
                let chosen = if options.with_dependencies {
                    closure(store, ids)
                } else {
                    ids.iter().copied().collect()
                };
                Family::PRIORITY_ORDER
                    .iter()
                    .flat_map(|&family| store.iter_family(family))
                    .filter(|node| !node.is_placeholder && chosen.contains(&node.id))
                    .map(|node| node.id)
                    .collect()
            }
        };

        Ok(Self {
            store,
            members,
            subset: options.is_subset(),
            strict_exclusive: options.strict_exclusive,
            container: FlatContainer::new(store.variant(), store.map_id()),
            sources: Vec::new(),
            model_names: HashMap::new(),
            diagnostics: Diagnostics::new(),
            dirty_models: Vec::new(),
            _phase: PhantomData,
        })
    }

    /// Copies plain fields into records and regenerates model declarations.
    ///
    /// Models are emitted in name order with `instance_count` from the
    /// exported parts. A model keeps the `sib_path` it was declared with;
    /// dirty models and models without a declared path get one from `paths`. A full export emits every
    /// model; a subset export emits only referenced models.
    ///
    /// # Errors
    ///
    /// Returns every duplicate name in the export set and, in strict mode,
    /// every exclusive-pair violation, aggregated. Also fails if a subtype is
    /// not registered or a value does not fit its adapter.
    pub fn records_without_refs(
        mut self,
        registry: &SubtypeRegistry,
        paths: &dyn PathConvention,
    ) -> Result<Export<'a, RecordsWithoutRefs>> {
        let store = self.store;
        let mut errors = Vec::new();
        let mut seen: HashMap<Family, HashSet<&str>> = HashMap::new();
        let mut instances: HashMap<ModelId, usize> = HashMap::new();

        let members = std::mem::take(&mut self.members);
        for &id in &members {
            let node = store.get(id)?;
            let family = node.family();
            if !seen.entry(family).or_default().insert(node.name.as_str()) {
                errors.push(Error::duplicate_name(family, node.name.clone()));
                continue;
            }

            let record = self.plain_record(node, &mut errors)?;
            if family == Family::Part {
                for (_, handle) in node.outgoing() {
                    if let Handle::Model(model) = handle {
                        *instances.entry(model).or_default() += 1;
                    }
                }
            }
            let records = self.container.records_mut(family);
            self.sources.push((family, records.len(), id));
            records.push(record);
        }
        self.members = members;

        if !errors.is_empty() {
            return Err(Error::aggregate(errors));
        }

        for (id, model) in store.models().all_models_sorted_by_name() {
            if self.subset && !instances.contains_key(&id) {
                continue;
            }
            let subtype = Subtype::Model(model.subtype);
            let descriptor = registry.descriptor(store.variant(), subtype)?;
            let mut record = Record::new(model.name.clone(), &descriptor);
            for (index, field) in descriptor.fields().iter().enumerate() {
                let value = match descriptor.derivation(field.name) {
                    Some(Derivation::SibPath) if keeps_declared_path(model) => {
                        FlatValue::String(model.sib_path.clone())
                    }
                    Some(Derivation::SibPath) => FlatValue::String(paths.model_path(
                        store.variant(),
                        &model.name,
                        model.subtype,
                        store.map_id(),
                    )),
                    Some(Derivation::InstanceCount) => {
                        let count = instances.get(&id).copied().unwrap_or(0);
                        FlatValue::I32(i32::try_from(count).map_err(|_| {
                            Error::new(ErrorKind::Internal(format!(
                                "{count} instances of model {:?}",
                                model.name
                            )))
                        })?)
                    }
                    None => continue,
                };
                record.values[index] = value;
            }
            if model.dirty {
                self.dirty_models.push(id);
            }
            self.model_names.insert(id, model.name.clone());
            self.container.models.push(record);
        }

        tracing::debug!(
            parts = self.container.parts.len(),
            regions = self.container.regions.len(),
            events = self.container.events.len(),
            models = self.container.models.len(),
            "built records without references"
        );
        Ok(self.advance())
    }

    fn plain_record(&mut self, node: &GraphNode, errors: &mut Vec<Error>) -> Result<Record> {
        let descriptor = node.descriptor();
        let context = || ErrorContext::new().with_record(node.family(), node.name.clone());
        let mut record = Record::new(node.name.clone(), descriptor);
        for (index, (field, value)) in descriptor.fields().iter().zip(node.values()).enumerate() {
            if field.is_reference() {
                continue;
            }
            record.values[index] = field
                .write(value)
                .map_err(|e| e.with_context(context().with_field(field.name)))?;
        }

        for &(first, second) in descriptor.exclusive_pairs() {
            if node.get(first)?.is_zero() || node.get(second)?.is_zero() {
                continue;
            }
            if self.strict_exclusive {
                errors.push(Error::new(ErrorKind::ExclusiveFields {
                    subtype: node.subtype().to_string(),
                    name: node.name.clone(),
                    first: first.to_string(),
                    second: second.to_string(),
                }));
            } else {
                self.diagnostics.push(
                    DiagnosticKind::ExclusiveFields,
                    node.family(),
                    node.name.clone(),
                    format!("{first} and {second} are both set; the game reads only one"),
                );
            }
        }
        Ok(record)
    }
}

// =============================================================================
// RecordsWithoutRefs
// =============================================================================

impl<'a> Export<'a, RecordsWithoutRefs> {
    /// Translates every reference handle into the target record's name.
    ///
    /// # Errors
    ///
    /// Returns every reference to a node outside the export set or to a
    /// placeholder, aggregated.
    pub fn resolve_refs(mut self) -> Result<Export<'a, RecordsResolved>> {
        let store = self.store;
        let names: HashMap<NodeId, &str> = self
            .members
            .iter()
            .filter_map(|&id| store.get(id).ok().map(|node| (id, node.name.as_str())))
            .collect();

        let mut errors = Vec::new();
        let mut updates = Vec::new();
        for &(family, index, id) in &self.sources {
            let node = store.get(id)?;
            for (field_index, field, _, _) in node.descriptor().references() {
                let Some(value) = node.value_at(field_index) else {
                    continue;
                };
                let translated = value.clone().map_refs(|handle| {
                    self.name_of(handle, &names).map_err(|target| {
                        target.into_error(family, &node.name, field.name)
                    })
                });
                match translated {
                    Ok(flat) => updates.push((family, index, field_index, flat)),
                    Err(e) => errors.push(e),
                }
            }
        }

        if !errors.is_empty() {
            return Err(Error::aggregate(errors));
        }
        let count = updates.len();
        for (family, index, field_index, flat) in updates {
            self.container.records_mut(family)[index].values[field_index] = flat;
        }
        tracing::debug!(references = count, "translated references to names");
        Ok(self.advance())
    }

    fn name_of(
        &self,
        handle: Handle,
        names: &HashMap<NodeId, &str>,
    ) -> std::result::Result<String, Unexportable> {
        match handle {
            Handle::Node(id) => {
                if let Some(name) = names.get(&id) {
                    return Ok((*name).to_string());
                }
                Err(match self.store.get(id) {
                    Ok(target) if target.is_placeholder => Unexportable::Placeholder {
                        family: target.family(),
                        name: target.name.clone(),
                    },
                    Ok(target) => Unexportable::Missing(target.name.clone()),
                    Err(_) => Unexportable::Missing(id.to_string()),
                })
            }
            Handle::Model(id) => self.model_names.get(&id).cloned().ok_or_else(|| {
                Unexportable::Missing(
                    self.store
                        .models()
                        .get(id)
                        .map_or_else(|| id.to_string(), |m| m.name.clone()),
                )
            }),
        }
    }
}

/// Why a reference cannot be written.
enum Unexportable {
    Missing(String),
    Placeholder { family: Family, name: String },
}

impl Unexportable {
    fn into_error(self, family: Family, source: &str, field: &str) -> Error {
        let kind = match self {
            Self::Missing(target) => ErrorKind::MissingExportTarget {
                family,
                source_name: source.to_string(),
                field: field.to_string(),
                target,
            },
            Self::Placeholder {
                family: target_family,
                name,
            } => ErrorKind::PlaceholderExport {
                family,
                source_name: source.to_string(),
                field: field.to_string(),
                target_family,
                target: name,
            },
        };
        Error::new(kind)
    }
}

// =============================================================================
// RecordsResolved
// =============================================================================

impl Export<'_, RecordsResolved> {
    /// Sorts the records canonically and hands them over.
    #[must_use]
    pub fn finish(mut self) -> ExportOutput {
        self.container.canonicalize();
        ExportOutput {
            container: self.container,
            diagnostics: self.diagnostics,
            dirty_models: self.dirty_models,
        }
    }
}

/// Runs every export phase.
///
/// # Errors
///
/// See [`Export::new`], [`Export::records_without_refs`] and
/// [`Export::resolve_refs`].
pub fn export_store(
    store: &EntityStore,
    registry: &SubtypeRegistry,
    paths: &dyn PathConvention,
    options: &ExportOptions,
) -> Result<ExportOutput> {
    Ok(Export::new(store, options)?
        .records_without_refs(registry, paths)?
        .resolve_refs()?
        .finish())
}

fn keeps_declared_path(model: &Model) -> bool {
    !model.dirty && !model.sib_path.is_empty()
}

/// Every live non-placeholder node reachable from `roots`, roots included.
fn closure(store: &EntityStore, roots: &[NodeId]) -> HashSet<NodeId> {
    let mut seen: HashSet<NodeId> = roots.iter().copied().collect();
    let mut queue: VecDeque<NodeId> = roots.iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        let Ok(node) = store.get(id) else {
            continue;
        };
        for (_, handle) in node.outgoing() {
            let Handle::Node(target) = handle else {
                continue;
            };
            let live = store.get(target).is_ok_and(|t| !t.is_placeholder);
            if live && seen.insert(target) {
                queue.push_back(target);
            }
        }
    }
    seen
}
