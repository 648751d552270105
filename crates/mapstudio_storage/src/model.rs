//! Shared models and the model table.
//!
//! Models are keyed by exact name. A part may reference a model that the
//! container never declared; the table then synthesizes a placeholder rather
//! than failing, and the caller may bind the real payload later.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use mapstudio_foundation::{
    DiagnosticKind, Diagnostics, Error, ErrorKind, Family, GameVariant, ModelId, Result,
};
use mapstudio_schema::ModelSubtype;

/// Opaque handle to a model's geometry or texture payload.
///
/// The engine never inspects payload contents; it only carries the handle
/// between the payload codec and the host.
#[derive(Clone)]
pub struct PayloadHandle(Arc<dyn Any + Send + Sync>);

impl PayloadHandle {
    /// Wraps a payload value.
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        Self(Arc::new(payload))
    }

    /// Wraps an already shared payload.
    #[must_use]
    pub fn from_arc(payload: Arc<dyn Any + Send + Sync>) -> Self {
        Self(payload)
    }

    /// Borrows the payload as `T`, if that is its type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Returns true if both handles share one payload.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for PayloadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PayloadHandle(..)")
    }
}

/// A named, shared model.
#[derive(Clone, Debug)]
pub struct Model {
    /// Exact name.
    pub name: String,
    /// Model kind.
    pub subtype: ModelSubtype,
    /// Asset path as declared in the container.
    pub sib_path: String,
    /// Loaded payload, if any.
    pub payload: Option<PayloadHandle>,
    /// True if the model was synthesized or its payload could not be found.
    pub is_placeholder: bool,
    /// True if the payload was edited and needs writing back on export.
    pub dirty: bool,
}

impl Model {
    fn new(name: String, subtype: ModelSubtype) -> Self {
        Self {
            name,
            subtype,
            sib_path: String::new(),
            payload: None,
            is_placeholder: false,
            dirty: false,
        }
    }
}

/// Name-keyed table of models.
#[derive(Clone, Debug, Default)]
pub struct ModelTable {
    models: im::Vector<Model>,
    by_name: im::OrdMap<String, ModelId>,
}

impl ModelTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a model declared by the container.
    ///
    /// A second declaration of the same name replaces the first and records
    /// a duplicate-name diagnostic. Declaring a name that currently holds a
    /// placeholder promotes the placeholder.
    pub fn insert_declared(
        &mut self,
        name: &str,
        subtype: ModelSubtype,
        sib_path: impl Into<String>,
        diagnostics: &mut Diagnostics,
    ) -> ModelId {
        let sib_path = sib_path.into();
        if let Some(id) = self.find(name) {
            if let Some(model) = self.models.get_mut(id.index() as usize) {
                if !model.is_placeholder {
                    diagnostics.push(
                        DiagnosticKind::DuplicateName,
                        Family::Model,
                        name,
                        "model declared twice; the last declaration wins",
                    );
                }
                model.subtype = subtype;
                model.sib_path = sib_path;
                model.is_placeholder = false;
            }
            return id;
        }
        let mut model = Model::new(name.to_string(), subtype);
        model.sib_path = sib_path;
        self.push(model)
    }

    /// Returns the model with this exact name, or synthesizes a placeholder.
    ///
    /// Never fails. A synthesized placeholder records a diagnostic.
    pub fn get_or_create_placeholder(
        &mut self,
        name: &str,
        subtype: ModelSubtype,
        diagnostics: &mut Diagnostics,
    ) -> ModelId {
        if let Some(id) = self.find(name) {
            return id;
        }
        diagnostics.push(
            DiagnosticKind::PlaceholderModel,
            Family::Model,
            name,
            format!("no {subtype} model declared; using a placeholder"),
        );
        let mut model = Model::new(name.to_string(), subtype);
        model.is_placeholder = true;
        self.push(model)
    }

    /// Attaches a real payload, creating the model if it does not exist.
    ///
    /// A new model's subtype is inferred from its name. Binding clears the
    /// placeholder flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is new and its name does not follow a
    /// known prefix convention.
    pub fn bind_payload(&mut self, name: &str, payload: PayloadHandle) -> Result<ModelId> {
        let id = match self.find(name) {
            Some(id) => id,
            None => {
                let subtype = ModelSubtype::infer_from_name(name)
                    .ok_or_else(|| Error::new(ErrorKind::InvalidModelName(name.to_string())))?;
                self.push(Model::new(name.to_string(), subtype))
            }
        };
        let model = self.get_mut(id)?;
        model.payload = Some(payload);
        model.is_placeholder = false;
        tracing::trace!(model = name, "bound payload");
        Ok(id)
    }

    /// Flags a model whose payload could not be loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the model does not exist.
    pub fn mark_missing_payload(&mut self, id: ModelId, diagnostics: &mut Diagnostics) -> Result<()> {
        let model = self.get_mut(id)?;
        model.is_placeholder = true;
        diagnostics.push(
            DiagnosticKind::MissingPayload,
            Family::Model,
            model.name.clone(),
            "payload not found; keeping a placeholder",
        );
        Ok(())
    }

    /// Flags a model for payload write-back on the next export.
    ///
    /// # Errors
    ///
    /// Returns an error if the model does not exist.
    pub fn mark_dirty(&mut self, id: ModelId) -> Result<()> {
        self.get_mut(id)?.dirty = true;
        Ok(())
    }

    /// Clears every dirty flag.
    pub fn clear_dirty(&mut self) {
        for model in self.models.iter_mut() {
            model.dirty = false;
        }
    }

    /// Looks up a model by exact name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<ModelId> {
        self.by_name.get(name).copied()
    }

    /// Returns a model.
    #[must_use]
    pub fn get(&self, id: ModelId) -> Option<&Model> {
        self.models.get(id.index() as usize)
    }

    /// Returns a model mutably.
    ///
    /// # Errors
    ///
    /// Returns an error if the model does not exist.
    pub fn get_mut(&mut self, id: ModelId) -> Result<&mut Model> {
        self.models
            .get_mut(id.index() as usize)
            .ok_or_else(|| Error::new(ErrorKind::Internal(format!("unknown model {id}"))))
    }

    /// Every model ordered by name (lexical on bytes).
    #[must_use]
    pub fn all_models_sorted_by_name(&self) -> Vec<(ModelId, &Model)> {
        self.by_name
            .values()
            .filter_map(|&id| self.get(id).map(|m| (id, m)))
            .collect()
    }

    /// Iterates over models in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (ModelId, &Model)> {
        self.models.iter().zip(0u32..).map(|(m, i)| (ModelId(i), m))
    }

    /// Number of models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns true if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    fn push(&mut self, model: Model) -> ModelId {
        #[allow(clippy::cast_possible_truncation)]
        let id = ModelId(self.models.len() as u32);
        self.by_name.insert(model.name.clone(), id);
        self.models.push_back(model);
        id
    }
}

/// Produces the canonical external path of a model's payload.
pub trait PathConvention: Send + Sync {
    /// Returns the path for a model in a map.
    fn model_path(
        &self,
        variant: GameVariant,
        name: &str,
        subtype: ModelSubtype,
        map_id: &str,
    ) -> String;
}

/// FromSoftware's `N:\` source-tree layout.
#[derive(Copy, Clone, Debug, Default)]
pub struct StandardPathConvention;

impl StandardPathConvention {
    const fn project(variant: GameVariant) -> &'static str {
        match variant {
            GameVariant::DarkSouls1 => "FRPG",
            GameVariant::Bloodborne => "SPRJ",
            GameVariant::DarkSouls3 => "FDP",
            GameVariant::Sekiro => "NTC",
            GameVariant::EldenRing => "GR",
        }
    }
}

impl PathConvention for StandardPathConvention {
    fn model_path(
        &self,
        variant: GameVariant,
        name: &str,
        subtype: ModelSubtype,
        map_id: &str,
    ) -> String {
        let root = format!("N:\\{}\\data\\Model", Self::project(variant));
        match subtype {
            ModelSubtype::MapPiece => format!("{root}\\map\\{map_id}\\sib\\{name}.sib"),
            ModelSubtype::Collision => format!("{root}\\map\\{map_id}\\hkt\\{name}.hkt"),
            ModelSubtype::Navmesh => format!("{root}\\map\\{map_id}\\navimesh\\{name}.sib"),
            ModelSubtype::Object => format!("{root}\\obj\\{name}\\sib\\{name}.sib"),
            ModelSubtype::Asset => format!("{root}\\aeg\\{name}\\sib\\{name}.sib"),
            ModelSubtype::Character | ModelSubtype::Player => {
                format!("{root}\\chr\\{name}\\sib\\{name}.sib")
            }
        }
    }
}
