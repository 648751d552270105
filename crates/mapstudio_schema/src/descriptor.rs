//! Entity descriptors.
//!
//! A descriptor is the static definition of one `(game variant, subtype)`:
//! its ordered field adapters, which reference field (if any) decides the
//! node's presentation parent, which fields are derived at export, and which
//! field pairs must not both be set.

use std::collections::HashSet;

use mapstudio_foundation::{Error, ErrorKind, Family, GameVariant, Result};

use crate::adapter::{FieldAdapter, RefTarget};
use crate::subtype::Subtype;

/// How a derived field is regenerated at export.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Derivation {
    /// Canonical asset path from the path convention helper.
    SibPath,
    /// Number of exported parts that reference the model.
    InstanceCount,
}

/// Static definition of one subtype in one game variant.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityDescriptor {
    /// Game variant.
    pub variant: GameVariant,
    /// Subtype described.
    pub subtype: Subtype,
    fields: Vec<FieldAdapter>,
    parent_field: Option<&'static str>,
    derived: Vec<(&'static str, Derivation)>,
    exclusive_pairs: Vec<(&'static str, &'static str)>,
}

impl EntityDescriptor {
    /// Creates a descriptor with no fields.
    #[must_use]
    pub fn new(variant: GameVariant, subtype: impl Into<Subtype>) -> Self {
        Self {
            variant,
            subtype: subtype.into(),
            fields: Vec::new(),
            parent_field: None,
            derived: Vec::new(),
            exclusive_pairs: Vec::new(),
        }
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field(mut self, field: FieldAdapter) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends a list of fields in order.
    #[must_use]
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldAdapter>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Names the reference field that decides the presentation parent.
    #[must_use]
    pub fn with_parent(mut self, field: &'static str) -> Self {
        self.parent_field = Some(field);
        self
    }

    /// Marks a field as derived.
    #[must_use]
    pub fn with_derived(mut self, field: &'static str, derivation: Derivation) -> Self {
        self.derived.push((field, derivation));
        self
    }

    /// Declares two fields that must not both be non-zero.
    #[must_use]
    pub fn with_exclusive(mut self, first: &'static str, second: &'static str) -> Self {
        self.exclusive_pairs.push((first, second));
        self
    }

    /// Family of the described subtype.
    #[must_use]
    pub const fn family(&self) -> Family {
        self.subtype.family()
    }

    /// Ordered field adapters.
    #[must_use]
    pub fn fields(&self) -> &[FieldAdapter] {
        &self.fields
    }

    /// Returns the field adapter by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldAdapter> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the position of a field.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns the position of a field, or a field-not-found error.
    ///
    /// # Errors
    ///
    /// Returns an error if no field has this name.
    pub fn require_field(&self, name: &str) -> Result<usize> {
        self.field_index(name)
            .ok_or_else(|| Error::field_not_found(self.subtype.to_string(), name))
    }

    /// Iterates over reference fields with their positions and targets.
    pub fn references(&self) -> impl Iterator<Item = (usize, &FieldAdapter, RefTarget, usize)> {
        self.fields.iter().enumerate().filter_map(|(i, f)| {
            f.reference_target()
                .map(|(target, arity)| (i, f, target, arity))
        })
    }

    /// Name of the parent reference field, if any.
    #[must_use]
    pub const fn parent_field(&self) -> Option<&'static str> {
        self.parent_field
    }

    /// Derivation of a field, if it is derived.
    #[must_use]
    pub fn derivation(&self, field: &str) -> Option<Derivation> {
        self.derived
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, d)| *d)
    }

    /// Mutually exclusive field pairs.
    #[must_use]
    pub fn exclusive_pairs(&self) -> &[(&'static str, &'static str)] {
        &self.exclusive_pairs
    }

    /// Checks internal consistency.
    ///
    /// # Errors
    ///
    /// Returns an error if field names repeat, if the parent field is not a
    /// scalar reference, if a derived or exclusive field does not exist, or
    /// if a direct conversion is applied to the wrong flat type.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name) {
                return Err(self.invalid(format!("duplicate field {}", field.name)));
            }
            if let crate::adapter::AdapterKind::Direct { ty, conversion } = field.kind {
                if let Some(required) = conversion.required_flat_type() {
                    if required != ty {
                        return Err(self.invalid(format!(
                            "field {} uses {conversion:?} on {ty}",
                            field.name
                        )));
                    }
                }
            }
        }

        if let Some(parent) = self.parent_field {
            match self.field(parent).and_then(FieldAdapter::reference_target) {
                Some((_, 0)) => {}
                _ => {
                    return Err(
                        self.invalid(format!("parent field {parent} is not a scalar reference"))
                    );
                }
            }
        }

        for (name, _) in &self.derived {
            if self.field(name).is_none() {
                return Err(self.invalid(format!("derived field {name} does not exist")));
            }
        }

        for (first, second) in &self.exclusive_pairs {
            if self.field(first).is_none() || self.field(second).is_none() {
                return Err(self.invalid(format!(
                    "exclusive pair ({first}, {second}) names a missing field"
                )));
            }
        }

        Ok(())
    }

    fn invalid(&self, message: String) -> Error {
        Error::new(ErrorKind::Internal(format!(
            "invalid descriptor {} for {}: {message}",
            self.subtype, self.variant
        )))
    }
}

/// The one family pair allowed to reference each other.
///
/// A forward-family node names a partner in `forward_field`; the partner
/// names it back in `inverse_field`. Only the partner subtypes that carry
/// `inverse_field` take part.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CycleSpec {
    /// Family holding the forward reference.
    pub forward_family: Family,
    /// Forward reference field name.
    pub forward_field: &'static str,
    /// Family holding the inverse reference.
    pub inverse_family: Family,
    /// Inverse reference field name.
    pub inverse_field: &'static str,
}
