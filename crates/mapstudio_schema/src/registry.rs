//! The subtype registry.
//!
//! Maps `(game variant, subtype)` to an [`EntityDescriptor`]. A tag read from
//! a container that has no registered descriptor for the container's variant
//! is a configuration error, never a silent skip.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use mapstudio_foundation::{Error, ErrorKind, Family, GameVariant, Result};

use crate::descriptor::{CycleSpec, EntityDescriptor};
use crate::subtype::Subtype;
use crate::tables;

/// Registry of entity descriptors for every supported game variant.
#[derive(Clone, Debug, Default)]
pub struct SubtypeRegistry {
    descriptors: HashMap<(GameVariant, Subtype), Arc<EntityDescriptor>>,
    cycles: HashMap<GameVariant, CycleSpec>,
}

impl SubtypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in registry covering every [`GameVariant`].
    ///
    /// Built once on first use and shared for the life of the process.
    ///
    /// # Panics
    ///
    /// Panics if the built-in tables fail validation, which the test suite
    /// rules out.
    #[must_use]
    pub fn standard() -> &'static Self {
        static STANDARD: OnceLock<SubtypeRegistry> = OnceLock::new();
        STANDARD.get_or_init(|| {
            Self::build_standard().expect("built-in descriptor tables are valid")
        })
    }

    /// Builds a fresh copy of the built-in registry.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in descriptor is invalid.
    pub fn build_standard() -> Result<Self> {
        let mut registry = Self::new();
        tables::register_all(&mut registry)?;
        registry.validate_total()?;
        Ok(registry)
    }

    /// Registers a descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor is invalid or if its
    /// `(variant, subtype)` is already registered.
    pub fn register(&mut self, descriptor: EntityDescriptor) -> Result<()> {
        descriptor.validate()?;
        let key = (descriptor.variant, descriptor.subtype);
        if self.descriptors.contains_key(&key) {
            return Err(Error::new(ErrorKind::Internal(format!(
                "descriptor already registered: {} for {}",
                key.1, key.0
            ))));
        }
        tracing::trace!(variant = %key.0, subtype = %key.1, "registered descriptor");
        self.descriptors.insert(key, Arc::new(descriptor));
        Ok(())
    }

    /// Declares the mutual reference pair for a variant.
    pub fn declare_cycle(&mut self, variant: GameVariant, cycle: CycleSpec) {
        self.cycles.insert(variant, cycle);
    }

    /// Returns the descriptor for a subtype, if registered.
    #[must_use]
    pub fn get(&self, variant: GameVariant, subtype: Subtype) -> Option<&Arc<EntityDescriptor>> {
        self.descriptors.get(&(variant, subtype))
    }

    /// Returns the descriptor for a subtype.
    ///
    /// # Errors
    ///
    /// Returns an unregistered-subtype error if the variant does not support
    /// the subtype.
    pub fn descriptor(
        &self,
        variant: GameVariant,
        subtype: Subtype,
    ) -> Result<Arc<EntityDescriptor>> {
        self.get(variant, subtype).cloned().ok_or_else(|| {
            Error::unregistered_subtype(variant, subtype.family(), subtype.tag())
        })
    }

    /// Parses a container tag and checks the variant supports it.
    ///
    /// # Errors
    ///
    /// Returns an unregistered-subtype error if the tag is unknown in the
    /// family or unsupported by the variant.
    pub fn resolve_tag(&self, variant: GameVariant, family: Family, tag: &str) -> Result<Subtype> {
        match Subtype::from_tag(family, tag) {
            Some(subtype) if self.supports(variant, subtype) => Ok(subtype),
            _ => Err(Error::unregistered_subtype(variant, family, tag)),
        }
    }

    /// Returns true if the variant has a descriptor for the subtype.
    #[must_use]
    pub fn supports(&self, variant: GameVariant, subtype: Subtype) -> bool {
        self.descriptors.contains_key(&(variant, subtype))
    }

    /// Subtypes of a family supported by a variant, in canonical order.
    #[must_use]
    pub fn subtypes(&self, variant: GameVariant, family: Family) -> Vec<Subtype> {
        let mut subtypes: Vec<Subtype> = self
            .descriptors
            .keys()
            .filter(|(v, s)| *v == variant && s.family() == family)
            .map(|(_, s)| *s)
            .collect();
        subtypes.sort_unstable();
        subtypes
    }

    /// The mutual reference pair declared for a variant, if any.
    #[must_use]
    pub fn cycle(&self, variant: GameVariant) -> Option<CycleSpec> {
        self.cycles.get(&variant).copied()
    }

    /// Number of registered descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Checks cross-descriptor consistency.
    ///
    /// Every variant with any descriptor must cover all four families and
    /// support each family's placeholder subtype. Every reference target must
    /// be constructible as a placeholder in the same variant. A declared cycle
    /// must name a forward reference into the inverse family on every
    /// forward-family descriptor, and a reference back on at least one
    /// inverse-family descriptor.
    ///
    /// # Errors
    ///
    /// Returns an aggregate of every violation found.
    pub fn validate_total(&self) -> Result<()> {
        let mut errors = Vec::new();
        let mut variants: Vec<GameVariant> = self.descriptors.keys().map(|(v, _)| *v).collect();
        variants.sort_unstable();
        variants.dedup();

        for &variant in &variants {
            for family in Family::CONTAINER_ORDER {
                let fallback = Subtype::placeholder_default(family);
                if !self.supports(variant, fallback) {
                    errors.push(internal(format!(
                        "{variant} does not support placeholder subtype {fallback}"
                    )));
                }
            }
        }

        for ((variant, _), descriptor) in &self.descriptors {
            for (_, field, target, _) in descriptor.references() {
                let placeholder = target.placeholder_subtype();
                if !self.supports(*variant, placeholder) {
                    errors.push(internal(format!(
                        "{} field {} targets {placeholder}, unsupported in {variant}",
                        descriptor.subtype, field.name
                    )));
                }
            }
        }

        for (&variant, cycle) in &self.cycles {
            for subtype in self.subtypes(variant, cycle.forward_family) {
                let forward = self
                    .get(variant, subtype)
                    .and_then(|d| d.field(cycle.forward_field))
                    .and_then(crate::adapter::FieldAdapter::reference_target);
                if !matches!(forward, Some((t, 0)) if t.family == cycle.inverse_family) {
                    errors.push(internal(format!(
                        "{subtype} in {variant} lacks forward cycle field {}",
                        cycle.forward_field
                    )));
                }
            }
            let has_inverse = self
                .subtypes(variant, cycle.inverse_family)
                .into_iter()
                .filter_map(|s| self.get(variant, s))
                .any(|d| {
                    matches!(
                        d.field(cycle.inverse_field).and_then(crate::adapter::FieldAdapter::reference_target),
                        Some((t, 0)) if t.family == cycle.forward_family
                    )
                });
            if !has_inverse {
                errors.push(internal(format!(
                    "no {} descriptor in {variant} carries inverse cycle field {}",
                    cycle.inverse_family, cycle.inverse_field
                )));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::aggregate(errors))
        }
    }
}

fn internal(message: String) -> Error {
    Error::new(ErrorKind::Internal(message))
}
