//! Flat records and the container that holds them.

use mapstudio_foundation::{Error, Family, FlatValue, GameVariant, Result};
use mapstudio_schema::{EntityDescriptor, Subtype};

/// One unlinked entry of a map container.
///
/// Values are in descriptor field order; references hold target names.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Record name.
    pub name: String,
    /// Record subtype; its family is the list the record lives in.
    pub subtype: Subtype,
    /// Field values in descriptor order.
    pub values: Vec<FlatValue>,
}

impl Record {
    /// Creates a record with every field at its zero value.
    #[must_use]
    pub fn new(name: impl Into<String>, descriptor: &EntityDescriptor) -> Self {
        Self {
            name: name.into(),
            subtype: descriptor.subtype,
            values: descriptor.fields().iter().map(|f| f.default_flat()).collect(),
        }
    }

    /// Record family.
    #[must_use]
    pub const fn family(&self) -> Family {
        self.subtype.family()
    }

    /// Returns a value by field name.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor has no such field.
    pub fn get(&self, descriptor: &EntityDescriptor, field: &str) -> Result<&FlatValue> {
        let index = descriptor.require_field(field)?;
        self.values
            .get(index)
            .ok_or_else(|| Error::field_not_found(self.subtype.to_string(), field))
    }

    /// Sets a value by field name, checking its flat type.
    ///
    /// # Errors
    ///
    /// Returns an error if the field does not exist or the value has the
    /// wrong type.
    pub fn set(&mut self, descriptor: &EntityDescriptor, field: &str, value: FlatValue) -> Result<()> {
        let index = descriptor.require_field(field)?;
        let expected = descriptor.fields()[index].flat_type();
        if value.value_type() != expected {
            return Err(Error::type_mismatch(expected, value.value_type()));
        }
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::field_not_found(self.subtype.to_string(), field)),
        }
    }
}

/// The flat form of a whole map: one record list per family.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatContainer {
    /// Game variant, from the header.
    pub variant: GameVariant,
    /// Map identifier, from the header.
    pub map_id: String,
    /// Model declarations.
    pub models: Vec<Record>,
    /// Placement instances.
    pub parts: Vec<Record>,
    /// Spatial volumes.
    pub regions: Vec<Record>,
    /// Events.
    pub events: Vec<Record>,
}

impl FlatContainer {
    /// Creates an empty container.
    #[must_use]
    pub fn new(variant: GameVariant, map_id: impl Into<String>) -> Self {
        Self {
            variant,
            map_id: map_id.into(),
            models: Vec::new(),
            parts: Vec::new(),
            regions: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Records of one family.
    #[must_use]
    pub fn records(&self, family: Family) -> &[Record] {
        match family {
            Family::Model => &self.models,
            Family::Part => &self.parts,
            Family::Region => &self.regions,
            Family::Event => &self.events,
        }
    }

    /// Records of one family, mutably.
    pub fn records_mut(&mut self, family: Family) -> &mut Vec<Record> {
        match family {
            Family::Model => &mut self.models,
            Family::Part => &mut self.parts,
            Family::Region => &mut self.regions,
            Family::Event => &mut self.events,
        }
    }

    /// Appends a record to its family's list.
    pub fn push(&mut self, record: Record) {
        self.records_mut(record.family()).push(record);
    }

    /// Finds a record by family and name; the last match wins.
    #[must_use]
    pub fn find(&self, family: Family, name: &str) -> Option<&Record> {
        self.records(family).iter().rev().find(|r| r.name == name)
    }

    /// Total number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        Family::CONTAINER_ORDER
            .iter()
            .map(|&f| self.records(f).len())
            .sum()
    }

    /// Returns true if the container holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorts every family by subtype, then by name.
    ///
    /// This is the order the encoder groups records in, so a canonical
    /// container survives an encode/decode cycle unchanged.
    pub fn canonicalize(&mut self) {
        for family in Family::CONTAINER_ORDER {
            self.records_mut(family)
                .sort_by(|a, b| a.subtype.cmp(&b.subtype).then_with(|| a.name.cmp(&b.name)));
        }
    }
}
