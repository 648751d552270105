//! Graph nodes: the linked form of a flat record.

use std::sync::Arc;

use mapstudio_foundation::{Error, ErrorKind, Family, FieldType, Handle, NodeId, NodeValue, Result};
use mapstudio_schema::{EntityDescriptor, Subtype};

/// One linked node owned by the entity store.
///
/// Values are held in descriptor field order. Reference fields hold
/// [`Handle`]s; after a completed import every reference is either a live
/// handle or `None`.
#[derive(Clone, Debug)]
pub struct GraphNode {
    /// Handle assigned by the store; null until inserted.
    pub id: NodeId,
    /// Record name.
    pub name: String,
    descriptor: Arc<EntityDescriptor>,
    values: Vec<NodeValue>,
    /// Presentation parent derived from the descriptor's parent field.
    pub parent: Option<NodeId>,
    /// True for nodes synthesized in place of a missing reference target.
    pub is_placeholder: bool,
}

impl GraphNode {
    /// Creates a node with every field at its zero value.
    #[must_use]
    pub fn new(name: impl Into<String>, descriptor: Arc<EntityDescriptor>) -> Self {
        let values = descriptor.fields().iter().map(|f| f.default_node()).collect();
        Self {
            id: NodeId::null(),
            name: name.into(),
            descriptor,
            values,
            parent: None,
            is_placeholder: false,
        }
    }

    /// Creates a placeholder node with every field at its zero value.
    #[must_use]
    pub fn placeholder(name: impl Into<String>, descriptor: Arc<EntityDescriptor>) -> Self {
        let mut node = Self::new(name, descriptor);
        node.is_placeholder = true;
        node
    }

    /// Creates a node from values in descriptor order.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of values or any value's type does not
    /// match the descriptor.
    pub fn with_values(
        name: impl Into<String>,
        descriptor: Arc<EntityDescriptor>,
        values: Vec<NodeValue>,
    ) -> Result<Self> {
        if values.len() != descriptor.fields().len() {
            return Err(Error::new(ErrorKind::Internal(format!(
                "{} expects {} values, got {}",
                descriptor.subtype,
                descriptor.fields().len(),
                values.len()
            ))));
        }
        for (field, value) in descriptor.fields().iter().zip(&values) {
            check(field.node_type(), value)?;
        }
        let mut node = Self::new(name, descriptor);
        node.values = values;
        Ok(node)
    }

    /// Descriptor shared by every node of this subtype.
    #[must_use]
    pub fn descriptor(&self) -> &Arc<EntityDescriptor> {
        &self.descriptor
    }

    /// Node subtype.
    #[must_use]
    pub fn subtype(&self) -> Subtype {
        self.descriptor.subtype
    }

    /// Node family.
    #[must_use]
    pub fn family(&self) -> Family {
        self.descriptor.family()
    }

    /// Values in descriptor order.
    #[must_use]
    pub fn values(&self) -> &[NodeValue] {
        &self.values
    }

    /// Returns a field value by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor has no such field.
    pub fn get(&self, field: &str) -> Result<&NodeValue> {
        let index = self.descriptor.require_field(field)?;
        Ok(&self.values[index])
    }

    /// Returns a field value by position.
    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<&NodeValue> {
        self.values.get(index)
    }

    /// Sets a field value by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the field does not exist or the value has the
    /// wrong type.
    pub fn set(&mut self, field: &str, value: NodeValue) -> Result<()> {
        let index = self.descriptor.require_field(field)?;
        self.set_at(index, value)
    }

    /// Sets a field value by position.
    ///
    /// # Errors
    ///
    /// Returns an error if the position is out of range or the value has the
    /// wrong type.
    pub fn set_at(&mut self, index: usize, value: NodeValue) -> Result<()> {
        let field = self.descriptor.fields().get(index).ok_or_else(|| {
            Error::new(ErrorKind::Internal(format!(
                "{} has no field at position {index}",
                self.descriptor.subtype
            )))
        })?;
        check(field.node_type(), &value)?;
        self.values[index] = value;
        Ok(())
    }

    /// Returns a scalar reference field.
    ///
    /// # Errors
    ///
    /// Returns an error if the field does not exist or is not a scalar
    /// reference.
    pub fn reference(&self, field: &str) -> Result<Option<Handle>> {
        match self.get(field)? {
            NodeValue::Ref(handle) => Ok(*handle),
            other => Err(Error::type_mismatch(
                FieldType::Ref,
                other.value_type(),
            )),
        }
    }

    /// Returns the slots of a reference field, scalar or array.
    ///
    /// # Errors
    ///
    /// Returns an error if the field does not exist or is not a reference.
    pub fn references(&self, field: &str) -> Result<&[Option<Handle>]> {
        let value = self.get(field)?;
        if value.is_reference() {
            Ok(value.ref_slots())
        } else {
            Err(Error::type_mismatch(
                FieldType::Ref,
                value.value_type(),
            ))
        }
    }

    /// Every non-null reference this node holds, with its field name.
    pub fn outgoing(&self) -> impl Iterator<Item = (&'static str, Handle)> + '_ {
        self.descriptor
            .fields()
            .iter()
            .zip(&self.values)
            .filter(|(f, _)| f.is_reference())
            .flat_map(|(f, v)| v.ref_slots().iter().flatten().map(move |h| (f.name, *h)))
    }
}

fn check(expected: FieldType, value: &NodeValue) -> Result<()> {
    let actual = value.value_type();
    if actual == expected {
        Ok(())
    } else {
        Err(Error::type_mismatch(expected, actual))
    }
}
