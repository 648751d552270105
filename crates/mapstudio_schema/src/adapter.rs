//! Field adapters: rules for moving one field between a flat record and a
//! graph node.
//!
//! An adapter is a pure function of its input and its static configuration.
//! Direct and bit-set adapters convert values in both directions here;
//! reference adapters only describe their target, and the resolver performs
//! the name/handle translation once every node exists.

use mapstudio_foundation::{
    BitSet128, BitSet256, BitWidth, Error, ErrorKind, Family, FieldType, FlatValue, NodeValue,
    Result,
};

use crate::subtype::Subtype;

/// Primitive unit or axis conversion applied by a direct adapter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Conversion {
    /// Value is copied unchanged.
    Identity,
    /// Game axis order (Y up) to editor axis order (Z up): swaps Y and Z.
    SwapYZ,
    /// Euler degrees in game axis order to radians in editor axis order.
    EulerDegrees,
    /// Scalar degrees to radians.
    Degrees,
}

impl Conversion {
    /// Graph-side type produced from a flat field of type `flat`.
    #[must_use]
    pub const fn node_type(self, flat: FieldType) -> FieldType {
        match self {
            Self::Identity | Self::SwapYZ => flat,
            Self::EulerDegrees => FieldType::Euler,
            Self::Degrees => FieldType::F64,
        }
    }

    /// Flat type a conversion requires, if it constrains one.
    #[must_use]
    pub const fn required_flat_type(self) -> Option<FieldType> {
        match self {
            Self::Identity => None,
            Self::SwapYZ | Self::EulerDegrees => Some(FieldType::Vec3),
            Self::Degrees => Some(FieldType::F32),
        }
    }
}

/// Target of a reference field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RefTarget {
    /// Family the referenced record belongs to.
    pub family: Family,
    /// Optional subtype the referenced record must have.
    pub subtype: Option<Subtype>,
}

impl RefTarget {
    /// A reference to any record of a family.
    #[must_use]
    pub const fn any(family: Family) -> Self {
        Self {
            family,
            subtype: None,
        }
    }

    /// A reference restricted to one subtype.
    #[must_use]
    pub fn only(subtype: impl Into<Subtype>) -> Self {
        let subtype = subtype.into();
        Self {
            family: subtype.family(),
            subtype: Some(subtype),
        }
    }

    /// Returns true if a record of `subtype` satisfies this target.
    #[must_use]
    pub fn accepts(&self, subtype: Subtype) -> bool {
        subtype.family() == self.family && self.subtype.is_none_or(|s| s == subtype)
    }

    /// Subtype a placeholder for this target should have.
    #[must_use]
    pub fn placeholder_subtype(&self) -> Subtype {
        self.subtype
            .unwrap_or_else(|| Subtype::placeholder_default(self.family))
    }
}

/// The three kinds of field adapter.
#[derive(Clone, Debug, PartialEq)]
pub enum AdapterKind {
    /// Identity or primitive conversion.
    Direct {
        /// Flat-side type.
        ty: FieldType,
        /// Conversion to the graph representation.
        conversion: Conversion,
    },
    /// Packed `u32` blocks to an unpacked bit-set of declared width.
    BitSet {
        /// Declared width.
        width: BitWidth,
    },
    /// Deferred reference to another record.
    Reference {
        /// What the reference may point at.
        target: RefTarget,
        /// Array arity; 0 means a scalar reference.
        arity: usize,
    },
}

/// A named field adapter.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldAdapter {
    /// Field name, unique within a descriptor.
    pub name: &'static str,
    /// Adapter kind and configuration.
    pub kind: AdapterKind,
}

impl FieldAdapter {
    /// A field copied unchanged.
    #[must_use]
    pub const fn plain(name: &'static str, ty: FieldType) -> Self {
        Self::direct(name, ty, Conversion::Identity)
    }

    /// A field with a primitive conversion.
    #[must_use]
    pub const fn direct(name: &'static str, ty: FieldType, conversion: Conversion) -> Self {
        Self {
            name,
            kind: AdapterKind::Direct { ty, conversion },
        }
    }

    /// A position or scale vector (axis swap).
    #[must_use]
    pub const fn position(name: &'static str) -> Self {
        Self::direct(name, FieldType::Vec3, Conversion::SwapYZ)
    }

    /// An Euler rotation in degrees (axis swap and radians).
    #[must_use]
    pub const fn rotation(name: &'static str) -> Self {
        Self::direct(name, FieldType::Vec3, Conversion::EulerDegrees)
    }

    /// A bit-set field.
    #[must_use]
    pub const fn bits(name: &'static str, width: BitWidth) -> Self {
        Self {
            name,
            kind: AdapterKind::BitSet { width },
        }
    }

    /// A scalar reference.
    #[must_use]
    pub const fn reference(name: &'static str, target: RefTarget) -> Self {
        Self {
            name,
            kind: AdapterKind::Reference { target, arity: 0 },
        }
    }

    /// A fixed-size reference array.
    #[must_use]
    pub const fn references(name: &'static str, target: RefTarget, arity: usize) -> Self {
        Self {
            name,
            kind: AdapterKind::Reference { target, arity },
        }
    }

    /// Returns true for reference adapters.
    #[must_use]
    pub const fn is_reference(&self) -> bool {
        matches!(self.kind, AdapterKind::Reference { .. })
    }

    /// Returns the reference target and arity of a reference adapter.
    #[must_use]
    pub const fn reference_target(&self) -> Option<(RefTarget, usize)> {
        match self.kind {
            AdapterKind::Reference { target, arity } => Some((target, arity)),
            _ => None,
        }
    }

    /// Type of this field in a flat record.
    #[must_use]
    pub const fn flat_type(&self) -> FieldType {
        match self.kind {
            AdapterKind::Direct { ty, .. } => ty,
            AdapterKind::BitSet { width } => FieldType::Blocks(width.blocks()),
            AdapterKind::Reference { arity: 0, .. } => FieldType::Ref,
            AdapterKind::Reference { arity, .. } => FieldType::RefArray(arity),
        }
    }

    /// Type of this field in a graph node.
    #[must_use]
    pub const fn node_type(&self) -> FieldType {
        match self.kind {
            AdapterKind::Direct { ty, conversion } => conversion.node_type(ty),
            AdapterKind::BitSet {
                width: BitWidth::W128,
            } => FieldType::Bits128,
            AdapterKind::BitSet {
                width: BitWidth::W256,
            } => FieldType::Bits256,
            AdapterKind::Reference { .. } => self.flat_type(),
        }
    }

    /// Zero value for the flat side.
    #[must_use]
    pub fn default_flat(&self) -> FlatValue {
        FlatValue::default_for(self.flat_type())
    }

    /// Zero value for the graph side.
    #[must_use]
    pub fn default_node(&self) -> NodeValue {
        NodeValue::default_for(self.node_type())
    }

    /// Converts a flat value to its graph representation.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch if the value does not have the flat type, a
    /// bit-set width mismatch if a bit-set has the wrong block count, or an
    /// internal error when called on a reference adapter.
    pub fn read(&self, flat: &FlatValue) -> Result<NodeValue> {
        match self.kind {
            AdapterKind::Direct { ty, conversion } => {
                expect_type(ty, flat)?;
                Ok(match (conversion, flat) {
                    (Conversion::SwapYZ, FlatValue::Vec3(v)) => NodeValue::Vec3(swap_yz(*v)),
                    (Conversion::EulerDegrees, FlatValue::Vec3(v)) => {
                        let [x, y, z] = swap_yz(*v);
                        NodeValue::Euler([
                            f64::from(x).to_radians(),
                            f64::from(y).to_radians(),
                            f64::from(z).to_radians(),
                        ])
                    }
                    (Conversion::Degrees, FlatValue::F32(d)) => {
                        NodeValue::F64(f64::from(*d).to_radians())
                    }
                    _ => flat.clone().cast_plain().ok_or_else(|| {
                        Error::new(ErrorKind::Internal(format!(
                            "direct field {} holds a reference",
                            self.name
                        )))
                    })?,
                })
            }
            AdapterKind::BitSet { width } => match flat {
                FlatValue::Blocks(blocks) => match width {
                    BitWidth::W128 => Ok(NodeValue::Bits128(BitSet128::try_from_slice(blocks)?)),
                    BitWidth::W256 => Ok(NodeValue::Bits256(BitSet256::try_from_slice(blocks)?)),
                },
                other => Err(Error::type_mismatch(self.flat_type(), other.value_type())),
            },
            AdapterKind::Reference { .. } => Err(self.reference_misuse()),
        }
    }

    /// Converts a graph value back to its flat representation.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch if the value does not have the node type, a
    /// bit-set width mismatch if a bit-set of the other width is supplied, or
    /// an internal error when called on a reference adapter.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write(&self, node: &NodeValue) -> Result<FlatValue> {
        match self.kind {
            AdapterKind::Direct { ty, conversion } => {
                expect_type(conversion.node_type(ty), node)?;
                Ok(match (conversion, node) {
                    (Conversion::SwapYZ, NodeValue::Vec3(v)) => FlatValue::Vec3(swap_yz(*v)),
                    (Conversion::EulerDegrees, NodeValue::Euler([x, y, z])) => {
                        FlatValue::Vec3(swap_yz([
                            x.to_degrees() as f32,
                            y.to_degrees() as f32,
                            z.to_degrees() as f32,
                        ]))
                    }
                    (Conversion::Degrees, NodeValue::F64(r)) => {
                        FlatValue::F32(r.to_degrees() as f32)
                    }
                    _ => node.clone().cast_plain().ok_or_else(|| {
                        Error::new(ErrorKind::Internal(format!(
                            "direct field {} holds a reference",
                            self.name
                        )))
                    })?,
                })
            }
            AdapterKind::BitSet { width } => match (width, node) {
                (BitWidth::W128, NodeValue::Bits128(set)) => {
                    Ok(FlatValue::Blocks(set.to_blocks().to_vec()))
                }
                (BitWidth::W256, NodeValue::Bits256(set)) => {
                    Ok(FlatValue::Blocks(set.to_blocks().to_vec()))
                }
                (BitWidth::W128, NodeValue::Bits256(_)) => Err(Error::bit_width_mismatch(128, 256)),
                (BitWidth::W256, NodeValue::Bits128(_)) => Err(Error::bit_width_mismatch(256, 128)),
                (_, other) => Err(Error::type_mismatch(self.node_type(), other.value_type())),
            },
            AdapterKind::Reference { .. } => Err(self.reference_misuse()),
        }
    }

    fn reference_misuse(&self) -> Error {
        Error::new(ErrorKind::Internal(format!(
            "reference field {} is translated by the resolver, not by read/write",
            self.name
        )))
    }
}

fn expect_type<R>(expected: FieldType, value: &mapstudio_foundation::Value<R>) -> Result<()> {
    let actual = value.value_type();
    if actual == expected {
        Ok(())
    } else {
        Err(Error::type_mismatch(expected, actual))
    }
}

fn swap_yz<T: Copy>([x, y, z]: [T; 3]) -> [T; 3] {
    [x, z, y]
}
