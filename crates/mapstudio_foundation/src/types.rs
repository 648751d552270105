//! Type descriptors for descriptor validation.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type descriptor for a record or node field.
///
/// Flat records and graph nodes share one type vocabulary. `F64` and `Euler`
/// only appear on the graph side, after a unit conversion; `Blocks` only on
/// the flat side, before bit-set unpacking.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FieldType {
    /// Boolean stored as one byte.
    Bool,
    /// Unsigned byte.
    U8,
    /// Signed byte.
    I8,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 32-bit integer.
    I32,
    /// Unsigned 32-bit integer.
    U32,
    /// 32-bit float.
    F32,
    /// 64-bit float (converted angles).
    F64,
    /// Three 32-bit floats.
    Vec3,
    /// Three 64-bit floats in radians (converted rotations).
    Euler,
    /// Length-prefixed string.
    String,
    /// Raw packed `u32` blocks of the given count.
    Blocks(usize),
    /// Unpacked 128-bit set.
    Bits128,
    /// Unpacked 256-bit set.
    Bits256,
    /// Single reference.
    Ref,
    /// Fixed-size reference array.
    RefArray(usize),
}

impl FieldType {
    /// Returns true for reference types.
    #[must_use]
    pub const fn is_reference(self) -> bool {
        matches!(self, Self::Ref | Self::RefArray(_))
    }

    /// Encoded size in bytes, or `None` for variable-length types.
    #[must_use]
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            Self::Bool | Self::U8 | Self::I8 => Some(1),
            Self::I16 | Self::U16 => Some(2),
            Self::I32 | Self::U32 | Self::F32 | Self::Ref => Some(4),
            Self::F64 => Some(8),
            Self::Vec3 => Some(12),
            Self::Euler => Some(24),
            Self::Blocks(n) | Self::RefArray(n) => Some(n * 4),
            Self::Bits128 => Some(16),
            Self::Bits256 => Some(32),
            Self::String => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::U8 => write!(f, "u8"),
            Self::I8 => write!(f, "i8"),
            Self::I16 => write!(f, "i16"),
            Self::U16 => write!(f, "u16"),
            Self::I32 => write!(f, "i32"),
            Self::U32 => write!(f, "u32"),
            Self::F32 => write!(f, "f32"),
            Self::F64 => write!(f, "f64"),
            Self::Vec3 => write!(f, "vec3"),
            Self::Euler => write!(f, "euler"),
            Self::String => write!(f, "string"),
            Self::Blocks(n) => write!(f, "blocks[{n}]"),
            Self::Bits128 => write!(f, "bits128"),
            Self::Bits256 => write!(f, "bits256"),
            Self::Ref => write!(f, "ref"),
            Self::RefArray(n) => write!(f, "ref[{n}]"),
        }
    }
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldType({self})")
    }
}
