//! Field values for flat records and graph nodes.
//!
//! [`Value`] is generic over the reference representation `R`. Flat records
//! hold target names ([`FlatValue`]); linked graph nodes hold resolved
//! [`Handle`]s ([`NodeValue`]). Every non-reference variant is shared.

use crate::bits::{BitSet128, BitSet256};
use crate::handle::Handle;
use crate::types::FieldType;

/// A single field value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value<R> {
    /// Boolean.
    Bool(bool),
    /// Unsigned byte.
    U8(u8),
    /// Signed byte.
    I8(i8),
    /// Signed 16-bit integer.
    I16(i16),
    /// Unsigned 16-bit integer.
    U16(u16),
    /// Signed 32-bit integer.
    I32(i32),
    /// Unsigned 32-bit integer.
    U32(u32),
    /// 32-bit float.
    F32(f32),
    /// 64-bit float.
    F64(f64),
    /// Three 32-bit floats.
    Vec3([f32; 3]),
    /// Euler rotation in radians.
    Euler([f64; 3]),
    /// String.
    String(String),
    /// Packed `u32` blocks, as stored in the container.
    Blocks(Vec<u32>),
    /// Unpacked 128-bit set.
    Bits128(BitSet128),
    /// Unpacked 256-bit set.
    Bits256(BitSet256),
    /// Single reference; `None` is an explicit null.
    Ref(Option<R>),
    /// Fixed-size reference array; each slot may be null.
    RefArray(Vec<Option<R>>),
}

/// Value as stored in a flat record: references are target names.
pub type FlatValue = Value<String>;

/// Value as stored in a linked graph node: references are handles.
pub type NodeValue = Value<Handle>;

impl<R> Value<R> {
    /// Returns the type of this value.
    #[must_use]
    pub fn value_type(&self) -> FieldType {
        match self {
            Self::Bool(_) => FieldType::Bool,
            Self::U8(_) => FieldType::U8,
            Self::I8(_) => FieldType::I8,
            Self::I16(_) => FieldType::I16,
            Self::U16(_) => FieldType::U16,
            Self::I32(_) => FieldType::I32,
            Self::U32(_) => FieldType::U32,
            Self::F32(_) => FieldType::F32,
            Self::F64(_) => FieldType::F64,
            Self::Vec3(_) => FieldType::Vec3,
            Self::Euler(_) => FieldType::Euler,
            Self::String(_) => FieldType::String,
            Self::Blocks(b) => FieldType::Blocks(b.len()),
            Self::Bits128(_) => FieldType::Bits128,
            Self::Bits256(_) => FieldType::Bits256,
            Self::Ref(_) => FieldType::Ref,
            Self::RefArray(refs) => FieldType::RefArray(refs.len()),
        }
    }

    /// Returns the zero value of a field type.
    #[must_use]
    pub fn default_for(ty: FieldType) -> Self {
        match ty {
            FieldType::Bool => Self::Bool(false),
            FieldType::U8 => Self::U8(0),
            FieldType::I8 => Self::I8(0),
            FieldType::I16 => Self::I16(0),
            FieldType::U16 => Self::U16(0),
            FieldType::I32 => Self::I32(0),
            FieldType::U32 => Self::U32(0),
            FieldType::F32 => Self::F32(0.0),
            FieldType::F64 => Self::F64(0.0),
            FieldType::Vec3 => Self::Vec3([0.0; 3]),
            FieldType::Euler => Self::Euler([0.0; 3]),
            FieldType::String => Self::String(String::new()),
            FieldType::Blocks(n) => Self::Blocks(vec![0; n]),
            FieldType::Bits128 => Self::Bits128(BitSet128::new()),
            FieldType::Bits256 => Self::Bits256(BitSet256::new()),
            FieldType::Ref => Self::Ref(None),
            FieldType::RefArray(n) => Self::RefArray((0..n).map(|_| None).collect()),
        }
    }

    /// Returns true if this value is a reference or reference array.
    #[must_use]
    pub const fn is_reference(&self) -> bool {
        matches!(self, Self::Ref(_) | Self::RefArray(_))
    }

    /// Returns the reference slots of this value, or an empty slice.
    #[must_use]
    pub fn ref_slots(&self) -> &[Option<R>] {
        match self {
            Self::Ref(r) => std::slice::from_ref(r),
            Self::RefArray(refs) => refs,
            _ => &[],
        }
    }

    /// Attempts to extract a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract any integer as `i64`.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Self::U8(n) => Some(i64::from(n)),
            Self::I8(n) => Some(i64::from(n)),
            Self::I16(n) => Some(i64::from(n)),
            Self::U16(n) => Some(i64::from(n)),
            Self::I32(n) => Some(i64::from(n)),
            Self::U32(n) => Some(i64::from(n)),
            _ => None,
        }
    }

    /// Attempts to extract a string slice.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a three-component vector.
    #[must_use]
    pub const fn as_vec3(&self) -> Option<[f32; 3]> {
        match self {
            Self::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns true if the value is numerically zero or an empty container.
    ///
    /// Used to check that at most one of a mutually exclusive pair is set.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Bool(b) => !b,
            Self::F32(x) => *x == 0.0,
            Self::F64(x) => *x == 0.0,
            Self::String(s) => s.is_empty(),
            Self::Ref(r) => r.is_none(),
            Self::RefArray(refs) => refs.iter().all(Option::is_none),
            other => other.as_int() == Some(0),
        }
    }

    /// Converts every reference with `f`, keeping all other variants.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`.
    pub fn map_refs<S, E>(self, mut f: impl FnMut(R) -> Result<S, E>) -> Result<Value<S>, E> {
        Ok(match self {
            Self::Bool(v) => Value::Bool(v),
            Self::U8(v) => Value::U8(v),
            Self::I8(v) => Value::I8(v),
            Self::I16(v) => Value::I16(v),
            Self::U16(v) => Value::U16(v),
            Self::I32(v) => Value::I32(v),
            Self::U32(v) => Value::U32(v),
            Self::F32(v) => Value::F32(v),
            Self::F64(v) => Value::F64(v),
            Self::Vec3(v) => Value::Vec3(v),
            Self::Euler(v) => Value::Euler(v),
            Self::String(v) => Value::String(v),
            Self::Blocks(v) => Value::Blocks(v),
            Self::Bits128(v) => Value::Bits128(v),
            Self::Bits256(v) => Value::Bits256(v),
            Self::Ref(r) => Value::Ref(r.map(&mut f).transpose()?),
            Self::RefArray(refs) => Value::RefArray(
                refs.into_iter()
                    .map(|r| r.map(&mut f).transpose())
                    .collect::<Result<_, E>>()?,
            ),
        })
    }

    /// Converts a non-reference value into another reference representation.
    ///
    /// Returns `None` for reference variants.
    #[must_use]
    pub fn cast_plain<S>(self) -> Option<Value<S>> {
        if self.is_reference() {
            return None;
        }
        self.map_refs(|_| Err::<S, ()>(())).ok()
    }
}

impl FlatValue {
    /// Returns the names stored in a reference value.
    #[must_use]
    pub fn ref_names(&self) -> Vec<Option<&str>> {
        self.ref_slots().iter().map(Option::as_deref).collect()
    }
}
