//! Fixed-width packed flag vectors.
//!
//! Draw groups, display groups and navmesh groups are stored in the container
//! as consecutive `u32` blocks. [`BitSet128`] and [`BitSet256`] are distinct
//! types; converting between them is never implicit.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::Result;

/// Declared width of a bit-set field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BitWidth {
    /// 128 bits in four blocks.
    W128,
    /// 256 bits in eight blocks.
    W256,
}

impl BitWidth {
    /// Number of 32-bit blocks.
    #[must_use]
    pub const fn blocks(self) -> usize {
        match self {
            Self::W128 => 4,
            Self::W256 => 8,
        }
    }

    /// Number of bits.
    #[must_use]
    pub const fn bits(self) -> usize {
        self.blocks() * 32
    }
}

/// A fixed-width boolean vector packed into `BLOCKS` little-endian `u32` blocks.
///
/// Bit `i` lives in block `i / 32` at position `i % 32`.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct BitSet<const BLOCKS: usize> {
    blocks: [u32; BLOCKS],
}

/// 128-bit group set (Dark Souls, Bloodborne).
pub type BitSet128 = BitSet<4>;

/// 256-bit group set (Dark Souls III and later).
pub type BitSet256 = BitSet<8>;

impl<const BLOCKS: usize> BitSet<BLOCKS> {
    /// Number of bits in this set.
    pub const WIDTH: usize = BLOCKS * 32;

    /// Creates a set with every bit clear.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            blocks: [0; BLOCKS],
        }
    }

    /// Creates a set with every bit set.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            blocks: [u32::MAX; BLOCKS],
        }
    }

    /// Packs raw blocks.
    #[must_use]
    pub const fn from_blocks(blocks: [u32; BLOCKS]) -> Self {
        Self { blocks }
    }

    /// Packs a block slice, which must have exactly `BLOCKS` entries.
    ///
    /// # Errors
    ///
    /// Returns a bit-set width mismatch if the slice has the wrong length.
    pub fn try_from_slice(blocks: &[u32]) -> Result<Self> {
        let blocks: [u32; BLOCKS] = blocks
            .try_into()
            .map_err(|_| Error::bit_width_mismatch(Self::WIDTH, blocks.len() * 32))?;
        Ok(Self { blocks })
    }

    /// Returns the raw blocks.
    #[must_use]
    pub const fn to_blocks(&self) -> [u32; BLOCKS] {
        self.blocks
    }

    /// Packs a boolean vector of exactly `WIDTH` entries.
    ///
    /// # Errors
    ///
    /// Returns a bit-set width mismatch if `bools.len() != WIDTH`.
    pub fn from_bools(bools: &[bool]) -> Result<Self> {
        if bools.len() != Self::WIDTH {
            return Err(Error::bit_width_mismatch(Self::WIDTH, bools.len()));
        }
        let mut set = Self::new();
        for (i, &on) in bools.iter().enumerate() {
            set.set(i, on);
        }
        Ok(set)
    }

    /// Unpacks into a boolean vector of `WIDTH` entries.
    #[must_use]
    pub fn to_bools(&self) -> Vec<bool> {
        (0..Self::WIDTH).map(|i| self.get(i)).collect()
    }

    /// Builds a set from enabled bit indices.
    ///
    /// # Errors
    ///
    /// Returns a bit-set width mismatch if any index is out of range.
    pub fn from_enabled(indices: impl IntoIterator<Item = usize>) -> Result<Self> {
        let mut set = Self::new();
        for i in indices {
            if i >= Self::WIDTH {
                return Err(Error::bit_width_mismatch(Self::WIDTH, i + 1));
            }
            set.set(i, true);
        }
        Ok(set)
    }

    /// Returns the indices of all set bits in ascending order.
    #[must_use]
    pub fn enabled(&self) -> Vec<usize> {
        (0..Self::WIDTH).filter(|&i| self.get(i)).collect()
    }

    /// Returns bit `i`. Out-of-range indices read as clear.
    #[must_use]
    pub const fn get(&self, i: usize) -> bool {
        if i >= Self::WIDTH {
            return false;
        }
        self.blocks[i / 32] & (1 << (i % 32)) != 0
    }

    /// Sets or clears bit `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= WIDTH`; callers index with known group numbers.
    pub fn set(&mut self, i: usize, on: bool) {
        assert!(i < Self::WIDTH, "bit {i} out of range for {}-bit set", Self::WIDTH);
        let mask = 1u32 << (i % 32);
        if on {
            self.blocks[i / 32] |= mask;
        } else {
            self.blocks[i / 32] &= !mask;
        }
    }

    /// Number of set bits.
    #[must_use]
    pub fn count(&self) -> usize {
        self.blocks.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Returns true if no bit is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|&b| b == 0)
    }
}

impl<const BLOCKS: usize> Default for BitSet<BLOCKS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const BLOCKS: usize> fmt::Debug for BitSet<BLOCKS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitSet{}{:?}", Self::WIDTH, self.enabled())
    }
}
