//! Record families and supported game variants.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bits::BitWidth;

/// Top-level record category in a map container.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Family {
    /// Shared model declarations.
    Model,
    /// Placement instances.
    Part,
    /// Spatial volumes.
    Region,
    /// Triggerable events.
    Event,
}

impl Family {
    /// Order of the family lists in the binary container.
    pub const CONTAINER_ORDER: [Family; 4] =
        [Family::Model, Family::Part, Family::Region, Family::Event];

    /// Order in which node families are built and exported.
    ///
    /// Later families are more likely to reference earlier ones.
    pub const PRIORITY_ORDER: [Family; 3] = [Family::Region, Family::Part, Family::Event];

    /// Returns the lowercase family name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Part => "part",
            Self::Region => "region",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String encoding used for names and text fields.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TextEncoding {
    /// UTF-8 bytes.
    Utf8,
    /// UTF-16 little-endian code units.
    Utf16Le,
}

/// A supported target game.
///
/// The variant decides which subtypes exist, which fields each subtype
/// carries, the width of group bit-sets, and the string encoding.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GameVariant {
    /// Dark Souls (PTDE / Remastered).
    DarkSouls1,
    /// Bloodborne.
    Bloodborne,
    /// Dark Souls III.
    DarkSouls3,
    /// Sekiro: Shadows Die Twice.
    Sekiro,
    /// Elden Ring.
    EldenRing,
}

impl GameVariant {
    /// All supported variants.
    pub const ALL: [GameVariant; 5] = [
        GameVariant::DarkSouls1,
        GameVariant::Bloodborne,
        GameVariant::DarkSouls3,
        GameVariant::Sekiro,
        GameVariant::EldenRing,
    ];

    /// Numeric code written to the container header.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::DarkSouls1 => 1,
            Self::Bloodborne => 2,
            Self::DarkSouls3 => 3,
            Self::Sekiro => 4,
            Self::EldenRing => 5,
        }
    }

    /// Looks up a variant by header code.
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.code() == code)
    }

    /// Encoding of strings in this variant's containers.
    #[must_use]
    pub const fn text_encoding(self) -> TextEncoding {
        match self {
            Self::DarkSouls1 | Self::Bloodborne => TextEncoding::Utf8,
            Self::DarkSouls3 | Self::Sekiro | Self::EldenRing => TextEncoding::Utf16Le,
        }
    }

    /// Width of draw/display/navmesh group bit-sets.
    #[must_use]
    pub const fn group_width(self) -> BitWidth {
        match self {
            Self::DarkSouls1 | Self::Bloodborne => BitWidth::W128,
            Self::DarkSouls3 | Self::Sekiro | Self::EldenRing => BitWidth::W256,
        }
    }

    /// Short identifier used in logs and file paths.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DarkSouls1 => "ds1",
            Self::Bloodborne => "bb",
            Self::DarkSouls3 => "ds3",
            Self::Sekiro => "sdt",
            Self::EldenRing => "er",
        }
    }
}

impl fmt::Display for GameVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
