//! Closed subtype enums per record family.
//!
//! Subtype tags are strings in the container. They are converted to a
//! [`Subtype`] once, at decode time; everything downstream matches on the
//! enum.

use std::fmt;

use mapstudio_foundation::Family;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! subtype_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $tag:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every subtype in canonical container order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The tag written to the container.
            #[must_use]
            pub const fn tag(self) -> &'static str {
                match self {
                    $($name::$variant => $tag),+
                }
            }

            /// Parses a container tag.
            #[must_use]
            pub fn from_tag(tag: &str) -> Option<Self> {
                match tag {
                    $($tag => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.tag())
            }
        }
    };
}

subtype_enum! {
    /// Kinds of shared model.
    ModelSubtype {
        /// Static level geometry.
        MapPiece => "MapPiece",
        /// Interactive object (pre-Elden Ring).
        Object => "Object",
        /// Interactive asset (Elden Ring).
        Asset => "Asset",
        /// Character model.
        Character => "Character",
        /// Player model.
        Player => "Player",
        /// Collision mesh.
        Collision => "Collision",
        /// Navigation mesh.
        Navmesh => "Navmesh",
    }
}

subtype_enum! {
    /// Kinds of placement instance.
    PartSubtype {
        /// Placed static geometry.
        MapPiece => "MapPiece",
        /// Placed object.
        Object => "Object",
        /// Placed asset.
        Asset => "Asset",
        /// Placed character.
        Character => "Character",
        /// Player start position.
        PlayerStart => "PlayerStart",
        /// Collision instance.
        Collision => "Collision",
        /// Navmesh instance.
        Navmesh => "Navmesh",
        /// Link to another map's collision.
        ConnectCollision => "ConnectCollision",
        /// Non-interactive object.
        DummyObject => "DummyObject",
        /// Non-interactive character.
        DummyCharacter => "DummyCharacter",
    }
}

subtype_enum! {
    /// Kinds of spatial volume, by shape.
    RegionSubtype {
        /// Single point.
        Point => "Point",
        /// Flat circle.
        Circle => "Circle",
        /// Sphere.
        Sphere => "Sphere",
        /// Vertical cylinder.
        Cylinder => "Cylinder",
        /// Flat rectangle.
        Rect => "Rect",
        /// Box.
        Box => "Box",
    }
}

subtype_enum! {
    /// Kinds of triggerable event.
    EventSubtype {
        /// Point light.
        Light => "Light",
        /// Sound emitter.
        Sound => "Sound",
        /// Visual effect.
        Sfx => "Sfx",
        /// Item pickup.
        Treasure => "Treasure",
        /// Enemy spawner.
        Spawner => "Spawner",
        /// Ground message.
        Message => "Message",
        /// Object action (doors, levers).
        ObjAct => "ObjAct",
        /// Spawn point.
        SpawnPoint => "SpawnPoint",
        /// Map origin offset.
        MapOffset => "MapOffset",
        /// Navmesh navigation hint.
        Navigation => "Navigation",
        /// Environment lighting probe.
        Environment => "Environment",
        /// Patrol route through regions.
        PatrolRoute => "PatrolRoute",
    }
}

impl ModelSubtype {
    /// Infers a model subtype from FromSoftware's name prefix convention.
    ///
    /// `c0000` is the player; other `c` names are characters. `AEG` is an
    /// Elden Ring asset.
    #[must_use]
    pub fn infer_from_name(name: &str) -> Option<Self> {
        if name.starts_with("AEG") {
            return Some(Self::Asset);
        }
        if name.starts_with("c0000") {
            return Some(Self::Player);
        }
        match name.chars().next()? {
            'm' => Some(Self::MapPiece),
            'o' => Some(Self::Object),
            'c' => Some(Self::Character),
            'h' => Some(Self::Collision),
            'n' => Some(Self::Navmesh),
            _ => None,
        }
    }
}

impl PartSubtype {
    /// Model subtype that instances of this part subtype must reference.
    #[must_use]
    pub const fn model_subtype(self) -> ModelSubtype {
        match self {
            Self::MapPiece => ModelSubtype::MapPiece,
            Self::Object | Self::DummyObject => ModelSubtype::Object,
            Self::Asset => ModelSubtype::Asset,
            Self::Character | Self::DummyCharacter => ModelSubtype::Character,
            Self::PlayerStart => ModelSubtype::Player,
            Self::Collision | Self::ConnectCollision => ModelSubtype::Collision,
            Self::Navmesh => ModelSubtype::Navmesh,
        }
    }
}

/// A subtype of any family.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Subtype {
    /// Model subtype.
    Model(ModelSubtype),
    /// Part subtype.
    Part(PartSubtype),
    /// Region subtype.
    Region(RegionSubtype),
    /// Event subtype.
    Event(EventSubtype),
}

impl Subtype {
    /// Family this subtype belongs to.
    #[must_use]
    pub const fn family(self) -> Family {
        match self {
            Self::Model(_) => Family::Model,
            Self::Part(_) => Family::Part,
            Self::Region(_) => Family::Region,
            Self::Event(_) => Family::Event,
        }
    }

    /// The tag written to the container.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Model(s) => s.tag(),
            Self::Part(s) => s.tag(),
            Self::Region(s) => s.tag(),
            Self::Event(s) => s.tag(),
        }
    }

    /// Parses a container tag within a family.
    #[must_use]
    pub fn from_tag(family: Family, tag: &str) -> Option<Self> {
        match family {
            Family::Model => ModelSubtype::from_tag(tag).map(Self::Model),
            Family::Part => PartSubtype::from_tag(tag).map(Self::Part),
            Family::Region => RegionSubtype::from_tag(tag).map(Self::Region),
            Family::Event => EventSubtype::from_tag(tag).map(Self::Event),
        }
    }

    /// Subtype used when a placeholder must be synthesized for a reference
    /// that does not filter on subtype.
    ///
    /// Every variant supports these subtypes.
    #[must_use]
    pub const fn placeholder_default(family: Family) -> Self {
        match family {
            Family::Model => Self::Model(ModelSubtype::MapPiece),
            Family::Part => Self::Part(PartSubtype::MapPiece),
            Family::Region => Self::Region(RegionSubtype::Point),
            Family::Event => Self::Event(EventSubtype::MapOffset),
        }
    }

    /// Returns the model subtype, if this is one.
    #[must_use]
    pub const fn as_model(self) -> Option<ModelSubtype> {
        match self {
            Self::Model(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the part subtype, if this is one.
    #[must_use]
    pub const fn as_part(self) -> Option<PartSubtype> {
        match self {
            Self::Part(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.family(), self.tag())
    }
}

impl From<ModelSubtype> for Subtype {
    fn from(s: ModelSubtype) -> Self {
        Self::Model(s)
    }
}

impl From<PartSubtype> for Subtype {
    fn from(s: PartSubtype) -> Self {
        Self::Part(s)
    }
}

impl From<RegionSubtype> for Subtype {
    fn from(s: RegionSubtype) -> Self {
        Self::Region(s)
    }
}

impl From<EventSubtype> for Subtype {
    fn from(s: EventSubtype) -> Self {
        Self::Event(s)
    }
}
