//! Built-in descriptor tables.
//!
//! Each descriptor is composed as family base fields, then fields every
//! subtype of the family gains in a given variant, then subtype fields.

use mapstudio_foundation::{Family, FieldType, GameVariant, Result};

use crate::adapter::{Conversion, FieldAdapter, RefTarget};
use crate::descriptor::{CycleSpec, Derivation, EntityDescriptor};
use crate::registry::SubtypeRegistry;
use crate::subtype::{EventSubtype, ModelSubtype, PartSubtype, RegionSubtype};

use FieldType::{Bool, I8, I16, I32, F32, String as Text, U8, U32};

const REGION_PART_CYCLE: CycleSpec = CycleSpec {
    forward_family: Family::Region,
    forward_field: "attached_part",
    inverse_family: Family::Part,
    inverse_field: "linked_region",
};

pub(crate) fn register_all(registry: &mut SubtypeRegistry) -> Result<()> {
    for variant in GameVariant::ALL {
        for &subtype in model_subtypes(variant) {
            registry.register(model(variant, subtype))?;
        }
        for &subtype in part_subtypes(variant) {
            registry.register(part(variant, subtype))?;
        }
        for &subtype in RegionSubtype::ALL {
            registry.register(region(variant, subtype))?;
        }
        for &subtype in event_subtypes(variant) {
            registry.register(event(variant, subtype))?;
        }
        if !legacy(variant) {
            registry.declare_cycle(variant, REGION_PART_CYCLE);
        }
    }
    Ok(())
}

/// Dark Souls and Bloodborne share the older layout.
const fn legacy(variant: GameVariant) -> bool {
    matches!(variant, GameVariant::DarkSouls1 | GameVariant::Bloodborne)
}

fn model_subtypes(variant: GameVariant) -> &'static [ModelSubtype] {
    use ModelSubtype as M;
    match variant {
        GameVariant::EldenRing => &[M::MapPiece, M::Asset, M::Character, M::Player, M::Collision],
        _ => &[
            M::MapPiece,
            M::Object,
            M::Character,
            M::Player,
            M::Collision,
            M::Navmesh,
        ],
    }
}

fn part_subtypes(variant: GameVariant) -> &'static [PartSubtype] {
    use PartSubtype as P;
    match variant {
        GameVariant::EldenRing => &[
            P::MapPiece,
            P::Asset,
            P::Character,
            P::PlayerStart,
            P::Collision,
            P::ConnectCollision,
            P::DummyCharacter,
        ],
        _ => &[
            P::MapPiece,
            P::Object,
            P::Character,
            P::PlayerStart,
            P::Collision,
            P::Navmesh,
            P::ConnectCollision,
            P::DummyObject,
            P::DummyCharacter,
        ],
    }
}

fn event_subtypes(variant: GameVariant) -> &'static [EventSubtype] {
    use EventSubtype as E;
    match variant {
        GameVariant::EldenRing => &[
            E::Sound,
            E::Sfx,
            E::Treasure,
            E::Spawner,
            E::Message,
            E::ObjAct,
            E::MapOffset,
            E::PatrolRoute,
        ],
        v if legacy(v) => &[
            E::Light,
            E::Sound,
            E::Sfx,
            E::Treasure,
            E::Spawner,
            E::Message,
            E::ObjAct,
            E::SpawnPoint,
            E::MapOffset,
            E::Navigation,
            E::Environment,
        ],
        _ => E::ALL,
    }
}

fn model(variant: GameVariant, subtype: ModelSubtype) -> EntityDescriptor {
    EntityDescriptor::new(variant, subtype)
        .with_field(FieldAdapter::plain("sib_path", Text))
        .with_field(FieldAdapter::plain("instance_count", I32))
        .with_derived("sib_path", Derivation::SibPath)
        .with_derived("instance_count", Derivation::InstanceCount)
}

fn part(variant: GameVariant, subtype: PartSubtype) -> EntityDescriptor {
    let groups = variant.group_width();
    let desc = EntityDescriptor::new(variant, subtype)
        .with_field(FieldAdapter::reference(
            "model",
            RefTarget::only(subtype.model_subtype()),
        ))
        .with_field(FieldAdapter::position("translate"))
        .with_field(FieldAdapter::rotation("rotate"))
        .with_field(FieldAdapter::position("scale"))
        .with_field(FieldAdapter::plain("entity_id", I32))
        .with_field(FieldAdapter::bits("draw_groups", groups))
        .with_field(FieldAdapter::bits("display_groups", groups))
        .with_fields(part_extras(variant));

    let draw_parent = || FieldAdapter::reference("draw_parent", RefTarget::only(PartSubtype::Collision));

    match subtype {
        PartSubtype::MapPiece | PartSubtype::PlayerStart => desc,
        PartSubtype::Object | PartSubtype::Asset | PartSubtype::DummyObject => {
            let desc = desc
                .with_field(draw_parent())
                .with_field(FieldAdapter::plain("break_term", I8))
                .with_field(FieldAdapter::plain("net_sync_type", I8));
            let desc = if subtype == PartSubtype::Asset {
                desc.with_field(FieldAdapter::plain("asset_sfx_id", I32))
            } else {
                desc
            };
            desc.with_parent("draw_parent")
        }
        PartSubtype::Character | PartSubtype::DummyCharacter => {
            let desc = desc
                .with_field(FieldAdapter::plain("think_param_id", I32))
                .with_field(FieldAdapter::plain("npc_param_id", I32))
                .with_field(FieldAdapter::plain("talk_id", I32))
                .with_field(FieldAdapter::plain("chara_init_id", I32))
                .with_field(draw_parent());
            let patrol = if legacy(variant) {
                FieldAdapter::references("patrol_regions", RefTarget::any(Family::Region), 8)
            } else {
                FieldAdapter::reference("patrol_route", RefTarget::only(EventSubtype::PatrolRoute))
            };
            desc.with_field(patrol).with_parent("draw_parent")
        }
        PartSubtype::Collision => {
            let desc = desc
                .with_field(FieldAdapter::plain("hit_filter", U8))
                .with_field(FieldAdapter::plain("sound_space_type", U8))
                .with_field(FieldAdapter::plain("play_region_id", I32))
                .with_field(FieldAdapter::plain("stable_footing_flag", I32))
                .with_exclusive("play_region_id", "stable_footing_flag");
            if legacy(variant) {
                desc.with_field(FieldAdapter::bits("navmesh_groups", groups))
            } else {
                desc.with_field(FieldAdapter::reference(
                    REGION_PART_CYCLE.inverse_field,
                    RefTarget::any(Family::Region),
                ))
            }
        }
        PartSubtype::Navmesh => desc.with_field(FieldAdapter::bits("navmesh_groups", groups)),
        PartSubtype::ConnectCollision => desc
            .with_field(FieldAdapter::reference(
                "collision",
                RefTarget::only(PartSubtype::Collision),
            ))
            .with_field(FieldAdapter::plain("connected_map_id", I32))
            .with_parent("collision"),
    }
}

fn part_extras(variant: GameVariant) -> Vec<FieldAdapter> {
    match variant {
        GameVariant::DarkSouls1 => vec![
            FieldAdapter::plain("light_id", U8),
            FieldAdapter::plain("fog_id", U8),
        ],
        GameVariant::Bloodborne => vec![
            FieldAdapter::plain("light_id", U8),
            FieldAdapter::plain("fog_id", U8),
            FieldAdapter::plain("is_shadow_src", Bool),
        ],
        GameVariant::DarkSouls3 | GameVariant::Sekiro => vec![
            FieldAdapter::plain("lantern_id", I32),
            FieldAdapter::plain("lod_id", I8),
            FieldAdapter::plain("is_shadow_src", Bool),
            FieldAdapter::plain("is_shadow_dest", Bool),
        ],
        GameVariant::EldenRing => vec![
            FieldAdapter::plain("is_shadow_src", Bool),
            FieldAdapter::plain("is_shadow_dest", Bool),
            FieldAdapter::plain("lod_id", I8),
        ],
    }
}

fn region(variant: GameVariant, subtype: RegionSubtype) -> EntityDescriptor {
    let mut desc = EntityDescriptor::new(variant, subtype)
        .with_field(FieldAdapter::position("translate"))
        .with_field(FieldAdapter::rotation("rotate"))
        .with_field(FieldAdapter::plain("entity_id", I32));
    if !legacy(variant) {
        desc = desc
            .with_field(FieldAdapter::reference(
                REGION_PART_CYCLE.forward_field,
                RefTarget::only(PartSubtype::Collision),
            ))
            .with_parent(REGION_PART_CYCLE.forward_field);
    }

    let shape: &[&'static str] = match subtype {
        RegionSubtype::Point => &[],
        RegionSubtype::Circle | RegionSubtype::Sphere => &["radius"],
        RegionSubtype::Cylinder => &["radius", "height"],
        RegionSubtype::Rect => &["width", "depth"],
        RegionSubtype::Box => &["width", "depth", "height"],
    };
    desc.with_fields(shape.iter().map(|&name| FieldAdapter::plain(name, F32)))
}

fn event(variant: GameVariant, subtype: EventSubtype) -> EntityDescriptor {
    let desc = EntityDescriptor::new(variant, subtype)
        .with_field(FieldAdapter::plain("entity_id", I32))
        .with_field(FieldAdapter::reference(
            "attached_part",
            RefTarget::any(Family::Part),
        ))
        .with_field(FieldAdapter::reference(
            "attached_region",
            RefTarget::any(Family::Region),
        ))
        .with_parent("attached_region");

    let region = |name| FieldAdapter::reference(name, RefTarget::any(Family::Region));

    match subtype {
        EventSubtype::Light => desc.with_field(FieldAdapter::plain("point_light_id", I32)),
        EventSubtype::Sound => {
            let desc = desc
                .with_field(FieldAdapter::plain("sound_type", I32))
                .with_field(FieldAdapter::plain("sound_id", I32));
            if legacy(variant) {
                desc
            } else {
                desc.with_field(FieldAdapter::references(
                    "child_regions",
                    RefTarget::any(Family::Region),
                    16,
                ))
            }
        }
        EventSubtype::Sfx => {
            let desc = desc.with_field(FieldAdapter::plain("sfx_id", I32));
            if legacy(variant) {
                desc
            } else {
                desc.with_field(FieldAdapter::plain("starts_disabled", Bool))
            }
        }
        EventSubtype::Treasure => {
            let desc = desc
                .with_field(FieldAdapter::reference(
                    "treasure_part",
                    RefTarget::any(Family::Part),
                ))
                .with_field(FieldAdapter::plain("item_lot_1", I32))
                .with_field(FieldAdapter::plain("item_lot_2", I32))
                .with_field(FieldAdapter::plain("item_lot_3", I32))
                .with_field(FieldAdapter::plain("is_in_chest", Bool));
            if legacy(variant) {
                desc
            } else {
                desc.with_field(FieldAdapter::plain("starts_disabled", Bool))
            }
        }
        EventSubtype::Spawner => {
            let (regions, parts) = if legacy(variant) { (4, 16) } else { (8, 32) };
            desc.with_field(FieldAdapter::plain("max_count", I16))
                .with_field(FieldAdapter::plain("initial_spawn_count", I16))
                .with_field(FieldAdapter::references(
                    "spawn_regions",
                    RefTarget::any(Family::Region),
                    regions,
                ))
                .with_field(FieldAdapter::references(
                    "spawn_parts",
                    RefTarget::only(PartSubtype::Character),
                    parts,
                ))
        }
        EventSubtype::Message => desc
            .with_field(FieldAdapter::plain("text_id", I16))
            .with_field(FieldAdapter::plain("is_hidden", Bool)),
        EventSubtype::ObjAct => {
            let target = if variant == GameVariant::EldenRing {
                PartSubtype::Asset
            } else {
                PartSubtype::Object
            };
            desc.with_field(FieldAdapter::reference(
                "obj_act_part",
                RefTarget::only(target),
            ))
            .with_field(FieldAdapter::plain("obj_act_param_id", I32))
            .with_field(FieldAdapter::plain("obj_act_flag", U32))
        }
        EventSubtype::SpawnPoint => desc.with_field(region("spawn_region")),
        EventSubtype::MapOffset => desc
            .with_field(FieldAdapter::position("translate"))
            .with_field(FieldAdapter::direct("rotate_y", F32, Conversion::Degrees)),
        EventSubtype::Navigation => desc.with_field(region("navigation_region")),
        EventSubtype::Environment => desc
            .with_field(FieldAdapter::plain("gi_scale", F32))
            .with_field(FieldAdapter::plain("cubemap_id", I32)),
        EventSubtype::PatrolRoute => desc
            .with_field(FieldAdapter::plain("patrol_type", I32))
            .with_field(FieldAdapter::references(
                "patrol_regions",
                RefTarget::any(Family::Region),
                32,
            )),
    }
}
