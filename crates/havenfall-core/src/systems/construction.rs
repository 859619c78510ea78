//! Construction site placement and building queries.

use crate::components::{Building, Position, Vec2};
use crate::tilemap::{TileKind, TileMap};
use havenfall_logic::buildings::{BuildingLevel, SITE_CLEARANCE};
use havenfall_logic::constants::WORLD_SIZE;
use hecs::{Entity, World};
use rand::Rng;

/// A legal site is a non-water, non-rock tile with clearance from every
/// existing building.
pub fn can_build_at(world: &World, map: &TileMap, x: f32, y: f32) -> bool {
    match map.tile_at(x, y) {
        Some(tile) if !matches!(tile.kind, TileKind::Water | TileKind::Rock) => {}
        _ => return false,
    }
    !world
        .query::<(&Building, &Position)>()
        .iter()
        .any(|(_, (_, pos))| (pos.x() - x).hypot(pos.y() - y) < SITE_CLEARANCE)
}

/// Probe a handful of spots around the home anchor for a legal site.
pub fn find_build_spot(
    world: &World,
    map: &TileMap,
    home: Vec2,
    rng: &mut impl Rng,
) -> Option<Vec2> {
    let n = WORLD_SIZE as f32;
    for _ in 0..6 {
        let rx = (home.x + (rng.gen::<f32>() - 0.5) * 8.0).clamp(1.0, n - 1.0);
        let ry = (home.y + (rng.gen::<f32>() - 0.5) * 8.0).clamp(1.0, n - 1.0);
        if can_build_at(world, map, rx, ry) {
            return Some(Vec2::new(rx, ry));
        }
    }
    None
}

pub fn building_count(world: &World) -> usize {
    world.query::<&Building>().iter().count()
}

pub fn has_city_hall(world: &World) -> bool {
    world
        .query::<&Building>()
        .iter()
        .any(|(_, b)| b.level == BuildingLevel::CityHall)
}

/// First completed building one tier below `desired`, if any.
pub fn find_upgrade_target(world: &World, desired: BuildingLevel) -> Option<Entity> {
    let source = desired.upgrade_source()?;
    world
        .query::<&Building>()
        .iter()
        .find(|(_, b)| !b.under_construction && b.level == source)
        .map(|(e, _)| e)
}

/// Position of the nearest completed building within `range`, if any.
pub fn completed_building_near(world: &World, x: f32, y: f32, range: f32) -> Option<(Entity, Vec2)> {
    world
        .query::<(&Building, &Position)>()
        .iter()
        .filter(|(_, (b, _))| !b.under_construction)
        .map(|(e, (_, pos))| (e, pos.0, (pos.x() - x).hypot(pos.y() - y)))
        .filter(|&(_, _, d)| d < range)
        .min_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(e, pos, _)| (e, pos))
}

/// Any completed building at all (night shelter fallback).
pub fn any_completed_building(world: &World) -> Option<(Entity, Vec2)> {
    world
        .query::<(&Building, &Position)>()
        .iter()
        .filter(|(_, (b, _))| !b.under_construction)
        .min_by_key(|(e, _)| e.id())
        .map(|(e, (_, pos))| (e, pos.0))
}
