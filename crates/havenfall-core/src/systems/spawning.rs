//! Ambient food and fish spawning around the fixed hotspots.

use crate::components::{Fish, FoodItem, Position};
use crate::tilemap::{TileKind, TileMap};
use havenfall_logic::constants::WORLD_SIZE;
use hecs::World;
use rand::Rng;

/// Drop a food item at a tile center.
pub fn spawn_food(world: &mut World, tile_x: usize, tile_y: usize, amount: f32) {
    world.spawn((
        Position::new(tile_x as f32 + 0.5, tile_y as f32 + 0.5),
        FoodItem { amount },
    ));
}

/// Per-tick ambient spawning: a couple of low-probability food drops
/// jittered around the hotspots, and the occasional fish on open water.
pub fn ambient_spawn_system(world: &mut World, map: &mut TileMap, rng: &mut impl Rng) {
    let n = WORLD_SIZE as f32;
    let hubs: Vec<(usize, usize)> = map.hotspots().to_vec();

    for _ in 0..2 {
        if rng.gen::<f32>() > 0.35 || hubs.is_empty() {
            continue;
        }
        let (hx, hy) = hubs[rng.gen_range(0..hubs.len())];
        let jx = (hx as f32 + (rng.gen::<f32>() - 0.5) * 1.4).clamp(1.0, n - 2.0);
        let jy = (hy as f32 + (rng.gen::<f32>() - 0.5) * 1.4).clamp(1.0, n - 2.0);
        let tx = jx.floor() as usize;
        let ty = jy.floor() as usize;
        let tile = map.tile(tx, ty);
        if matches!(tile.kind, TileKind::Water | TileKind::Rock | TileKind::Forest) {
            continue;
        }
        let cx = tx as f32 + 0.5;
        let cy = ty as f32 + 0.5;
        let crowded = world
            .query::<(&FoodItem, &Position)>()
            .iter()
            .any(|(_, (_, p))| (p.x() - cx).hypot(p.y() - cy) < 1.6);
        if crowded {
            continue;
        }
        if tile.moisture > 0.45 {
            spawn_food(world, tx, ty, 12.0 + rng.gen::<f32>() * 10.0);
        }
    }

    if rng.gen::<f32>() < 0.12 {
        let tx = rng.gen_range(0..WORLD_SIZE);
        let ty = rng.gen_range(0..WORLD_SIZE);
        if map.tile(tx, ty).kind == TileKind::Water {
            world.spawn((
                Position::new(tx as f32 + 0.5, ty as f32 + 0.5),
                Fish {
                    size: 10.0 + rng.gen::<f32>() * 8.0,
                },
            ));
        }
    }
}
