//! Wild animal wandering, grazing and hunger.

use crate::components::{Animal, Position};
use crate::tilemap::{TileKind, TileMap};
use havenfall_logic::constants::WORLD_SIZE;
use hecs::{Entity, World};
use rand::Rng;

/// Update every living animal. Dead animals are skipped, never removed.
pub fn animal_system(world: &mut World, map: &TileMap, dt: f32, rng: &mut impl Rng) {
    let n = WORLD_SIZE as f32;
    let any_grazing_land = map
        .tiles()
        .iter()
        .any(|t| t.kind == TileKind::Fertile);

    let entities: Vec<Entity> = world
        .query::<(&Animal, &Position)>()
        .iter()
        .map(|(e, _)| e)
        .collect();

    for e in entities {
        let (mut animal, mut pos) = {
            let a = match world.get::<&Animal>(e) {
                Ok(g) => (*g).clone(),
                Err(_) => continue,
            };
            let p = match world.get::<&Position>(e) {
                Ok(g) => *g,
                Err(_) => continue,
            };
            (a, p)
        };
        if !animal.alive {
            continue;
        }

        animal.hunger += dt * 0.5;

        // A hungry animal occasionally heads for grazing land.
        if animal.hunger > 80.0 && rng.gen::<f32>() < 0.02 {
            let kind = if rng.gen::<f32>() > 0.5 {
                TileKind::Fertile
            } else {
                TileKind::Forest
            };
            if let Some((tx, ty)) = map.nearest_of_kind(pos.x(), pos.y(), kind) {
                animal.heading = (ty - pos.y()).atan2(tx - pos.x());
            }
        }

        let step_x = animal.heading.cos() * animal.speed * dt;
        let step_y = animal.heading.sin() * animal.speed * dt;
        match map.tile_at(pos.x() + step_x, pos.y() + step_y) {
            Some(tile) if tile.kind != TileKind::Water => {
                pos = Position::new(pos.x() + step_x, pos.y() + step_y);
            }
            _ => {
                // Water or the world edge: veer off roughly a quarter turn.
                animal.heading +=
                    std::f32::consts::FRAC_PI_2 + (rng.gen::<f32>() - 0.5) * 0.6;
            }
        }
        if pos.x() < 1.0 || pos.y() < 1.0 || pos.x() > n - 1.0 || pos.y() > n - 1.0 {
            animal.heading += std::f32::consts::FRAC_PI_2;
        }

        if any_grazing_land && rng.gen::<f32>() < 0.3 {
            animal.hunger = (animal.hunger - dt * 8.0).max(0.0);
        }

        if let Ok(mut slot) = world.get::<&mut Animal>(e) {
            *slot = animal;
        }
        if let Ok(mut slot) = world.get::<&mut Position>(e) {
            *slot = pos;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::AnimalKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grass_map() -> TileMap {
        let mut map = TileMap::generate(&mut StdRng::seed_from_u64(21));
        for y in 0..TileMap::SIZE {
            for x in 0..TileMap::SIZE {
                map.tile_mut(x, y).kind = TileKind::Grass;
            }
        }
        map
    }

    fn deer(heading: f32) -> Animal {
        Animal {
            kind: AnimalKind::Deer,
            heading,
            speed: 1.0,
            hunger: 0.0,
            alive: true,
        }
    }

    #[test]
    fn test_animal_wanders_and_hungers() {
        let map = grass_map();
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(1);
        let e = world.spawn((Position::new(20.0, 20.0), deer(0.0)));

        animal_system(&mut world, &map, 0.5, &mut rng);

        let pos = world.get::<&Position>(e).unwrap();
        assert!((pos.x() - 20.5).abs() < 0.001, "stepped along heading");
        assert!(world.get::<&Animal>(e).unwrap().hunger > 0.0);
    }

    #[test]
    fn test_animal_turns_at_water() {
        let mut map = grass_map();
        for y in 0..TileMap::SIZE {
            map.tile_mut(21, y).kind = TileKind::Water;
        }
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(2);
        let e = world.spawn((Position::new(20.9, 20.0), deer(0.0)));

        animal_system(&mut world, &map, 0.5, &mut rng);

        let pos = world.get::<&Position>(e).unwrap();
        assert!((pos.x() - 20.9).abs() < 0.001, "did not step into water");
        let heading = world.get::<&Animal>(e).unwrap().heading;
        assert!(heading.abs() > 0.5, "heading changed, got {heading}");
    }

    #[test]
    fn test_dead_animal_is_skipped() {
        let map = grass_map();
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(3);
        let mut carcass = deer(0.0);
        carcass.alive = false;
        let e = world.spawn((Position::new(20.0, 20.0), carcass));

        animal_system(&mut world, &map, 1.0, &mut rng);

        // Retained in the collection, but untouched.
        let a = world.get::<&Animal>(e).unwrap();
        assert!(!a.alive);
        assert_eq!(a.hunger, 0.0);
        let pos = world.get::<&Position>(e).unwrap();
        assert_eq!(pos.x(), 20.0);
    }
}
