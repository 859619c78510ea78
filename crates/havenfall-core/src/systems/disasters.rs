//! Disaster/effect engine — each effect registers a timed visual marker
//! and applies one mutation pass over agents, buildings and tiles.
//!
//! Entity checks are strictly radius-exclusive (`distance < r`); tile
//! passes sweep the bounding square of the radius. Victim scans collect
//! first and remove after, so removal never disturbs the pass itself.

use crate::components::*;
use crate::generation::spawn_human;
use crate::log::{DeathLog, EventLog};
use crate::systems::progression::{Progression, ProphetCall};
use crate::systems::spawning::spawn_food;
use crate::tilemap::{TileKind, TileMap};
use havenfall_logic::constants::{CAMPFIRE_FUEL, GRAVE_LIFE, WORLD_SIZE};
use havenfall_logic::needs::DeathCause;
use hecs::{Entity, World};
use rand::Rng;

fn push_marker(world: &mut World, kind: EffectKind, x: f32, y: f32, radius: f32, life: f32) {
    world.spawn((
        Position::new(x, y),
        EffectMarker { kind, radius, life },
    ));
}

/// Visit every tile in the bounding square of (cx, cy) ± r.
fn for_tiles_in_square(
    map: &mut TileMap,
    cx: f32,
    cy: f32,
    r: f32,
    mut f: impl FnMut(&mut crate::tilemap::Tile, usize, usize),
) {
    let lo_x = (cx - r).floor() as i64;
    let hi_x = (cx + r).ceil() as i64;
    let lo_y = (cy - r).floor() as i64;
    let hi_y = (cy + r).ceil() as i64;
    for ty in lo_y..=hi_y {
        for tx in lo_x..=hi_x {
            if tx < 0 || ty < 0 || tx >= WORLD_SIZE as i64 || ty >= WORLD_SIZE as i64 {
                continue;
            }
            let (ux, uy) = (tx as usize, ty as usize);
            f(map.tile_mut(ux, uy), ux, uy);
        }
    }
}

fn humans_within(world: &World, x: f32, y: f32, r: f32) -> Vec<Entity> {
    world
        .query::<(&Human, &Position)>()
        .iter()
        .filter(|(_, (_, p))| (p.x() - x).hypot(p.y() - y) < r)
        .map(|(e, _)| e)
        .collect()
}

fn buildings_within(world: &World, x: f32, y: f32, r: f32) -> Vec<Entity> {
    world
        .query::<(&Building, &Position)>()
        .iter()
        .filter(|(_, (_, p))| (p.x() - x).hypot(p.y() - y) < r)
        .map(|(e, _)| e)
        .collect()
}

pub fn apply_rain(
    world: &mut World,
    map: &mut TileMap,
    events: &mut EventLog,
    rng: &mut impl Rng,
    x: f32,
    y: f32,
) {
    let r = 2.5;
    push_marker(world, EffectKind::Rain, x, y, r, 2.4);
    let mut food_spots: Vec<(usize, usize)> = Vec::new();
    for_tiles_in_square(map, x, y, r, |tile, tx, ty| {
        tile.add_moisture(0.35);
        if tile.kind == TileKind::Forest && rng.gen::<f32>() < 0.3 {
            tile.resource = (tile.resource + 1.0).min(6.0);
        }
        if tile.kind == TileKind::Grass && tile.moisture > 0.75 && rng.gen::<f32>() < 0.3 {
            tile.kind = TileKind::Fertile;
        }
        if matches!(tile.kind, TileKind::Grass | TileKind::Fertile) && rng.gen::<f32>() < 0.5 {
            food_spots.push((tx, ty));
        }
    });
    for (tx, ty) in food_spots {
        spawn_food(world, tx, ty, 15.0);
    }
    events.push("Rain falls across the land.");
}

pub fn apply_snow(
    world: &mut World,
    map: &mut TileMap,
    events: &mut EventLog,
    rng: &mut impl Rng,
    x: f32,
    y: f32,
) {
    let r = 2.5;
    push_marker(world, EffectKind::Snow, x, y, r, 2.8);
    for_tiles_in_square(map, x, y, r, |tile, _, _| {
        tile.add_moisture(0.25);
        if tile.kind == TileKind::Grass && rng.gen::<f32>() < 0.2 {
            tile.kind = TileKind::Fertile;
        }
    });
    events.push("Snow blankets the ground.");
}

pub fn apply_quake(
    world: &mut World,
    map: &mut TileMap,
    events: &mut EventLog,
    rng: &mut impl Rng,
    x: f32,
    y: f32,
) {
    let r = 2.8;
    push_marker(world, EffectKind::Quake, x, y, r, 1.9);
    let severity = 0.5 + rng.gen::<f32>() * 0.8;

    for e in humans_within(world, x, y, r) {
        if rng.gen::<f32>() < 0.45 + severity * 0.25 {
            let _ = world.despawn(e);
        }
    }

    for e in buildings_within(world, x, y, r) {
        let mut collapsed = false;
        if let Ok(mut b) = world.get::<&mut Building>(e) {
            b.health -= 0.4 + severity * 0.4;
            if b.level == havenfall_logic::buildings::BuildingLevel::Hut {
                b.health -= 0.2;
            }
            collapsed = b.health <= 0.0;
        }
        if collapsed {
            let _ = world.despawn(e);
        }
    }

    for_tiles_in_square(map, x, y, r, |tile, _, _| {
        if rng.gen::<f32>() > 0.55 + severity * 0.2 {
            return;
        }
        if tile.kind == TileKind::Forest {
            tile.kind = TileKind::Grass;
        }
        if tile.kind == TileKind::Fertile && rng.gen::<f32>() < 0.6 {
            tile.kind = TileKind::Rock;
        }
        if tile.kind == TileKind::Grass && rng.gen::<f32>() < 0.2 {
            tile.kind = TileKind::Water;
            tile.resource = 0.0;
            tile.moisture = 1.0;
        }
    });
    events.push("The earth shakes violently.");
}

pub fn apply_fire(
    world: &mut World,
    map: &mut TileMap,
    events: &mut EventLog,
    rng: &mut impl Rng,
    x: f32,
    y: f32,
) {
    let r = 2.0;
    push_marker(world, EffectKind::Fire, x, y, r, 1.2);
    for e in humans_within(world, x, y, r) {
        if rng.gen::<f32>() < 0.45 {
            let _ = world.despawn(e);
        }
    }
    for_tiles_in_square(map, x, y, r, |tile, _, _| {
        if matches!(tile.kind, TileKind::Forest | TileKind::Fertile) {
            tile.kind = TileKind::Grass;
        }
    });
    events.push("Lightning strikes; fire scours the land.");
}

pub fn apply_bless(
    world: &mut World,
    map: &mut TileMap,
    events: &mut EventLog,
    rng: &mut impl Rng,
    x: f32,
    y: f32,
) {
    let r = 2.3;
    push_marker(world, EffectKind::Bless, x, y, r, 1.6);
    for e in humans_within(world, x, y, r) {
        if let Ok(mut h) = world.get::<&mut Human>(e) {
            h.hunger = (h.hunger - 25.0).max(0.0);
            h.wood += 1.0;
            h.stone += 0.5;
        }
    }
    let mut food_spots: Vec<(usize, usize)> = Vec::new();
    for_tiles_in_square(map, x, y, r, |tile, tx, ty| {
        tile.add_moisture(0.2);
        if tile.kind == TileKind::Grass && rng.gen::<f32>() < 0.4 {
            tile.kind = TileKind::Fertile;
        }
        if rng.gen::<f32>() < 0.35 {
            food_spots.push((tx, ty));
        }
    });
    for (tx, ty) in food_spots {
        spawn_food(world, tx, ty, 22.0);
    }
    events.push("A blessing settles over the fields.");
}

pub fn apply_typhoon(
    world: &mut World,
    map: &mut TileMap,
    events: &mut EventLog,
    rng: &mut impl Rng,
    x: f32,
    y: f32,
) {
    let r = 3.0;
    push_marker(world, EffectKind::Typhoon, x, y, r, 2.0);
    for e in humans_within(world, x, y, r) {
        if rng.gen::<f32>() < 0.25 {
            let _ = world.despawn(e);
        }
    }
    for e in buildings_within(world, x, y, r) {
        if rng.gen::<f32>() < 0.35 {
            let _ = world.despawn(e);
        }
    }
    for_tiles_in_square(map, x, y, r, |tile, _, _| {
        tile.add_moisture(0.5);
        if tile.kind == TileKind::Forest && rng.gen::<f32>() < 0.2 {
            tile.kind = TileKind::Grass;
        }
    });
    events.push("A typhoon tears through; structures are damaged.");
}

/// Campfires are the one gated effect: they need the fire tech and a
/// tile that can hold an open flame, and are rejected with a log line
/// otherwise (no state change).
pub fn apply_campfire(
    world: &mut World,
    map: &TileMap,
    prog: &Progression,
    events: &mut EventLog,
    x: f32,
    y: f32,
) {
    if !prog.tech.fire {
        events.push("Fire has not been discovered yet.");
        return;
    }
    match map.tile_at(x, y) {
        Some(tile) if !matches!(tile.kind, TileKind::Water | TileKind::Rock) => {}
        _ => {
            events.push("A fire cannot be lit here.");
            return;
        }
    }
    world.spawn((
        Position::new(x, y),
        Campfire {
            fuel: CAMPFIRE_FUEL,
        },
    ));
    push_marker(world, EffectKind::Fire, x, y, 1.6, 1.2);
    events.push("A campfire is lit.");
}

pub fn apply_plague(
    world: &mut World,
    events: &mut EventLog,
    deaths: &mut DeathLog,
    rng: &mut impl Rng,
    x: f32,
    y: f32,
) {
    let r = 2.5;
    push_marker(world, EffectKind::Plague, x, y, r, 2.2);
    let mut killed = 0;
    let mut sickened = 0;
    for e in humans_within(world, x, y, r) {
        if rng.gen::<f32>() < 0.25 {
            let (pos, age) = match (world.get::<&Position>(e), world.get::<&Human>(e)) {
                (Ok(p), Ok(h)) => (*p, h.age),
                _ => continue,
            };
            let _ = world.despawn(e);
            world.spawn((pos, Grave { life: GRAVE_LIFE }));
            deaths.record(DeathCause::Plague, age);
            killed += 1;
        } else if let Ok(mut h) = world.get::<&mut Human>(e) {
            h.sick = true;
            sickened += 1;
        }
    }
    events.push(format!(
        "A deadly plague spreads: {killed} dead, {sickened} fell ill."
    ));
}

/// Summon (or reposition) the herald and set the global call that draws
/// every agent toward it.
pub fn apply_prophet(
    world: &mut World,
    prog: &mut Progression,
    events: &mut EventLog,
    rng: &mut impl Rng,
    x: f32,
    y: f32,
) {
    let r = 2.8;
    push_marker(world, EffectKind::Prophet, x, y, r, 2.4);
    prog.add_faith(8.0);
    let n = WORLD_SIZE as f32;

    let existing = world
        .query::<&Human>()
        .iter()
        .find(|(_, h)| h.role == Some(Role::SummonedProphet))
        .map(|(e, _)| e);
    let herald = match existing {
        Some(e) => {
            if let Ok(mut p) = world.get::<&mut Position>(e) {
                *p = Position::new(x, y);
            }
            if let Ok(mut h) = world.get::<&mut Human>(e) {
                h.home = Vec2::new(x.clamp(1.0, n - 1.0), y.clamp(1.0, n - 1.0));
                h.hunger = 0.0;
                h.thirst = 0.0;
            }
            e
        }
        None => {
            let gender = if rng.gen::<f32>() > 0.5 {
                Gender::Male
            } else {
                Gender::Female
            };
            let e = spawn_human(world, x, y, gender, prog.generation_tech(), rng);
            if let Ok(mut h) = world.get::<&mut Human>(e) {
                h.profession = Some(Profession::Prophet);
                h.role = Some(Role::SummonedProphet);
                h.home = Vec2::new(x.clamp(1.0, n - 1.0), y.clamp(1.0, n - 1.0));
                h.hunger = 0.0;
                h.thirst = 0.0;
            }
            e
        }
    };
    prog.call = Some(ProphetCall::new(herald, Vec2::new(x, y)));

    // Everyone else drops what they are doing and converges.
    let others: Vec<Entity> = world
        .query::<&Human>()
        .iter()
        .filter(|(e, _)| *e != herald)
        .map(|(e, _)| e)
        .collect();
    for e in &others {
        let _ = world.remove_one::<BuildTask>(*e);
        if let Ok(mut state) = world.get::<&mut AgentState>(*e) {
            if !matches!(*state, AgentState::Jailed { .. }) {
                *state = AgentState::AnsweringCall {
                    target: Target::with_intent(Vec2::new(x, y), TargetIntent::Gather),
                };
            }
        }
    }

    // Those already near the site are cured and fed.
    for e in humans_within(world, x, y, r) {
        if let Ok(mut h) = world.get::<&mut Human>(e) {
            h.sick = false;
            h.hunger = (h.hunger - 12.0).max(0.0);
            h.thirst = (h.thirst - 8.0).max(0.0);
        }
    }

    if !prog.tech.religion && prog.faith > havenfall_logic::progression::RELIGION_CALL_FAITH {
        prog.tech.religion = true;
        events.push("A prophet in white descends; the people gather around.");
    } else {
        events.push("The prophet's message spreads; spirits lift.");
    }
}

/// Spontaneous environmental rolls, independent of player invocations.
pub fn spontaneous_disaster_system(
    world: &mut World,
    map: &mut TileMap,
    events: &mut EventLog,
    rng: &mut impl Rng,
) {
    let n = WORLD_SIZE as f32;
    if rng.gen::<f32>() < 0.0009 {
        let x = 4.0 + rng.gen::<f32>() * (n - 8.0);
        let y = 4.0 + rng.gen::<f32>() * (n - 8.0);
        apply_rain(world, map, events, rng, x, y);
    }
    if rng.gen::<f32>() < 0.0005 {
        let x = 4.0 + rng.gen::<f32>() * (n - 8.0);
        let y = 4.0 + rng.gen::<f32>() * (n - 8.0);
        apply_snow(world, map, events, rng, x, y);
    }
    if rng.gen::<f32>() < 0.0008 {
        let victims: Vec<Entity> = world.query::<&Human>().iter().map(|(e, _)| e).collect();
        if !victims.is_empty() {
            let victim = victims[rng.gen_range(0..victims.len())];
            if let Ok(mut h) = world.get::<&mut Human>(victim) {
                h.sick = true;
            }
            events.push("Germs spread; someone has fallen ill.");
        }
    }
    if rng.gen::<f32>() < 0.0005 {
        let x = rng.gen::<f32>() * n;
        let y = rng.gen::<f32>() * n;
        apply_typhoon(world, map, events, rng, x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use havenfall_logic::buildings::BuildingLevel;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grass_map(seed: u64) -> TileMap {
        let mut map = TileMap::generate(&mut StdRng::seed_from_u64(seed));
        for y in 0..TileMap::SIZE {
            for x in 0..TileMap::SIZE {
                let t = map.tile_mut(x, y);
                t.kind = TileKind::Grass;
                t.moisture = 0.5;
                t.resource = 0.0;
            }
        }
        map
    }

    #[test]
    fn test_rain_raises_moisture_and_logs() {
        let mut world = World::new();
        let mut map = grass_map(1);
        let mut events = EventLog::new();
        let mut rng = StdRng::seed_from_u64(2);
        let before = map.tile(20, 20).moisture;

        apply_rain(&mut world, &mut map, &mut events, &mut rng, 20.5, 20.5);

        assert!(map.tile(20, 20).moisture > before);
        assert!(map.tile(20, 20).moisture <= 1.0);
        assert_eq!(world.query::<&EffectMarker>().iter().count(), 1);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_quake_spares_building_just_outside_radius() {
        let mut world = World::new();
        let mut map = grass_map(3);
        let mut events = EventLog::new();

        // 2.9 away from the epicenter, radius is 2.8: must never be touched.
        let outside = world.spawn((
            Position::new(22.9, 20.0),
            Building::site(BuildingLevel::House),
        ));
        let inside = world.spawn((
            Position::new(21.0, 20.0),
            Building::site(BuildingLevel::House),
        ));

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            apply_quake(&mut world, &mut map, &mut events, &mut rng, 20.0, 20.0);
            if !world.contains(outside) {
                panic!("building outside the radius was destroyed");
            }
            assert_eq!(
                world.get::<&Building>(outside).unwrap().health,
                1.0,
                "boundary-exclusive: no damage at distance 2.9"
            );
            if !world.contains(inside) {
                break;
            }
        }
        assert!(
            !world.contains(inside),
            "building inside the radius takes repeated damage"
        );
    }

    #[test]
    fn test_fire_burns_forest_to_grass() {
        let mut world = World::new();
        let mut map = grass_map(4);
        map.tile_mut(20, 20).kind = TileKind::Forest;
        map.tile_mut(21, 20).kind = TileKind::Fertile;
        let mut events = EventLog::new();
        let mut rng = StdRng::seed_from_u64(5);

        apply_fire(&mut world, &mut map, &mut events, &mut rng, 20.5, 20.5);

        assert_eq!(map.tile(20, 20).kind, TileKind::Grass);
        assert_eq!(map.tile(21, 20).kind, TileKind::Grass);
    }

    #[test]
    fn test_bless_feeds_nearby_agents() {
        let mut world = World::new();
        let mut map = grass_map(6);
        let mut events = EventLog::new();
        let mut rng = StdRng::seed_from_u64(7);
        let tech = crate::generation::GenerationTech::default();
        let e = spawn_human(&mut world, 20.0, 20.0, Gender::Male, tech, &mut rng);
        let hunger_before = world.get::<&Human>(e).unwrap().hunger;

        apply_bless(&mut world, &mut map, &mut events, &mut rng, 20.0, 20.0);

        let h = world.get::<&Human>(e).unwrap();
        assert!(h.hunger <= (hunger_before - 25.0).max(0.0) + 0.001);
        assert_eq!(h.wood, 1.0);
        assert_eq!(h.stone, 0.5);
    }

    #[test]
    fn test_campfire_rejected_without_fire_tech() {
        let mut world = World::new();
        let map = grass_map(8);
        let prog = Progression::default();
        let mut events = EventLog::new();

        apply_campfire(&mut world, &map, &prog, &mut events, 20.5, 20.5);

        assert_eq!(world.query::<&Campfire>().iter().count(), 0);
        assert_eq!(events.len(), 1);
        assert!(events.latest().unwrap().contains("not been discovered"));
    }

    #[test]
    fn test_campfire_lights_on_grass_after_tech() {
        let mut world = World::new();
        let mut map = grass_map(9);
        map.tile_mut(10, 10).kind = TileKind::Rock;
        let mut prog = Progression::default();
        prog.tech.fire = true;
        let mut events = EventLog::new();

        // Rock still refuses the flame.
        apply_campfire(&mut world, &map, &prog, &mut events, 10.5, 10.5);
        assert_eq!(world.query::<&Campfire>().iter().count(), 0);

        apply_campfire(&mut world, &map, &prog, &mut events, 20.5, 20.5);
        let fires: Vec<f32> = world
            .query::<&Campfire>()
            .iter()
            .map(|(_, c)| c.fuel)
            .collect();
        assert_eq!(fires, vec![CAMPFIRE_FUEL]);
    }

    #[test]
    fn test_plague_kills_or_sickens_everyone_in_radius() {
        let mut world = World::new();
        let mut events = EventLog::new();
        let mut deaths = DeathLog::new();
        let mut rng = StdRng::seed_from_u64(10);
        let tech = crate::generation::GenerationTech::default();
        let mut inside = Vec::new();
        for i in 0..12 {
            let x = 20.0 + (i as f32) * 0.1;
            inside.push(spawn_human(&mut world, x, 20.0, Gender::Male, tech, &mut rng));
        }
        let outside = spawn_human(&mut world, 30.0, 30.0, Gender::Female, tech, &mut rng);

        apply_plague(&mut world, &mut events, &mut deaths, &mut rng, 20.5, 20.0);

        let mut killed = 0;
        for e in inside {
            if world.contains(e) {
                assert!(world.get::<&Human>(e).unwrap().sick, "survivor must be sick");
            } else {
                killed += 1;
            }
        }
        assert_eq!(world.query::<&Grave>().iter().count(), killed);
        assert_eq!(deaths.len(), killed.min(12));
        assert!(!world.get::<&Human>(outside).unwrap().sick);
        assert!(events.latest().unwrap().contains("plague"));
    }

    #[test]
    fn test_prophet_summons_herald_and_sets_call() {
        let mut world = World::new();
        let mut prog = Progression::default();
        let mut events = EventLog::new();
        let mut rng = StdRng::seed_from_u64(11);
        let tech = crate::generation::GenerationTech::default();
        let mut bystander_h = None;
        for i in 0..3 {
            let e = spawn_human(&mut world, 10.0 + i as f32, 10.0, Gender::Male, tech, &mut rng);
            if i == 0 {
                bystander_h = Some(e);
            }
        }

        apply_prophet(&mut world, &mut prog, &mut events, &mut rng, 25.0, 25.0);

        let heralds: Vec<Entity> = world
            .query::<&Human>()
            .iter()
            .filter(|(_, h)| h.role == Some(Role::SummonedProphet))
            .map(|(e, _)| e)
            .collect();
        assert_eq!(heralds.len(), 1);
        let call = prog.call.expect("call set");
        assert_eq!(call.anchor, heralds[0]);
        assert!((prog.faith - 8.0).abs() < 0.001);

        // Bystanders converge on the call.
        match *world.get::<&AgentState>(bystander_h.unwrap()).unwrap() {
            AgentState::AnsweringCall { target } => {
                assert_eq!(target.pos, Vec2::new(25.0, 25.0));
            }
            ref other => panic!("expected AnsweringCall, got {:?}", other),
        }

        // A second invocation repositions the same herald.
        apply_prophet(&mut world, &mut prog, &mut events, &mut rng, 5.0, 5.0);
        let heralds_after = world
            .query::<&Human>()
            .iter()
            .filter(|(_, h)| h.role == Some(Role::SummonedProphet))
            .count();
        assert_eq!(heralds_after, 1);
        let herald_pos = *world.get::<&Position>(heralds[0]).unwrap();
        assert_eq!((herald_pos.x(), herald_pos.y()), (5.0, 5.0));
    }

    #[test]
    fn test_prophet_call_unlocks_religion_at_high_faith() {
        let mut world = World::new();
        let mut prog = Progression::default();
        prog.faith = 39.0;
        let mut events = EventLog::new();
        let mut rng = StdRng::seed_from_u64(12);

        apply_prophet(&mut world, &mut prog, &mut events, &mut rng, 25.0, 25.0);
        assert!(prog.tech.religion, "39 + 8 faith crosses the threshold");
    }
}
