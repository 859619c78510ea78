//! Agent behavior — the per-human per-tick update.
//!
//! Fixed order per agent: timers, jail short-circuit, needs accrual, death
//! check, separation, build-task validation, goal selection, movement and
//! action resolution, construction work, tile interaction, consumption,
//! healing, construction initiation, reproduction, night rest, faith.
//!
//! Humans are processed one at a time against a snapshot of the entity
//! list, so an agent may remove itself or spawn peers mid-pass without
//! invalidating the iteration.

use crate::components::*;
use crate::log::{DeathLog, EventLog};
use crate::systems::construction::{
    any_completed_building, building_count, can_build_at, completed_building_near,
    find_build_spot, find_upgrade_target,
};
use crate::systems::progression::Progression;
use crate::tilemap::{TileKind, TileMap};
use havenfall_logic::buildings::{
    self, BuildingLevel, NEW_SITE_COOLDOWN, PASSIVE_GAIN_BUILDING_CAP, PASSIVE_GAIN_RATE,
};
use havenfall_logic::climate;
use havenfall_logic::constants::{GRAVE_LIFE, MAX_POPULATION, WORLD_SIZE};
use havenfall_logic::needs::{
    self, CAMPFIRE_RANGE, CAMPFIRE_RELIEF, SHELTER_RANGE, SICKNESS_PENALTY,
};
use havenfall_logic::progression::raw_score;
use havenfall_logic::steering::{self, StepOutcome, BUILD_WALK_SPEED, WALK_SPEED};
use hecs::{Entity, World};
use rand::Rng;

/// Shared simulation state the behavior pass reads and mutates.
pub struct BehaviorCtx<'a> {
    pub map: &'a mut TileMap,
    pub prog: &'a mut Progression,
    pub events: &'a mut EventLog,
    pub deaths: &'a mut DeathLog,
}

/// Update every human for one tick.
pub fn human_system(world: &mut World, ctx: &mut BehaviorCtx<'_>, dt: f32, rng: &mut impl Rng) {
    let entities: Vec<Entity> = world.query::<&Human>().iter().map(|(e, _)| e).collect();
    for e in entities {
        if world.contains(e) {
            update_human(world, ctx, e, dt, rng);
        }
    }
}

fn update_human(
    world: &mut World,
    ctx: &mut BehaviorCtx<'_>,
    e: Entity,
    dt: f32,
    rng: &mut impl Rng,
) {
    // Work on local copies; scoped borrows below touch other entities.
    let mut h = match world.get::<&Human>(e) {
        Ok(g) => (*g).clone(),
        Err(_) => return,
    };
    let mut pos = match world.get::<&Position>(e) {
        Ok(g) => *g,
        Err(_) => return,
    };
    let state = match world.get::<&AgentState>(e) {
        Ok(g) => *g,
        Err(_) => return,
    };

    h.reproduce_cooldown = (h.reproduce_cooldown - dt).max(0.0);
    h.build_cooldown = (h.build_cooldown - dt).max(0.0);
    h.age += dt * 0.05;
    let prev = pos;

    let call = ctx.prog.active_call().copied();
    let summoned = h.role == Some(Role::SummonedProphet);

    if let AgentState::Jailed { remaining } = state {
        let remaining = (remaining - dt).max(0.0);
        h.hunger += dt * 0.2;
        h.thirst += dt * 0.2;
        h.moving = false;
        let next = if remaining > 0.0 {
            AgentState::Jailed { remaining }
        } else {
            AgentState::Idle
        };
        write_back(world, e, h, pos, next);
        return;
    }

    // Needs accrual, modulated by shelter, heat, sickness, fire.
    let sheltered = completed_building_near(world, pos.x(), pos.y(), SHELTER_RANGE).is_some();
    let near_fire = world
        .query::<(&Campfire, &Position)>()
        .iter()
        .any(|(_, (_, p))| (p.x() - pos.x()).hypot(p.y() - pos.y()) < CAMPFIRE_RANGE);
    let temp = ctx.map.temperature(
        pos.x().floor().max(0.0) as usize,
        pos.y().floor().max(0.0) as usize,
        ctx.prog.calendar.month,
    );
    h.hunger += dt * needs::hunger_rate(sheltered);
    h.thirst += dt * climate::thirst_rate(temp);
    if h.sick {
        h.hunger += dt * SICKNESS_PENALTY;
        h.thirst += dt * SICKNESS_PENALTY;
    }
    if near_fire {
        h.hunger = (h.hunger - dt * CAMPFIRE_RELIEF).max(0.0);
    }
    if summoned {
        h.hunger = (h.hunger - dt * CAMPFIRE_RELIEF).max(0.0);
        h.thirst = (h.thirst - dt * CAMPFIRE_RELIEF).max(0.0);
    }

    // Fatal thresholds remove the agent within the same tick.
    if let Some(cause) = needs::fatal_cause(h.hunger, h.thirst, h.age) {
        let _ = world.despawn(e);
        world.spawn((pos, Grave { life: GRAVE_LIFE }));
        ctx.deaths.record(cause, h.age);
        return;
    }

    // Nudge apart from the first overlapping neighbor.
    let overlap = world
        .query::<(&Human, &Position)>()
        .iter()
        .filter(|(oe, _)| *oe != e)
        .map(|(_, (_, p))| (p.x(), p.y()))
        .find(|&(ox, oy)| (ox - pos.x()).hypot(oy - pos.y()) < steering::SEPARATION_RADIUS);
    if let Some((ox, oy)) = overlap {
        let (px, py) = steering::separation_push(pos.x(), pos.y(), ox, oy, dt);
        pos = Position::new(pos.x() + px, pos.y() + py);
    }

    // A build task is void once its site is gone, or while a call stands.
    let mut task = world.get::<&BuildTask>(e).ok().map(|g| *g);
    if let Some(t) = task {
        if !world.contains(t.site) || call.is_some() {
            let _ = world.remove_one::<BuildTask>(e);
            task = None;
        }
    }
    let has_task = task.is_some();

    let mut target: Option<Target> = state.target().copied();
    let mut resting = state.is_resting();
    let mut inside = matches!(state, AgentState::Resting { inside: true });
    let mut praying = false;

    if let Some(t) = task {
        if let Ok(site_pos) = world.get::<&Position>(t.site) {
            target = Some(Target::at(site_pos.0));
        }
    }

    if let Some(c) = call {
        let d = (pos.x() - c.pos.x).hypot(pos.y() - c.pos.y);
        if d > 0.9 {
            target = Some(Target::with_intent(c.pos, TargetIntent::Gather));
            resting = false;
            h.action.clear();
        } else {
            target = None;
            resting = true;
            praying = true;
            if h.action.time_left <= 0.0 {
                h.action.set(ActionKind::Pray, 1.0);
            }
        }
    } else if summoned {
        target = None;
        resting = true;
        praying = true;
        h.action.set(ActionKind::Pray, 1.0);
    } else if (target.is_none() || rng.gen::<f32>() < 0.002) && !has_task {
        decide_goal(
            world, ctx.map, ctx.prog, e, &mut h, pos, &mut target, &mut resting, &mut inside, rng,
        );
    }

    // Movement and arrival resolution.
    if let Some(t) = target {
        let d = (pos.x() - t.pos.x).hypot(pos.y() - t.pos.y);
        let near_construction = has_task && d < 0.35;
        if near_construction {
            resting = false;
        } else if d < steering::ARRIVAL_EPSILON {
            match t.intent {
                TargetIntent::Hunt => {
                    let prey = world
                        .query::<(&Animal, &Position)>()
                        .iter()
                        .find(|(_, (a, p))| {
                            a.alive && (p.x() - pos.x()).hypot(p.y() - pos.y()) < 0.6
                        })
                        .map(|(ae, _)| ae);
                    if let Some(ae) = prey {
                        if let Ok(mut animal) = world.get::<&mut Animal>(ae) {
                            animal.alive = false;
                        }
                        h.meat += 25.0;
                        h.action.set(ActionKind::Hunt, 0.5);
                        ctx.events.push("Caught prey; meat stored.");
                    }
                }
                TargetIntent::Fish => {
                    let catch = world
                        .query::<(&Fish, &Position)>()
                        .iter()
                        .find(|(_, (_, p))| (p.x() - pos.x()).hypot(p.y() - pos.y()) < 0.8)
                        .map(|(fe, _)| fe);
                    if let Some(fe) = catch {
                        let _ = world.despawn(fe);
                        h.meat += 15.0;
                        h.thirst = (h.thirst - 10.0).max(0.0);
                        ctx.events.push("A fish was caught.");
                    }
                }
                _ => {}
            }
            target = None;
        } else {
            let speed = if has_task { BUILD_WALK_SPEED } else { WALK_SPEED };
            match steering::step_toward(pos.x(), pos.y(), t.pos.x, t.pos.y, speed, dt) {
                StepOutcome::Arrived => target = None,
                StepOutcome::Step { x, y, heading } => match ctx.map.tile_at(x, y) {
                    Some(tile) if tile.kind != TileKind::Water => {
                        pos = Position::new(x, y);
                        h.facing = heading;
                        resting = false;
                    }
                    _ => {
                        // Water ahead: give up rather than path around it.
                        target = None;
                        h.action.clear();
                        resting = false;
                    }
                },
            }
        }
    }

    // Construction work while stationed at the site.
    if let Some(t) = task {
        if world.contains(t.site) {
            let site_pos = world.get::<&Position>(t.site).map(|p| p.0).unwrap_or(Vec2::ZERO);
            let d = (pos.x() - site_pos.x).hypot(pos.y() - site_pos.y);
            if d < 0.65 {
                let rate = dt
                    * if h.profession == Some(Profession::Builder) {
                        0.55
                    } else {
                        0.35
                    };
                let mut finished: Option<BuildingLevel> = None;
                if let Ok(mut b) = world.get::<&mut Building>(t.site) {
                    b.progress = (b.progress + rate).clamp(0.0, 1.0);
                    b.under_construction = true;
                    if b.progress >= 1.0 {
                        b.complete();
                        finished = Some(b.level);
                    }
                }
                h.action.set(ActionKind::Build, 0.5);
                h.facing = (site_pos.y - pos.y()).atan2(site_pos.x - pos.x());
                if let Some(level) = finished {
                    ctx.events.push(format!("The {} is complete.", level.label()));
                    let _ = world.remove_one::<BuildTask>(e);
                }
            }
        }
    }

    let moved = (pos.x() - prev.x()).hypot(pos.y() - prev.y());
    h.moving = moved > 0.002 && !inside && !resting;

    // Tile interaction at the agent's feet (suspended while gathered at
    // the call, except for the water snap).
    let near_summon = call
        .map(|c| (pos.x() - c.pos.x).hypot(pos.y() - c.pos.y) < 0.95)
        .unwrap_or(false);
    let standing = ctx.map.tile_at(pos.x(), pos.y()).map(|t| (t.kind, t.resource));
    if let Some((kind, resource)) = standing {
        if !near_summon {
            match kind {
                TileKind::Forest if resource > 0.0 => {
                    let gain = dt * 1.5;
                    h.wood += gain;
                    if let Some(tile) = ctx.map.tile_at_mut(pos.x(), pos.y()) {
                        tile.resource = (tile.resource - gain * 0.7).max(0.0);
                        if tile.resource <= 0.05 {
                            tile.kind = TileKind::Grass;
                        }
                    }
                    h.action.set(ActionKind::Chop, 0.4);
                }
                TileKind::Rock if resource > 0.0 => {
                    let gain = dt * 1.2;
                    h.stone += gain;
                    if let Some(tile) = ctx.map.tile_at_mut(pos.x(), pos.y()) {
                        tile.resource = (tile.resource - gain * 0.5).max(0.0);
                        if tile.resource <= 0.05 {
                            tile.kind = TileKind::Grass;
                        }
                    }
                    h.action.set(ActionKind::Chop, 0.4);
                }
                TileKind::Fertile => {
                    work_crop(world, ctx.events, &mut h, pos, dt);
                }
                TileKind::Water => {
                    if let Some((sx, sy)) = ctx.map.nearest_shore(pos.x(), pos.y()) {
                        pos = Position::new(sx, sy);
                    }
                }
                _ => {}
            }
        } else if kind == TileKind::Water {
            if let Some((sx, sy)) = ctx.map.nearest_shore(pos.x(), pos.y()) {
                pos = Position::new(sx, sy);
            }
        }
    }

    // Drink from adjacent water.
    if ctx.map.has_water_neighbor(pos.x(), pos.y(), 0.8) {
        h.thirst = (h.thirst - dt * 18.0).max(0.0);
    }

    // Pick up at most one colliding food item.
    let bite = world
        .query::<(&FoodItem, &Position)>()
        .iter()
        .find(|(_, (_, p))| (p.x() - pos.x()).hypot(p.y() - pos.y()) < 0.65)
        .map(|(fe, (f, _))| (fe, f.amount));
    if let Some((fe, amount)) = bite {
        h.hunger = (h.hunger - amount * 0.6).max(0.0);
        h.action.set(ActionKind::Eat, 0.8);
        let _ = world.despawn(fe);
    }

    // Gnaw on carried meat while hungry.
    if h.meat > 0.0 && h.hunger > 30.0 {
        let consumed = h.meat.min(dt * 4.0);
        h.meat -= consumed;
        h.hunger = (h.hunger - consumed * 1.2).max(0.0);
        h.action.set(ActionKind::Eat, 0.6);
    }

    // Healers cure one nearby patient once medicine exists.
    if h.profession == Some(Profession::Healer) && ctx.prog.tech.medicine {
        let patient = world
            .query::<(&Human, &Position)>()
            .iter()
            .filter(|(oe, (o, p))| {
                (*oe == e && h.sick || *oe != e && o.sick)
                    && (p.x() - pos.x()).hypot(p.y() - pos.y()) < 1.5
            })
            .map(|(oe, _)| oe)
            .min_by_key(|oe| oe.id());
        if let Some(pe) = patient {
            if pe == e {
                h.sick = false;
            } else if let Ok(mut other) = world.get::<&mut Human>(pe) {
                other.sick = false;
            }
            ctx.events.push("A healer cured a patient.");
        }
    }

    if h.build_cooldown <= 0.0 {
        initiate_construction(world, ctx, e, &mut h, pos, &mut target, dt, rng);
    }

    // Reproduction; a crowded spot defers the whole remainder of the tick.
    let population = world.query::<&Human>().iter().count();
    if h.reproduce_cooldown <= 0.0
        && h.hunger < 85.0
        && h.thirst < 85.0
        && h.age > 18.0
        && population < MAX_POPULATION
    {
        let neighbors = world
            .query::<(&Human, &Position)>()
            .iter()
            .filter(|(_, (_, p))| (p.x() - pos.x()).hypot(p.y() - pos.y()) < 2.0)
            .count();
        if neighbors > 8 {
            let next = end_state(praying, call.is_some(), resting, inside, target);
            write_back(world, e, h, pos, next);
            return;
        }
        let partner = world
            .query::<(&Human, &Position)>()
            .iter()
            .find(|(oe, (o, p))| {
                *oe != e
                    && o.gender != h.gender
                    && o.hunger < 85.0
                    && o.thirst < 85.0
                    && (p.x() - pos.x()).hypot(p.y() - pos.y()) < 1.8
            })
            .map(|(oe, (o, p))| (oe, o.home, p.0));
        if let Some((pe, partner_home, partner_pos)) = partner {
            h.reproduce_cooldown = 25.0;
            if let Ok(mut other) = world.get::<&mut Human>(pe) {
                other.reproduce_cooldown = 25.0;
            }
            let n = WORLD_SIZE as f32;
            let cx = ((pos.x() + partner_pos.x) / 2.0 + (rng.gen::<f32>() - 0.5) * 0.5)
                .clamp(1.0, n - 2.0);
            let cy = ((pos.y() + partner_pos.y) / 2.0 + (rng.gen::<f32>() - 0.5) * 0.5)
                .clamp(1.0, n - 2.0);
            let gender = crate::generation::pick_balanced_gender(world, rng);
            let child =
                crate::generation::spawn_human(world, cx, cy, gender, ctx.prog.generation_tech(), rng);
            if let Ok(mut c) = world.get::<&mut Human>(child) {
                c.home = Vec2::new(
                    ((h.home.x + partner_home.x) / 2.0 + (rng.gen::<f32>() - 0.5) * 6.0)
                        .clamp(2.0, n - 2.0),
                    ((h.home.y + partner_home.y) / 2.0 + (rng.gen::<f32>() - 0.5) * 6.0)
                        .clamp(2.0, n - 2.0),
                );
            }
            ctx.events.push("A baby was born.");
        }
    }

    h.action.update(dt);

    // Night rest slows needs; day clears any leftover rest.
    if ctx.prog.night && resting {
        h.hunger = (h.hunger - dt * 0.2).max(0.0);
        h.thirst = (h.thirst - dt * 0.15).max(0.0);
        inside = true;
    } else {
        inside = false;
        if !ctx.prog.night && !praying {
            resting = false;
        }
    }

    // Prophets raise faith and ease the needs of those around them.
    if h.profession == Some(Profession::Prophet) {
        ctx.prog.add_faith(dt * 0.5);
        let flock: Vec<Entity> = world
            .query::<(&Human, &Position)>()
            .iter()
            .filter(|(oe, (_, p))| {
                *oe != e && (p.x() - pos.x()).hypot(p.y() - pos.y()) < 2.5
            })
            .map(|(oe, _)| oe)
            .collect();
        for oe in flock {
            if let Ok(mut other) = world.get::<&mut Human>(oe) {
                other.hunger = (other.hunger - dt * 0.8).max(0.0);
                other.thirst = (other.thirst - dt * 0.5).max(0.0);
            }
        }
    }

    let next = end_state(praying, call.is_some(), resting, inside, target);
    write_back(world, e, h, pos, next);
}

/// Priority-ordered goal selection. Later rules only fill an empty slot;
/// profession goals and acute hunger may override an existing one, exactly
/// mirroring the decision table.
#[allow(clippy::too_many_arguments)]
fn decide_goal(
    world: &World,
    map: &TileMap,
    prog: &Progression,
    e: Entity,
    h: &mut Human,
    pos: Position,
    target: &mut Option<Target>,
    resting: &mut bool,
    inside: &mut bool,
    rng: &mut impl Rng,
) {
    let n = WORLD_SIZE as f32;

    // Rarely relocate the home anchor entirely.
    if target.is_none() && rng.gen::<f32>() < 0.003 {
        h.home = Vec2::new(
            (rng.gen::<f32>() * n).clamp(2.0, n - 2.0),
            (rng.gen::<f32>() * n).clamp(2.0, n - 2.0),
        );
    }

    if prog.night {
        if completed_building_near(world, pos.x(), pos.y(), 2.0).is_none() {
            if let Some((_, bpos)) = any_completed_building(world) {
                *target = Some(Target::at(bpos));
            }
        } else {
            *resting = true;
            *inside = true;
        }
    }

    if !prog.night && h.hunger < 30.0 && h.thirst < 30.0 && rng.gen::<f32>() < 0.1 {
        *resting = true;
        h.action.clear();
    }

    match h.profession {
        Some(Profession::Healer) => {
            let sick = world
                .query::<(&Human, &Position)>()
                .iter()
                .find(|(_, (o, _))| o.sick)
                .map(|(_, (_, p))| p.0);
            if let Some(p) = sick {
                *target = Some(Target::at(p));
            }
        }
        Some(Profession::Hunter) if h.hunger > 40.0 => {
            let prey = world
                .query::<(&Animal, &Position)>()
                .iter()
                .find(|(_, (a, _))| a.alive)
                .map(|(_, (_, p))| p.0);
            if let Some(p) = prey {
                *target = Some(Target::with_intent(p, TargetIntent::Hunt));
            }
        }
        Some(Profession::Farmer) if h.hunger > 30.0 => {
            if let Some((fx, fy)) = map.nearest_of_kind(pos.x(), pos.y(), TileKind::Fertile) {
                *target = Some(Target::at(Vec2::new(fx, fy)));
            }
        }
        _ => {}
    }

    if target.is_none() && h.thirst > 60.0 {
        if let Some((sx, sy)) = map.nearest_shore(pos.x(), pos.y()) {
            *target = Some(Target::at(Vec2::new(sx, sy)));
        }
    }
    if h.hunger > 60.0 {
        if let Some(t) = nearest_food(world, pos) {
            *target = Some(t);
        }
    }
    if target.is_none() && h.profession == Some(Profession::Hunter) {
        if let Some(t) = nearest_food(world, pos) {
            *target = Some(t);
        }
    }
    if target.is_none() && h.wood < 10.0 {
        if let Some((fx, fy)) = map.nearest_of_kind(pos.x(), pos.y(), TileKind::Forest) {
            *target = Some(Target::at(Vec2::new(fx, fy)));
        }
    }
    if target.is_none() && h.stone < 8.0 {
        if let Some((rx, ry)) = map.nearest_of_kind(pos.x(), pos.y(), TileKind::Rock) {
            *target = Some(Target::at(Vec2::new(rx, ry)));
        }
    }
    if target.is_none() && h.reproduce_cooldown <= 0.0 && rng.gen::<f32>() < 0.2 {
        let partner = world
            .query::<(&Human, &Position)>()
            .iter()
            .find(|(oe, (o, _))| {
                *oe != e && o.gender != h.gender && o.hunger < 85.0 && o.thirst < 85.0
            })
            .map(|(_, (_, p))| p.0);
        if let Some(p) = partner {
            *target = Some(Target::at(p));
        }
    }
    if target.is_none() {
        let rx = (h.home.x + (rng.gen::<f32>() - 0.5) * 20.0).clamp(1.0, n - 1.0);
        let ry = (h.home.y + (rng.gen::<f32>() - 0.5) * 20.0).clamp(1.0, n - 1.0);
        *target = Some(Target::at(Vec2::new(rx, ry)));
    }
}

/// Nearest edible thing: ground food at any range, fish within 7,
/// living animals within 6.
fn nearest_food(world: &World, pos: Position) -> Option<Target> {
    let mut best: Option<Target> = None;
    let mut best_dist = f32::INFINITY;
    for (_, (_, p)) in world.query::<(&FoodItem, &Position)>().iter() {
        let d = (p.x() - pos.x()).hypot(p.y() - pos.y());
        if d < best_dist {
            best = Some(Target::at(p.0));
            best_dist = d;
        }
    }
    for (_, (_, p)) in world.query::<(&Fish, &Position)>().iter() {
        let d = (p.x() - pos.x()).hypot(p.y() - pos.y());
        if d < best_dist && d < 7.0 {
            best = Some(Target::with_intent(p.0, TargetIntent::Fish));
            best_dist = d;
        }
    }
    for (_, (a, p)) in world.query::<(&Animal, &Position)>().iter() {
        if !a.alive {
            continue;
        }
        let d = (p.x() - pos.x()).hypot(p.y() - pos.y());
        if d < best_dist && d < 6.0 {
            best = Some(Target::with_intent(p.0, TargetIntent::Hunt));
            best_dist = d;
        }
    }
    best
}

/// Grow (and for farmers, harvest) the crop on the fertile tile underfoot.
fn work_crop(world: &mut World, events: &mut EventLog, h: &mut Human, pos: Position, dt: f32) {
    let cx = pos.x().floor() + 0.5;
    let cy = pos.y().floor() + 0.5;
    let existing = world
        .query::<(&Crop, &Position)>()
        .iter()
        .find(|(_, (_, p))| (p.x() - cx).abs() < 0.51 && (p.y() - cy).abs() < 0.51)
        .map(|(ce, _)| ce);
    let crop_entity =
        existing.unwrap_or_else(|| world.spawn((Position::new(cx, cy), Crop::new())));

    let boost = if h.profession == Some(Profession::Farmer) {
        1.8
    } else {
        1.0
    };
    let mut harvested = false;
    if let Ok(mut crop) = world.get::<&mut Crop>(crop_entity) {
        crop.growth = (crop.growth + dt * 0.08 * boost).clamp(0.0, Crop::MAX_GROWTH);
        if crop.stage() == CropStage::Ripe
            && h.profession == Some(Profession::Farmer)
            && h.hunger > 20.0
        {
            crop.growth = Crop::RESET_GROWTH;
            harvested = true;
        }
    }
    if harvested {
        world.spawn((Position::new(cx, cy), FoodItem { amount: 24.0 }));
        h.action.set(ActionKind::Farm, 0.5);
        events.push("Wheat was harvested.");
    } else {
        h.action.set(ActionKind::Farm, 0.4);
    }
}

/// Construction initiation: aspire to a tier from the settlement score,
/// prefer upgrading, otherwise stake out a new site. Rejections (cost,
/// siting, missing predecessor) fail silently; the cooldown retries later.
#[allow(clippy::too_many_arguments)]
fn initiate_construction(
    world: &mut World,
    ctx: &mut BehaviorCtx<'_>,
    e: Entity,
    h: &mut Human,
    pos: Position,
    target: &mut Option<Target>,
    dt: f32,
    rng: &mut impl Rng,
) {
    let population = world.query::<&Human>().iter().count();
    let buildings = building_count(world);
    let score = raw_score(population, buildings);
    let city_hall = crate::systems::construction::has_city_hall(world);
    let desired = buildings::desired_level(score, city_hall);
    let cost = desired.cost();

    // Bootstrap: sparse settlements gather materials on the side.
    if buildings < PASSIVE_GAIN_BUILDING_CAP {
        h.wood += dt * PASSIVE_GAIN_RATE;
        h.stone += dt * PASSIVE_GAIN_RATE;
    }

    if h.wood < cost.wood || h.stone < cost.stone {
        return;
    }

    if let Some(site) = find_upgrade_target(world, desired) {
        let site_pos = world.get::<&Position>(site).map(|p| p.0).unwrap_or(Vec2::ZERO);
        if let Ok(mut b) = world.get::<&mut Building>(site) {
            b.start_upgrade(desired);
        }
        h.wood -= cost.wood;
        h.stone -= cost.stone;
        h.build_cooldown = desired.upgrade_cooldown();
        let _ = world.insert_one(
            e,
            BuildTask {
                site,
                kind: BuildTaskKind::Upgrade,
            },
        );
        *target = Some(Target::at(site_pos));
        ctx.events
            .push(format!("An upgrade toward the {} has begun.", desired.label()));
        h.action.set(ActionKind::Build, 0.6);
        return;
    }

    let tx = pos.x().round();
    let ty = pos.y().round();
    let spot = if can_build_at(world, ctx.map, tx + 0.5, ty + 0.5) {
        Some(Vec2::new(tx + 0.5, ty + 0.5))
    } else {
        find_build_spot(world, ctx.map, h.home, rng)
            .map(|s| Vec2::new(s.x.floor() + 0.5, s.y.floor() + 0.5))
    };
    let Some(spot) = spot else {
        return;
    };

    let site = world.spawn((Position::new(spot.x, spot.y), Building::site(desired)));
    h.wood -= cost.wood;
    h.stone -= cost.stone;
    h.build_cooldown = NEW_SITE_COOLDOWN;
    let _ = world.insert_one(
        e,
        BuildTask {
            site,
            kind: BuildTaskKind::NewSite,
        },
    );
    *target = Some(Target::at(spot));
    ctx.events.push(format!(
        "Foundations for a {} were laid; construction begins.",
        desired.label()
    ));
    if desired == BuildingLevel::CityHall {
        ctx.events.push("The city hall is founded; a mayor takes office.");
    }
    h.action.set(ActionKind::Build, 0.6);
}

fn end_state(
    praying: bool,
    call_active: bool,
    resting: bool,
    inside: bool,
    target: Option<Target>,
) -> AgentState {
    if praying {
        AgentState::Praying
    } else if call_active {
        if let Some(t) = target.filter(|t| t.intent == TargetIntent::Gather) {
            return AgentState::AnsweringCall { target: t };
        }
        state_from_rest_or_travel(resting, inside, target)
    } else {
        state_from_rest_or_travel(resting, inside, target)
    }
}

fn state_from_rest_or_travel(resting: bool, inside: bool, target: Option<Target>) -> AgentState {
    if resting {
        AgentState::Resting { inside }
    } else if let Some(t) = target {
        AgentState::Traveling { target: t }
    } else {
        AgentState::Idle
    }
}

fn write_back(world: &mut World, e: Entity, h: Human, pos: Position, state: AgentState) {
    if let Ok(mut slot) = world.get::<&mut Human>(e) {
        *slot = h;
    }
    if let Ok(mut slot) = world.get::<&mut Position>(e) {
        *slot = pos;
    }
    if let Ok(mut slot) = world.get::<&mut AgentState>(e) {
        *slot = state;
    }
}
