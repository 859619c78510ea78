//! Settler and animal generation.

use crate::components::*;
use hecs::{Entity, World};
use havenfall_logic::constants::WORLD_SIZE;
use rand::Rng;

/// Tech flags that gate generation choices (profession rolls).
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationTech {
    pub professions: bool,
    pub medicine: bool,
}

/// Spawn a human at a point. Vitals and home anchor are randomized; a
/// profession is rolled only once the professions tech is unlocked.
pub fn spawn_human(
    world: &mut World,
    x: f32,
    y: f32,
    gender: Gender,
    tech: GenerationTech,
    rng: &mut impl Rng,
) -> Entity {
    let n = WORLD_SIZE as f32;
    let human = Human {
        gender,
        age: 18.0 + rng.gen::<f32>() * 6.0,
        hunger: 20.0 + rng.gen::<f32>() * 20.0,
        thirst: 10.0 + rng.gen::<f32>() * 10.0,
        wood: 0.0,
        stone: 0.0,
        meat: 0.0,
        sick: false,
        profession: roll_profession(tech, rng),
        role: None,
        home: Vec2::new(
            (rng.gen::<f32>() * n).clamp(2.0, n - 2.0),
            (rng.gen::<f32>() * n).clamp(2.0, n - 2.0),
        ),
        reproduce_cooldown: 12.0,
        build_cooldown: 0.0,
        action: ActionMarker::default(),
        facing: 0.0,
        moving: false,
    };
    world.spawn((Position::new(x, y), human, AgentState::Idle))
}

/// Pick a gender that keeps the population roughly balanced: an excess of
/// either side beyond one tips the next birth the other way.
pub fn pick_balanced_gender(world: &World, rng: &mut impl Rng) -> Gender {
    let mut males = 0i64;
    let mut females = 0i64;
    for (_, human) in world.query::<&Human>().iter() {
        match human.gender {
            Gender::Male => males += 1,
            Gender::Female => females += 1,
        }
    }
    if males > females + 1 {
        Gender::Female
    } else if females > males + 1 {
        Gender::Male
    } else if rng.gen::<f32>() > 0.5 {
        Gender::Male
    } else {
        Gender::Female
    }
}

fn roll_profession(tech: GenerationTech, rng: &mut impl Rng) -> Option<Profession> {
    if !tech.professions {
        return None;
    }
    let roll: f32 = rng.gen();
    Some(if tech.medicine && roll < 0.12 {
        Profession::Healer
    } else if roll < 0.3 {
        Profession::Builder
    } else if roll < 0.5 {
        Profession::Hunter
    } else if roll < 0.7 {
        Profession::Farmer
    } else if roll < 0.8 {
        Profession::Sheriff
    } else if roll < 0.9 {
        Profession::Diplomat
    } else {
        Profession::Prophet
    })
}

/// Scatter animals across the map, avoiding overlap. Each placement gets
/// a bounded number of tries; crowded maps just spawn fewer.
pub fn spawn_animals(world: &mut World, count: u32, rng: &mut impl Rng) {
    let n = WORLD_SIZE as f32;
    for _ in 0..count {
        for _try in 0..12 {
            let x = (rng.gen::<f32>() * n).floor() + 0.5;
            let y = (rng.gen::<f32>() * n).floor() + 0.5;
            let overlap = world
                .query::<(&Animal, &Position)>()
                .iter()
                .any(|(_, (_, pos))| (pos.x() - x).hypot(pos.y() - y) < 0.8);
            if overlap {
                continue;
            }
            let kind = if rng.gen::<f32>() > 0.5 {
                AnimalKind::Deer
            } else {
                AnimalKind::Boar
            };
            world.spawn((
                Position::new(x, y),
                Animal {
                    kind,
                    heading: rng.gen::<f32>() * std::f32::consts::TAU,
                    speed: 0.8 + rng.gen::<f32>() * 0.6,
                    hunger: 0.0,
                    alive: true,
                },
            ));
            break;
        }
    }
}

/// The founding pair at the world center, plus the starting animals.
pub fn spawn_initial(world: &mut World, rng: &mut impl Rng) {
    let center = (WORLD_SIZE / 2) as f32;
    spawn_human(
        world,
        center + 0.2,
        center + 0.2,
        Gender::Male,
        GenerationTech::default(),
        rng,
    );
    spawn_human(
        world,
        center - 0.2,
        center - 0.2,
        Gender::Female,
        GenerationTech::default(),
        rng,
    );
    spawn_animals(world, 8, rng);
}
