//! Civilization progression — calendar, tech latches, settlement stages,
//! gold, diplomacy/visitors, and extinction recovery.

use crate::components::*;
use crate::generation::{pick_balanced_gender, spawn_human, GenerationTech};
use crate::log::EventLog;
use crate::systems::construction::{building_count, has_city_hall};
use havenfall_logic::calendar::Calendar;
use havenfall_logic::constants::{PROPHET_CALL_TTL, STARTING_GOLD, VISA_COST, WORLD_SIZE};
use havenfall_logic::progression::{
    self, FARM_THRESHOLD, INDUSTRY_THRESHOLD, RELIGION_SPONTANEOUS_FAITH, TRIBE_THRESHOLD,
    VILLAGE_THRESHOLD,
};
use hecs::{Entity, World};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One-way tech latches. A flag, once set, is never revisited; every
/// check below is a plain `if !flag` guard.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TechFlags {
    pub fire: bool,
    pub medicine: bool,
    pub professions: bool,
    pub wheel: bool,
    pub religion: bool,
}

/// Settlement-stage latches, gated by the settlement score.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StageFlags {
    pub village: bool,
    pub farm: bool,
    pub industry: bool,
}

/// The singleton prophet call. Holds a weak handle to the anchor agent;
/// resolved against the live world every tick and cleared when the anchor
/// no longer exists. The call never owns the agent.
#[derive(Debug, Clone, Copy)]
pub struct ProphetCall {
    pub anchor: Entity,
    pub pos: Vec2,
    pub ttl: f32,
}

impl ProphetCall {
    pub fn new(anchor: Entity, pos: Vec2) -> Self {
        Self {
            anchor,
            pos,
            ttl: PROPHET_CALL_TTL,
        }
    }
}

/// World-progression state shared by every system.
#[derive(Debug, Clone)]
pub struct Progression {
    pub calendar: Calendar,
    pub light: f32,
    pub night: bool,
    pub gold: f32,
    pub faith: f32,
    pub tech: TechFlags,
    pub stages: StageFlags,
    pub tribe_formed: bool,
    pub diplomacy: bool,
    pub call: Option<ProphetCall>,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            calendar: Calendar::default(),
            light: 1.0,
            night: false,
            gold: STARTING_GOLD,
            faith: 0.0,
            tech: TechFlags::default(),
            stages: StageFlags::default(),
            tribe_formed: false,
            diplomacy: false,
            call: None,
        }
    }
}

impl Progression {
    pub fn generation_tech(&self) -> GenerationTech {
        GenerationTech {
            professions: self.tech.professions,
            medicine: self.tech.medicine,
        }
    }

    pub fn add_faith(&mut self, amount: f32) {
        self.faith = (self.faith + amount).clamp(0.0, 100.0);
    }

    /// The call, if it is still running.
    pub fn active_call(&self) -> Option<&ProphetCall> {
        self.call.as_ref().filter(|c| c.ttl > 0.0)
    }
}

/// Advance the clock and evaluate the year-gated tech latches.
/// Runs before the agent pass each tick.
pub fn calendar_and_tech_system(
    world: &mut World,
    prog: &mut Progression,
    events: &mut EventLog,
    dt: f32,
) {
    prog.calendar.advance(dt);
    prog.light = prog.calendar.light();
    prog.night = prog.calendar.is_night();

    let year = prog.calendar.year;
    if !prog.tech.fire && year >= 2 {
        prog.tech.fire = true;
        events.push("Fire has been discovered.");
    }
    if !prog.tech.medicine && year >= 3 {
        prog.tech.medicine = true;
        events.push("Healers emerge among the people.");
    }
    if !prog.tech.professions && year >= 2 {
        prog.tech.professions = true;
    }
    if !prog.tech.wheel && building_count(world) >= 6 && year >= 3 {
        prog.tech.wheel = true;
        let n = WORLD_SIZE as f32;
        let center = (WORLD_SIZE / 2) as f32;
        let (hx, hy) = first_human_pos(world).unwrap_or((center, center));
        world.spawn((
            Position::new((hx + 1.0).clamp(1.0, n - 1.0), (hy + 1.0).clamp(1.0, n - 1.0)),
            Cart::default(),
        ));
        events.push("The wheel is invented; carts roll out.");
        tracing::info!(year, "wheel unlocked");
    }
}

/// Gold accrual, tribe/diplomacy latches, visitor admission, settlement
/// stages and spontaneous religion. Runs after the agent pass.
pub fn civic_system(
    world: &mut World,
    prog: &mut Progression,
    events: &mut EventLog,
    dt: f32,
    rng: &mut impl Rng,
) {
    let population = world.query::<&Human>().iter().count();
    let buildings = building_count(world);
    let city_hall = has_city_hall(world);

    prog.gold += dt * progression::gold_rate(population, buildings, city_hall);

    let score = progression::settlement_score(population, buildings);
    if !prog.tribe_formed && score > TRIBE_THRESHOLD {
        prog.tribe_formed = true;
        events.push("A tribe has formed; the borders close.");
    }
    if !prog.diplomacy && prog.calendar.year >= 4 && city_hall {
        prog.diplomacy = true;
        events.push("Diplomacy begins; visas are now required.");
    }

    // Visitors knock rarely; each rejection cause gets its own line.
    if rng.gen::<f32>() < 0.002 && population > 0 {
        if !prog.diplomacy || !prog.tribe_formed {
            events.push("An outsider was turned away at the closed border.");
        } else if prog.gold >= VISA_COST {
            prog.gold -= VISA_COST;
            let n = WORLD_SIZE as f32;
            let (hx, hy) = first_human_pos(world).unwrap_or((n / 2.0, n / 2.0));
            let x = (hx + (rng.gen::<f32>() - 0.5) * 2.0).clamp(1.0, n - 2.0);
            let y = (hy + (rng.gen::<f32>() - 0.5) * 2.0).clamp(1.0, n - 2.0);
            let gender = pick_balanced_gender(world, rng);
            spawn_human(world, x, y, gender, prog.generation_tech(), rng);
            events.push("Visa approved; a newcomer joins the settlement.");
        } else {
            events.push("Visa fee unmet; entry denied.");
        }
    }

    if !prog.stages.village && score > VILLAGE_THRESHOLD {
        prog.stages.village = true;
        prog.tech.professions = true;
        events.push("Villages form; specialization begins.");
    }
    if !prog.stages.farm && score > FARM_THRESHOLD {
        prog.stages.farm = true;
        prog.tech.professions = true;
        events.push("The farming age: food production grows.");
    }
    if !prog.stages.industry && score > INDUSTRY_THRESHOLD {
        prog.stages.industry = true;
        prog.tech.medicine = true;
        events.push("Industry and medicine take hold.");
    }
    if prog.faith > RELIGION_SPONTANEOUS_FAITH && !prog.tech.religion {
        prog.tech.religion = true;
        events.push("Faith spreads; communities gather around prophets.");
    }
}

/// Extinction is not an error state: an empty settlement is reseeded with
/// a fresh pair at the world center.
pub fn extinction_recovery_system(
    world: &mut World,
    prog: &Progression,
    events: &mut EventLog,
    rng: &mut impl Rng,
) {
    if world.query::<&Human>().iter().count() > 0 {
        return;
    }
    let center = (WORLD_SIZE / 2) as f32;
    for offset in [0.2f32, -0.2] {
        let gender = if rng.gen::<f32>() > 0.5 {
            Gender::Male
        } else {
            Gender::Female
        };
        spawn_human(
            world,
            center + offset,
            center + offset,
            gender,
            prog.generation_tech(),
            rng,
        );
    }
    events.push("The line died out; a new soul descends.");
    tracing::info!("population extinct, respawned founding pair");
}

pub(crate) fn first_human_pos(world: &World) -> Option<(f32, f32)> {
    world
        .query::<(&Human, &Position)>()
        .iter()
        .min_by_key(|(e, _)| e.id())
        .map(|(_, (_, pos))| (pos.x(), pos.y()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use havenfall_logic::buildings::BuildingLevel;
    use havenfall_logic::constants::DAY_LENGTH;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn advance_years(world: &mut World, prog: &mut Progression, events: &mut EventLog, years: u32) {
        let seconds = DAY_LENGTH * 30.0 * 12.0 * years as f32;
        let mut elapsed = 0.0;
        while elapsed < seconds {
            calendar_and_tech_system(world, prog, events, 0.12);
            elapsed += 0.12;
        }
    }

    #[test]
    fn test_fire_and_professions_unlock_in_year_two() {
        let mut world = World::new();
        let mut prog = Progression::default();
        let mut events = EventLog::new();
        assert!(!prog.tech.fire);
        advance_years(&mut world, &mut prog, &mut events, 1);
        assert!(prog.tech.fire);
        assert!(prog.tech.professions);
        assert!(!prog.tech.medicine);
    }

    #[test]
    fn test_wheel_needs_buildings_and_spawns_one_cart() {
        let mut world = World::new();
        let mut prog = Progression::default();
        let mut events = EventLog::new();

        // Year 3+ but too few buildings: no wheel.
        advance_years(&mut world, &mut prog, &mut events, 3);
        assert!(!prog.tech.wheel);

        for i in 0..6 {
            let mut b = Building::site(BuildingLevel::Hut);
            b.complete();
            world.spawn((Position::new(2.0 + i as f32 * 2.0, 2.0), b));
        }
        calendar_and_tech_system(&mut world, &mut prog, &mut events, 0.1);
        assert!(prog.tech.wheel);
        assert_eq!(world.query::<&Cart>().iter().count(), 1);

        // The latch holds: no second cart ever.
        for _ in 0..100 {
            calendar_and_tech_system(&mut world, &mut prog, &mut events, 0.1);
        }
        assert_eq!(world.query::<&Cart>().iter().count(), 1);
    }

    #[test]
    fn test_visitor_rejected_without_diplomacy() {
        let mut world = World::new();
        let mut prog = Progression::default();
        let mut events = EventLog::new();
        let mut rng = StdRng::seed_from_u64(9);
        spawn_human(&mut world, 5.0, 5.0, Gender::Male, GenerationTech::default(), &mut rng);

        // Run until the rare visitor roll fires at least once.
        for _ in 0..20_000 {
            civic_system(&mut world, &mut prog, &mut events, 0.1, &mut rng);
            if !events.is_empty() {
                break;
            }
        }
        let line = events
            .entries()
            .iter()
            .find(|l| l.contains("turned away"))
            .expect("closed-border rejection should be logged");
        assert!(line.contains("closed border"));
        assert_eq!(world.query::<&Human>().iter().count(), 1, "no one admitted");
    }

    #[test]
    fn test_extinction_respawns_center_pair() {
        let mut world = World::new();
        let prog = Progression::default();
        let mut events = EventLog::new();
        let mut rng = StdRng::seed_from_u64(10);

        extinction_recovery_system(&mut world, &prog, &mut events, &mut rng);
        let center = (WORLD_SIZE / 2) as f32;
        let humans: Vec<(f32, f32)> = world
            .query::<(&Human, &Position)>()
            .iter()
            .map(|(_, (_, p))| (p.x(), p.y()))
            .collect();
        assert_eq!(humans.len(), 2);
        assert!(humans.contains(&(center + 0.2, center + 0.2)));
        assert!(humans.contains(&(center - 0.2, center - 0.2)));

        // With survivors present it must do nothing.
        extinction_recovery_system(&mut world, &prog, &mut events, &mut rng);
        assert_eq!(world.query::<&Human>().iter().count(), 2);
    }

    #[test]
    fn test_stage_latches_and_gold() {
        let mut world = World::new();
        let mut prog = Progression::default();
        let mut events = EventLog::new();
        let mut rng = StdRng::seed_from_u64(12);

        // Plenty of completed buildings to push the score past industry.
        for i in 0..12 {
            let mut b = Building::site(BuildingLevel::Hut);
            b.complete();
            world.spawn((Position::new(2.0 + i as f32 * 2.5, 4.0), b));
        }
        let before = prog.gold;
        civic_system(&mut world, &mut prog, &mut events, 1.0, &mut rng);
        assert!(prog.gold > before);
        assert!(prog.stages.village && prog.stages.farm && prog.stages.industry);
        assert!(prog.tribe_formed);
        assert!(prog.tech.medicine, "industry forces medicine");
    }
}
