//! Simulation engine - main entry point for running the simulation

use crate::components::Human;
use crate::generation::spawn_initial;
use crate::log::{DeathLog, EventLog};
use crate::snapshot::WorldSnapshot;
use crate::systems::*;
use crate::tilemap::TileMap;
use havenfall_logic::constants::MAX_STEP;
use hecs::World;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Player-invocable effects. Typhoons only ever occur spontaneously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisasterKind {
    Rain,
    Snow,
    Quake,
    Fire,
    Bless,
    Campfire,
    Plague,
    Prophet,
}

/// Main simulation engine. Owns the ECS world, the tile map, progression
/// state, the event logs and the random source. Single-threaded: one
/// `update` call advances everything synchronously, and rendering/UI
/// collaborators only read [`WorldSnapshot`] between ticks.
pub struct SimulationEngine {
    world: World,
    map: TileMap,
    prog: Progression,
    events: EventLog,
    deaths: DeathLog,
    rng: StdRng,
    paused: bool,
    speed: f32,
}

impl SimulationEngine {
    /// Create a world from entropy.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a world from a fixed seed, so tests can pin the
    /// probabilistic machinery. Determinism is not otherwise a goal.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(mut rng: StdRng) -> Self {
        let map = TileMap::generate(&mut rng);
        let mut world = World::new();
        spawn_initial(&mut world, &mut rng);
        let mut events = EventLog::new();
        events.push("The founding pair steps into the world.");
        Self {
            world,
            map,
            prog: Progression::default(),
            events,
            deaths: DeathLog::new(),
            rng,
            paused: false,
            speed: 1.0,
        }
    }

    /// Advance one tick. `dt` is wall-clock seconds; it is scaled by the
    /// speed multiplier and clamped so a stalled frame never causes a
    /// catch-up leap. No-op while paused.
    pub fn update(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        let dt = (dt * self.speed).clamp(0.0, MAX_STEP);
        if dt <= 0.0 {
            return;
        }

        calendar_and_tech_system(&mut self.world, &mut self.prog, &mut self.events, dt);
        self.map.decay_moisture(dt);
        ambient_spawn_system(&mut self.world, &mut self.map, &mut self.rng);

        let mut ctx = BehaviorCtx {
            map: &mut self.map,
            prog: &mut self.prog,
            events: &mut self.events,
            deaths: &mut self.deaths,
        };
        human_system(&mut self.world, &mut ctx, dt, &mut self.rng);

        animal_system(&mut self.world, &self.map, dt, &mut self.rng);
        cart_system(&mut self.world, dt);
        upkeep_system(&mut self.world, dt);
        prophet_call_system(&self.world, &mut self.prog, dt);
        civic_system(
            &mut self.world,
            &mut self.prog,
            &mut self.events,
            dt,
            &mut self.rng,
        );
        spontaneous_disaster_system(
            &mut self.world,
            &mut self.map,
            &mut self.events,
            &mut self.rng,
        );
        extinction_recovery_system(&mut self.world, &self.prog, &mut self.events, &mut self.rng);
    }

    /// Invoke a disaster at explicit world coordinates. This is one of the
    /// two narrow channels external collaborators may mutate through.
    pub fn apply_disaster(&mut self, kind: DisasterKind, x: f32, y: f32) {
        match kind {
            DisasterKind::Rain => {
                apply_rain(&mut self.world, &mut self.map, &mut self.events, &mut self.rng, x, y)
            }
            DisasterKind::Snow => {
                apply_snow(&mut self.world, &mut self.map, &mut self.events, &mut self.rng, x, y)
            }
            DisasterKind::Quake => {
                apply_quake(&mut self.world, &mut self.map, &mut self.events, &mut self.rng, x, y)
            }
            DisasterKind::Fire => {
                apply_fire(&mut self.world, &mut self.map, &mut self.events, &mut self.rng, x, y)
            }
            DisasterKind::Bless => {
                apply_bless(&mut self.world, &mut self.map, &mut self.events, &mut self.rng, x, y)
            }
            DisasterKind::Campfire => {
                apply_campfire(&mut self.world, &self.map, &self.prog, &mut self.events, x, y)
            }
            DisasterKind::Plague => apply_plague(
                &mut self.world,
                &mut self.events,
                &mut self.deaths,
                &mut self.rng,
                x,
                y,
            ),
            DisasterKind::Prophet => apply_prophet(
                &mut self.world,
                &mut self.prog,
                &mut self.events,
                &mut self.rng,
                x,
                y,
            ),
        }
    }

    /// The other narrow channel: tick cadence control.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Immutable view of the simulation for read-only collaborators.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(&self.world, &self.map, &self.prog, &self.events, &self.deaths)
    }

    pub fn population(&self) -> usize {
        self.world.query::<&Human>().iter().count()
    }

    pub fn building_count(&self) -> usize {
        building_count(&self.world)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    pub fn progression(&self) -> &Progression {
        &self.prog
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn death_log(&self) -> &DeathLog {
        &self.deaths
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Campfire, Grave, Position};
    use crate::tilemap::{TileKind, TileMap};
    use havenfall_logic::constants::{CAMPFIRE_FUEL, WORLD_SIZE};

    #[test]
    fn test_engine_boot() {
        let engine = SimulationEngine::with_seed(7);
        assert_eq!(engine.population(), 2);
        assert_eq!(engine.building_count(), 0);
        assert_eq!(engine.progression().calendar.year, 1);
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let mut engine = SimulationEngine::with_seed(7);
        engine.set_paused(true);
        for _ in 0..100 {
            engine.update(0.1);
        }
        assert_eq!(engine.progression().calendar.day_clock, 0.0);
        engine.set_paused(false);
        engine.update(0.1);
        assert!(engine.progression().calendar.day_clock > 0.0);
    }

    #[test]
    fn test_large_frames_are_clamped() {
        let mut engine = SimulationEngine::with_seed(7);
        engine.update(10.0);
        assert!(engine.progression().calendar.day_clock <= MAX_STEP + 0.001);
    }

    #[test]
    fn test_speed_scales_the_step() {
        let mut a = SimulationEngine::with_seed(7);
        let mut b = SimulationEngine::with_seed(7);
        b.set_speed(2.0);
        a.update(0.05);
        b.update(0.05);
        assert!(b.progression().calendar.day_clock > a.progression().calendar.day_clock);
    }

    #[test]
    fn test_invariants_hold_over_many_ticks() {
        let mut engine = SimulationEngine::with_seed(99);
        for _ in 0..2000 {
            engine.update(0.1);
            for tile in engine.map().tiles() {
                assert!((0.0..=1.0).contains(&tile.moisture));
                if tile.kind == TileKind::Water {
                    assert_eq!(tile.resource, 0.0);
                }
            }
            for (_, h) in engine.world().query::<&Human>().iter() {
                assert!(h.hunger >= 0.0, "hunger never negative");
                assert!(h.thirst >= 0.0, "thirst never negative");
            }
            assert!(engine.population() > 0, "extinction recovery keeps life going");
        }
    }

    #[test]
    fn test_extinction_respawn_next_tick() {
        let mut engine = SimulationEngine::with_seed(13);
        let all: Vec<hecs::Entity> = engine
            .world
            .query::<&Human>()
            .iter()
            .map(|(e, _)| e)
            .collect();
        for e in all {
            engine.world.despawn(e).unwrap();
        }
        assert_eq!(engine.population(), 0);

        engine.update(0.1);

        let center = (WORLD_SIZE / 2) as f32;
        let positions: Vec<(f32, f32)> = engine
            .world
            .query::<(&Human, &Position)>()
            .iter()
            .map(|(_, (_, p))| (p.x(), p.y()))
            .collect();
        assert_eq!(positions.len(), 2);
        for (x, y) in positions {
            assert!((x - center).abs() <= 0.2 + 0.001);
            assert!((y - center).abs() <= 0.2 + 0.001);
        }
    }

    #[test]
    fn test_campfire_tool_respects_fire_tech() {
        let mut engine = SimulationEngine::with_seed(17);
        // Find a grass tile to aim at.
        let mut spot = None;
        for y in 0..TileMap::SIZE {
            for x in 0..TileMap::SIZE {
                if engine.map.tile(x, y).kind == TileKind::Grass {
                    spot = Some((x as f32 + 0.5, y as f32 + 0.5));
                }
            }
        }
        let (x, y) = spot.expect("generated world has grass");

        let logs_before = engine.events().len();
        engine.apply_disaster(DisasterKind::Campfire, x, y);
        assert_eq!(engine.world.query::<&Campfire>().iter().count(), 0);
        assert_eq!(engine.events().len(), logs_before + 1);

        engine.prog.tech.fire = true;
        engine.apply_disaster(DisasterKind::Campfire, x, y);
        let fires: Vec<f32> = engine
            .world
            .query::<&Campfire>()
            .iter()
            .map(|(_, c)| c.fuel)
            .collect();
        assert_eq!(fires, vec![CAMPFIRE_FUEL]);
    }

    #[test]
    fn test_quake_tool_leaves_markers_and_no_graves() {
        let mut engine = SimulationEngine::with_seed(23);
        engine.apply_disaster(DisasterKind::Quake, 24.0, 24.0);
        assert!(engine.world.query::<&crate::components::EffectMarker>().iter().count() >= 1);
        // Quake removals are violent disappearances, not burials.
        assert_eq!(engine.world.query::<&Grave>().iter().count(), 0);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut engine = SimulationEngine::with_seed(29);
        for _ in 0..50 {
            engine.update(0.1);
        }
        let snap = engine.snapshot();
        assert_eq!(snap.humans.len(), engine.population());
        assert_eq!(snap.tiles.len(), TileMap::SIZE * TileMap::SIZE);
        assert_eq!(snap.year, engine.progression().calendar.year);
        // The snapshot is serializable for out-of-process consumers.
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"humans\""));
    }
}
