//! Read-only snapshot surface consumed by rendering/UI collaborators.
//!
//! A [`WorldSnapshot`] is a serializable copy of everything the outer
//! layers may display. Nothing here can reach back into the simulation.

use crate::components::*;
use crate::log::{DeathLog, EventLog};
use crate::systems::{Progression, StageFlags, TechFlags};
use crate::tilemap::{Tile, TileMap};
use havenfall_logic::buildings::BuildingLevel;
use havenfall_logic::progression::settlement_score;
use hecs::World;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct HumanView {
    pub x: f32,
    pub y: f32,
    pub gender: Gender,
    pub age: f32,
    pub hunger: f32,
    pub thirst: f32,
    pub sick: bool,
    pub profession: Option<Profession>,
    pub state: AgentState,
    pub action: ActionMarker,
    pub facing: f32,
    pub moving: bool,
    pub has_build_task: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnimalView {
    pub x: f32,
    pub y: f32,
    pub kind: AnimalKind,
    pub alive: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildingView {
    pub x: f32,
    pub y: f32,
    pub level: BuildingLevel,
    pub target_level: BuildingLevel,
    pub progress: f32,
    pub under_construction: bool,
    pub health: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    pub x: f32,
    pub y: f32,
    pub amount: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CropView {
    pub x: f32,
    pub y: f32,
    pub growth: f32,
    pub stage: CropStage,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectView {
    pub x: f32,
    pub y: f32,
    pub kind: EffectKind,
    pub radius: f32,
    pub life: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallView {
    pub x: f32,
    pub y: f32,
    pub ttl: f32,
}

/// One immutable frame of the simulation.
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub day: u32,
    pub month: u32,
    pub year: u32,
    pub light: f32,
    pub night: bool,
    pub gold: f32,
    pub faith: f32,
    pub score: f32,
    pub tech: TechFlags,
    pub stages: StageFlags,
    pub tribe_formed: bool,
    pub diplomacy: bool,
    pub world_size: usize,
    pub tiles: Vec<Tile>,
    pub humans: Vec<HumanView>,
    pub animals: Vec<AnimalView>,
    pub buildings: Vec<BuildingView>,
    pub foods: Vec<ItemView>,
    pub fish: Vec<ItemView>,
    pub campfires: Vec<ItemView>,
    pub graves: Vec<ItemView>,
    pub crops: Vec<CropView>,
    pub carts: Vec<ItemView>,
    pub effects: Vec<EffectView>,
    pub call: Option<CallView>,
    pub events: Vec<String>,
    pub deaths: Vec<String>,
}

impl WorldSnapshot {
    pub fn capture(
        world: &World,
        map: &TileMap,
        prog: &Progression,
        events: &EventLog,
        deaths: &DeathLog,
    ) -> Self {
        let humans: Vec<HumanView> = world
            .query::<(&Human, &Position, &AgentState)>()
            .iter()
            .map(|(e, (h, p, s))| HumanView {
                x: p.x(),
                y: p.y(),
                gender: h.gender,
                age: h.age,
                hunger: h.hunger,
                thirst: h.thirst,
                sick: h.sick,
                profession: h.profession,
                state: *s,
                action: h.action,
                facing: h.facing,
                moving: h.moving,
                has_build_task: world.get::<&BuildTask>(e).is_ok(),
            })
            .collect();

        let buildings: Vec<BuildingView> = world
            .query::<(&Building, &Position)>()
            .iter()
            .map(|(_, (b, p))| BuildingView {
                x: p.x(),
                y: p.y(),
                level: b.level,
                target_level: b.target_level,
                progress: b.progress,
                under_construction: b.under_construction,
                health: b.health,
            })
            .collect();

        Self {
            day: prog.calendar.day,
            month: prog.calendar.month,
            year: prog.calendar.year,
            light: prog.light,
            night: prog.night,
            gold: prog.gold,
            faith: prog.faith,
            score: settlement_score(humans.len(), buildings.len()),
            tech: prog.tech,
            stages: prog.stages,
            tribe_formed: prog.tribe_formed,
            diplomacy: prog.diplomacy,
            world_size: TileMap::SIZE,
            tiles: map.tiles().to_vec(),
            humans,
            animals: world
                .query::<(&Animal, &Position)>()
                .iter()
                .map(|(_, (a, p))| AnimalView {
                    x: p.x(),
                    y: p.y(),
                    kind: a.kind,
                    alive: a.alive,
                })
                .collect(),
            buildings,
            foods: world
                .query::<(&FoodItem, &Position)>()
                .iter()
                .map(|(_, (f, p))| ItemView {
                    x: p.x(),
                    y: p.y(),
                    amount: f.amount,
                })
                .collect(),
            fish: world
                .query::<(&Fish, &Position)>()
                .iter()
                .map(|(_, (f, p))| ItemView {
                    x: p.x(),
                    y: p.y(),
                    amount: f.size,
                })
                .collect(),
            campfires: world
                .query::<(&Campfire, &Position)>()
                .iter()
                .map(|(_, (c, p))| ItemView {
                    x: p.x(),
                    y: p.y(),
                    amount: c.fuel,
                })
                .collect(),
            graves: world
                .query::<(&Grave, &Position)>()
                .iter()
                .map(|(_, (g, p))| ItemView {
                    x: p.x(),
                    y: p.y(),
                    amount: g.life,
                })
                .collect(),
            crops: world
                .query::<(&Crop, &Position)>()
                .iter()
                .map(|(_, (c, p))| CropView {
                    x: p.x(),
                    y: p.y(),
                    growth: c.growth,
                    stage: c.stage(),
                })
                .collect(),
            carts: world
                .query::<(&Cart, &Position)>()
                .iter()
                .map(|(_, (_, p))| ItemView {
                    x: p.x(),
                    y: p.y(),
                    amount: 0.0,
                })
                .collect(),
            effects: world
                .query::<(&EffectMarker, &Position)>()
                .iter()
                .map(|(_, (fx, p))| EffectView {
                    x: p.x(),
                    y: p.y(),
                    kind: fx.kind,
                    radius: fx.radius,
                    life: fx.life,
                })
                .collect(),
            call: prog.active_call().map(|c| CallView {
                x: c.pos.x,
                y: c.pos.y,
                ttl: c.ttl,
            }),
            events: events.entries().to_vec(),
            deaths: deaths.entries().to_vec(),
        }
    }
}
