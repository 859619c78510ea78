//! Havenfall Core - Settlement Simulation Engine
//!
//! An ECS-based simulation of an emergent settlement: autonomous humans
//! competing for food and water on a procedurally generated tile world,
//! raising and upgrading buildings, unlocking technologies, and weathering
//! player-triggered or spontaneous disasters.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Humans, animals, buildings, crops, food, campfires, graves
//! - **Components**: Pure data attached to entities (Position, Human, Building, etc.)
//! - **Systems**: Logic that queries and updates components once per tick
//!
//! The tile grid, calendar, progression flags and event log live beside the
//! ECS world on the engine; rendering and UI are external collaborators that
//! only read [`snapshot::WorldSnapshot`] and call the two narrow channels:
//! disaster invocation and pause/speed control.
//!
//! # Example
//!
//! ```rust,no_run
//! use havenfall_core::prelude::*;
//!
//! let mut engine = SimulationEngine::new();
//!
//! // Run simulation
//! loop {
//!     engine.update(1.0 / 60.0); // 60 FPS
//! }
//! ```

pub mod components;
pub mod engine;
pub mod generation;
pub mod log;
pub mod snapshot;
pub mod systems;
pub mod tilemap;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::{DisasterKind, SimulationEngine};
    pub use crate::tilemap::{Tile, TileKind, TileMap};
}
