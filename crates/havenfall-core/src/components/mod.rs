//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior - that lives in systems.

mod common;
mod people;
mod structures;
mod wildlife;

pub use common::*;
pub use people::*;
pub use structures::*;
pub use wildlife::*;
