//! Wild animal components.

use serde::{Deserialize, Serialize};

/// A wild animal. Hunted animals are marked `alive = false` and retained;
/// every system skips dead entries rather than removing them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Animal {
    pub kind: AnimalKind,
    /// Heading in radians.
    pub heading: f32,
    /// Wander speed, tiles per second.
    pub speed: f32,
    pub hunger: f32,
    pub alive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimalKind {
    Deer,
    Boar,
}
