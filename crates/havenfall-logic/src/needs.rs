//! Hunger/thirst accrual rates and the fatal-threshold check.

use serde::{Deserialize, Serialize};

/// Needs cap; reaching it is fatal.
pub const FATAL_NEED: f32 = 100.0;

/// Age beyond which an agent dies of old age.
pub const FATAL_AGE: f32 = 95.0;

/// Hunger accrued per second in the open.
pub const HUNGER_RATE_EXPOSED: f32 = 0.9;

/// Hunger accrued per second within shelter range of a completed building.
pub const HUNGER_RATE_SHELTERED: f32 = 0.45;

/// Extra hunger and thirst per second while sick.
pub const SICKNESS_PENALTY: f32 = 0.8;

/// Hunger relief per second near an active campfire (also the relief the
/// summoned prophet enjoys on both needs).
pub const CAMPFIRE_RELIEF: f32 = 2.4;

/// Distance within which a completed building counts as shelter.
pub const SHELTER_RANGE: f32 = 2.4;

/// Distance within which a campfire warms an agent.
pub const CAMPFIRE_RANGE: f32 = 2.1;

/// Why an agent died. Ordering is the reporting priority: an agent past
/// several thresholds at once is recorded under the first matching cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Starvation,
    Dehydration,
    OldAge,
    Plague,
}

impl DeathCause {
    pub fn label(self) -> &'static str {
        match self {
            Self::Starvation => "starvation",
            Self::Dehydration => "dehydration",
            Self::OldAge => "old age",
            Self::Plague => "plague",
        }
    }
}

/// Hunger accrual per second given shelter.
pub fn hunger_rate(sheltered: bool) -> f32 {
    if sheltered {
        HUNGER_RATE_SHELTERED
    } else {
        HUNGER_RATE_EXPOSED
    }
}

/// Check the fatal thresholds. Priority: hunger, then thirst, then age.
pub fn fatal_cause(hunger: f32, thirst: f32, age: f32) -> Option<DeathCause> {
    if hunger >= FATAL_NEED {
        Some(DeathCause::Starvation)
    } else if thirst >= FATAL_NEED {
        Some(DeathCause::Dehydration)
    } else if age > FATAL_AGE {
        Some(DeathCause::OldAge)
    } else {
        None
    }
}
