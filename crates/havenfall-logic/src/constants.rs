//! Simulation constants — world size, timing, caps.
//!
//! Both the core engine and the native simtest use these.

/// World grid is square, WORLD_SIZE x WORLD_SIZE tiles.
pub const WORLD_SIZE: usize = 48;

/// Seconds of simulated time per in-world day.
pub const DAY_LENGTH: f32 = 22.0;

/// Days per month.
pub const MONTH_LENGTH: u32 = 30;

/// Months per year.
pub const YEAR_MONTHS: u32 = 12;

/// Largest single step the engine will integrate; larger frames are clamped.
pub const MAX_STEP: f32 = 0.12;

/// Hard population ceiling; reproduction stops at this count.
pub const MAX_POPULATION: usize = 800;

/// Gold demanded from a visitor before admission.
pub const VISA_COST: f32 = 8.0;

/// Starting treasury.
pub const STARTING_GOLD: f32 = 50.0;

/// Event log keeps this many lines, newest first.
pub const EVENT_LOG_CAP: usize = 40;

/// Death log keeps this many lines, newest first.
pub const DEATH_LOG_CAP: usize = 12;

/// Seconds a grave marker persists.
pub const GRAVE_LIFE: f32 = 160.0;

/// Fuel a fresh campfire starts with; it burns at [`CAMPFIRE_BURN_RATE`].
pub const CAMPFIRE_FUEL: f32 = 120.0;

/// Campfire fuel consumed per second.
pub const CAMPFIRE_BURN_RATE: f32 = 5.0;

/// Seconds a prophet call keeps pulling agents toward its anchor.
pub const PROPHET_CALL_TTL: f32 = 55.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_constants_consistent() {
        // A year must be a whole number of day-lengths.
        let year_seconds = DAY_LENGTH * (MONTH_LENGTH * YEAR_MONTHS) as f32;
        assert!(year_seconds > 0.0);
        assert!(MAX_STEP < DAY_LENGTH);
    }

    #[test]
    fn test_log_caps_positive() {
        assert!(EVENT_LOG_CAP > DEATH_LOG_CAP);
        assert!(DEATH_LOG_CAP > 0);
    }
}
