//! Day/month/year clock and the daylight curve.

use crate::constants::{DAY_LENGTH, MONTH_LENGTH, YEAR_MONTHS};
use serde::{Deserialize, Serialize};

/// Simulation calendar. Day, month and year are 1-based; `day_clock`
/// accumulates seconds within the current day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    pub day_clock: f32,
    pub day: u32,
    pub month: u32,
    pub year: u32,
}

impl Default for Calendar {
    fn default() -> Self {
        Self {
            day_clock: 0.0,
            day: 1,
            month: 1,
            year: 1,
        }
    }
}

impl Calendar {
    /// Advance the clock, rolling over days, months and years.
    pub fn advance(&mut self, dt: f32) {
        self.day_clock += dt;
        while self.day_clock >= DAY_LENGTH {
            self.day_clock -= DAY_LENGTH;
            self.day += 1;
            if self.day > MONTH_LENGTH {
                self.day = 1;
                self.month += 1;
                if self.month > YEAR_MONTHS {
                    self.month = 1;
                    self.year += 1;
                }
            }
        }
    }

    /// Fraction of the current day elapsed, [0, 1).
    pub fn day_progress(&self) -> f32 {
        self.day_clock / DAY_LENGTH
    }

    /// Ambient light level [0.35, 1.0]; dawn at the start of the day,
    /// darkest at the wrap-around.
    pub fn light(&self) -> f32 {
        let t = self.day_progress() * std::f32::consts::TAU;
        0.35 + 0.65 * (0.5 + 0.5 * (t - std::f32::consts::FRAC_PI_2).sin())
    }

    /// Night begins when ambient light drops below 0.45.
    pub fn is_night(&self) -> bool {
        self.light() < 0.45
    }
}
