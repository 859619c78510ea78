//! Pure simulation logic for Havenfall.
//!
//! This crate contains all settlement-simulation logic that is independent
//! of any ECS, engine, or runtime. Functions take plain data and return
//! results, making them unit-testable and portable between the core engine
//! and headless tooling.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`buildings`] | Building tiers, cost table, upgrade ordering, tier ladder |
//! | [`calendar`] | Day/month/year clock, daylight curve, night detection |
//! | [`climate`] | Seasonal offset, tile temperature, heat-scaled thirst |
//! | [`constants`] | World size, timing, population caps, log caps |
//! | [`needs`] | Hunger/thirst accrual rates and fatal-threshold checks |
//! | [`progression`] | Settlement score, stage thresholds, gold accrual |
//! | [`steering`] | Straight-line stepping, arrival, separation pushes |

pub mod buildings;
pub mod calendar;
pub mod climate;
pub mod constants;
pub mod needs;
pub mod progression;
pub mod steering;
