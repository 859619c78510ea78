//! Building tiers — cost table, upgrade ordering, and the tier ladder
//! that maps settlement score to the next structure worth raising.

use serde::{Deserialize, Serialize};

/// Construction tier of a building. The residential line upgrades
/// Hut → House → Apartment → Tower → Mall; CityHall and Jail stand alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingLevel {
    Hut,
    House,
    Apartment,
    Tower,
    Mall,
    CityHall,
    Jail,
}

/// Wood and stone an agent must carry before initiating a tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildCost {
    pub wood: f32,
    pub stone: f32,
}

impl BuildingLevel {
    pub fn all() -> &'static [BuildingLevel] {
        &[
            Self::Hut,
            Self::House,
            Self::Apartment,
            Self::Tower,
            Self::Mall,
            Self::CityHall,
            Self::Jail,
        ]
    }

    /// Resource cost, debited in full when construction or upgrade begins.
    pub fn cost(self) -> BuildCost {
        match self {
            Self::Hut => BuildCost { wood: 4.0, stone: 2.0 },
            Self::House => BuildCost { wood: 7.0, stone: 4.0 },
            Self::Apartment => BuildCost { wood: 12.0, stone: 10.0 },
            Self::Tower => BuildCost { wood: 20.0, stone: 24.0 },
            Self::Mall => BuildCost { wood: 16.0, stone: 14.0 },
            Self::CityHall => BuildCost { wood: 14.0, stone: 12.0 },
            Self::Jail => BuildCost { wood: 12.0, stone: 12.0 },
        }
    }

    /// The tier a building must already hold to be upgraded into this one.
    /// Standalone tiers (and Hut) are never upgrade targets.
    pub fn upgrade_source(self) -> Option<BuildingLevel> {
        match self {
            Self::House => Some(Self::Hut),
            Self::Apartment => Some(Self::House),
            Self::Tower => Some(Self::Apartment),
            Self::Mall => Some(Self::Tower),
            _ => None,
        }
    }

    /// Build cooldown imposed on the initiating agent, in seconds.
    /// Big structures keep the builder committed for longer.
    pub fn upgrade_cooldown(self) -> f32 {
        match self {
            Self::Tower | Self::Mall => 18.0,
            _ => 8.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hut => "hut",
            Self::House => "house",
            Self::Apartment => "apartment",
            Self::Tower => "tower",
            Self::Mall => "mall",
            Self::CityHall => "city hall",
            Self::Jail => "jail",
        }
    }
}

/// Cooldown after placing a brand-new site.
pub const NEW_SITE_COOLDOWN: f32 = 18.0;

/// Minimum clearance between a new site and every existing building.
pub const SITE_CLEARANCE: f32 = 1.5;

/// While the settlement has fewer buildings than this, agents accrue
/// wood and stone passively (bootstrap phase).
pub const PASSIVE_GAIN_BUILDING_CAP: usize = 12;

/// Passive wood/stone gain per second during the bootstrap phase.
pub const PASSIVE_GAIN_RATE: f32 = 2.5;

/// The tier the settlement currently aspires to, from the raw (unclamped)
/// settlement score. A missing city hall overrides the ladder once the
/// settlement is established.
pub fn desired_level(score: f32, has_city_hall: bool) -> BuildingLevel {
    let mut desired = BuildingLevel::Hut;
    if score > 0.15 {
        desired = BuildingLevel::House;
    }
    if score > 0.3 {
        desired = BuildingLevel::Apartment;
    }
    if score > 0.55 {
        desired = BuildingLevel::Tower;
    }
    if score > 0.7 {
        desired = BuildingLevel::Mall;
    }
    if score > 0.6 && !has_city_hall {
        desired = BuildingLevel::CityHall;
    }
    desired
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_table_complete() {
        for &level in BuildingLevel::all() {
            let cost = level.cost();
            assert!(cost.wood > 0.0 && cost.stone > 0.0, "{:?}", level);
        }
    }

    #[test]
    fn test_upgrade_chain() {
        assert_eq!(BuildingLevel::House.upgrade_source(), Some(BuildingLevel::Hut));
        assert_eq!(BuildingLevel::Apartment.upgrade_source(), Some(BuildingLevel::House));
        assert_eq!(BuildingLevel::Tower.upgrade_source(), Some(BuildingLevel::Apartment));
        assert_eq!(BuildingLevel::Mall.upgrade_source(), Some(BuildingLevel::Tower));
        assert_eq!(BuildingLevel::Hut.upgrade_source(), None);
        assert_eq!(BuildingLevel::CityHall.upgrade_source(), None);
        assert_eq!(BuildingLevel::Jail.upgrade_source(), None);
    }

    #[test]
    fn test_desired_level_ladder() {
        assert_eq!(desired_level(0.0, true), BuildingLevel::Hut);
        assert_eq!(desired_level(0.2, true), BuildingLevel::House);
        assert_eq!(desired_level(0.4, true), BuildingLevel::Apartment);
        assert_eq!(desired_level(0.6, true), BuildingLevel::Tower);
        assert_eq!(desired_level(0.8, true), BuildingLevel::Mall);
    }

    #[test]
    fn test_city_hall_overrides_ladder() {
        assert_eq!(desired_level(0.65, false), BuildingLevel::CityHall);
        assert_eq!(desired_level(0.65, true), BuildingLevel::Tower);
        // Below the threshold the ladder stands even without a city hall.
        assert_eq!(desired_level(0.4, false), BuildingLevel::Apartment);
    }

    #[test]
    fn test_upgrade_cooldowns() {
        assert_eq!(BuildingLevel::Tower.upgrade_cooldown(), 18.0);
        assert_eq!(BuildingLevel::Mall.upgrade_cooldown(), 18.0);
        assert_eq!(BuildingLevel::House.upgrade_cooldown(), 8.0);
    }
}
