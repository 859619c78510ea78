//! Buildings, crops, and the short-lived resource/marker entities.

use havenfall_logic::buildings::BuildingLevel;
use serde::{Deserialize, Serialize};

/// A building or construction site. Created when an agent affords a tier
/// and finds a legal spot; destroyed when disaster damage drains `health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    /// Tier currently standing (for a fresh site, the tier being built).
    pub level: BuildingLevel,
    /// Tier the site will hold once construction finishes.
    pub target_level: BuildingLevel,
    /// Pending upgrade applied on completion, if any.
    pub upgrading_to: Option<BuildingLevel>,
    /// Construction progress, monotone within [0, 1] while building.
    pub progress: f32,
    pub under_construction: bool,
    pub health: f32,
}

impl Building {
    /// A fresh construction site for `level`.
    pub fn site(level: BuildingLevel) -> Self {
        Self {
            level,
            target_level: level,
            upgrading_to: None,
            progress: 0.0,
            under_construction: true,
            health: 1.0,
        }
    }

    /// Begin upgrading a completed building toward `level`.
    /// Progress restarts from zero.
    pub fn start_upgrade(&mut self, level: BuildingLevel) {
        self.upgrading_to = Some(level);
        self.target_level = level;
        self.progress = 0.0;
        self.under_construction = true;
    }

    /// Mark construction finished, applying any pending upgrade tier.
    pub fn complete(&mut self) {
        self.progress = 1.0;
        self.under_construction = false;
        if let Some(next) = self.upgrading_to.take() {
            self.level = next;
        }
    }
}

/// A crop growing on a fertile tile. Cycles growth → harvest → reset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Crop {
    /// Accumulated growth, clamped to [0, 1.4].
    pub growth: f32,
}

impl Crop {
    pub const MAX_GROWTH: f32 = 1.4;

    /// Growth a freshly sown (or just-harvested) crop restarts from.
    pub const RESET_GROWTH: f32 = 0.25;

    pub fn new() -> Self {
        Self { growth: 0.15 }
    }

    pub fn stage(&self) -> CropStage {
        if self.growth > 0.95 {
            CropStage::Ripe
        } else if self.growth > 0.35 {
            CropStage::Sprout
        } else {
            CropStage::Seed
        }
    }
}

impl Default for Crop {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CropStage {
    Seed,
    Sprout,
    Ripe,
}

/// Ground food, consumed on contact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FoodItem {
    pub amount: f32,
}

/// A catchable fish on a water tile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Fish {
    pub size: f32,
}

/// A burning campfire; removed when the fuel runs out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Campfire {
    pub fuel: f32,
}

/// Grave marker left by a death; expires after a fixed lifetime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Grave {
    pub life: f32,
}

/// A wheeled cart, spawned once by the wheel tech. Never removed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Cart {
    pub vx: f32,
    pub vy: f32,
}

/// Timed visual-only radius marker registered by every disaster,
/// consumed solely by rendering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EffectMarker {
    pub kind: EffectKind,
    pub radius: f32,
    pub life: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    Rain,
    Snow,
    Quake,
    Fire,
    Bless,
    Plague,
    Typhoon,
    Prophet,
}
