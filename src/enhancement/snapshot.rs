//! Immutable inputs captured by the host before each calculation.

use serde::{Deserialize, Serialize};

/// A consumable the character may have running (teas, buffs).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumableEffect {
    pub id: String,
    #[serde(default)]
    pub active: bool,
    /// Additive success bonus, percentage points
    #[serde(default)]
    pub success_pct: f64,
    /// Additive action-speed bonus, percent
    #[serde(default)]
    pub speed_pct: f64,
}

/// Bonus percentages from one source family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BonusSource {
    #[serde(default)]
    pub success_pct: f64,
    #[serde(default)]
    pub speed_pct: f64,
}

/// Everything about the character the engine needs, frozen at capture time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterSnapshot {
    pub enhancing_level: u32,
    #[serde(default)]
    pub equipment: BonusSource,
    #[serde(default)]
    pub house: BonusSource,
    #[serde(default)]
    pub community: BonusSource,
    #[serde(default)]
    pub consumables: Vec<ConsumableEffect>,
}

impl CharacterSnapshot {
    pub fn new(enhancing_level: u32) -> Self {
        Self {
            enhancing_level,
            ..Default::default()
        }
    }

    fn active_consumables(&self) -> impl Iterator<Item = &ConsumableEffect> {
        self.consumables.iter().filter(|c| c.active)
    }

    /// Levels the character has over the item; never negative.
    pub fn level_advantage(&self, item_level: u32) -> u32 {
        self.enhancing_level.saturating_sub(item_level)
    }

    /// Sum of flat success bonuses (percentage points), excluding level advantage.
    pub fn success_bonus_pct(&self) -> f64 {
        self.equipment.success_pct
            + self.house.success_pct
            + self.community.success_pct
            + self.active_consumables().map(|c| c.success_pct).sum::<f64>()
    }

    /// Sum of speed bonuses (percent), excluding level advantage.
    pub fn speed_bonus_pct(&self) -> f64 {
        self.equipment.speed_pct
            + self.house.speed_pct
            + self.community.speed_pct
            + self.active_consumables().map(|c| c.speed_pct).sum::<f64>()
    }
}

/// Units of one item consumed by every attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRequirement {
    pub item_id: String,
    pub count: f64,
}

/// Static game data for the item being enhanced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemGameData {
    pub item_id: String,
    pub item_level: u32,
    /// Base success rate for +1, +2, ... before bonuses
    pub base_curve: Vec<f64>,
    #[serde(default)]
    pub materials: Vec<MaterialRequirement>,
    /// Item consumed by each protected failure
    #[serde(default)]
    pub protection_item: Option<String>,
    #[serde(default = "default_action_seconds")]
    pub base_action_seconds: f64,
}

fn default_action_seconds() -> f64 {
    crate::constants::DEFAULT_BASE_ACTION_SECONDS
}
