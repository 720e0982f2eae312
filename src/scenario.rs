//! Snapshot files: everything one refresh needs, as JSON.
//!
//! A scenario bundles the character snapshot, the item's game data, a price
//! table and the advisor configuration. The host writes one per refresh;
//! the `enhance` binary reads it.

use crate::advisor::{value_enhanced_item, GearValuation, RefreshCache};
use crate::config::AdvisorConfig;
use crate::enhancement::{
    CharacterSnapshot, EnhanceError, EnhancementLevel, ItemGameData, RecoveryOption,
    StrategyComparison,
};
use crate::pricing::{price_with_gaps, MarketPrices, PriceGap};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Errors from loading or using a scenario file.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] EnhanceError),
}

/// How the recovery item's cost combines its two source levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CombineSpec {
    /// first + second + item price
    #[default]
    Sum,
    /// first * w1 + second * w2 + item price * w3
    Weighted { first: f64, second: f64, item: f64 },
}

/// Alternative one-shot recovery item, as written in a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoverySpec {
    pub item_id: String,
    #[serde(default = "default_offsets")]
    pub offsets: (EnhancementLevel, EnhancementLevel),
    #[serde(default)]
    pub combine: CombineSpec,
}

fn default_offsets() -> (EnhancementLevel, EnhancementLevel) {
    (1, 2)
}

/// One refresh's worth of inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub character: CharacterSnapshot,
    pub item: ItemGameData,
    #[serde(default)]
    pub prices: MarketPrices,
    #[serde(default)]
    pub config: AdvisorConfig,
    #[serde(default)]
    pub recovery: Option<RecoverySpec>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let json = fs::read_to_string(path)?;
        let scenario = Self::from_json(&json)?;
        tracing::debug!(path = %path.display(), item = %scenario.item.item_id, "loaded scenario");
        Ok(scenario)
    }

    pub fn save(&self, path: &Path) -> Result<(), ScenarioError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Fresh memo cache over this scenario's snapshot.
    pub fn refresh(&self) -> Result<RefreshCache, EnhanceError> {
        RefreshCache::new(&self.character, &self.item, &self.prices, self.config.clone())
    }

    /// Price of the unenhanced item, with a gap when it is not a market price.
    ///
    /// A missing price counts as 0 in partial totals; the gap must travel
    /// with every result built on it.
    pub fn base_item_value(&self) -> (f64, Option<PriceGap>) {
        let mut gaps = Vec::new();
        let value = price_with_gaps(
            &self.prices,
            &self.item.item_id,
            self.config.price_mode,
            &mut gaps,
        );
        (value.unwrap_or(0.0), gaps.pop())
    }

    /// Build the recovery option, priced from the scenario's table.
    ///
    /// Vendor-priced items and unpriced base items are carried as gaps on
    /// the option. Returns None when no recovery item is configured, or
    /// with the gap when the recovery item has no price at all.
    pub fn recovery_option(&self) -> (Option<RecoveryOption>, Option<PriceGap>) {
        let Some(spec) = &self.recovery else {
            return (None, None);
        };
        let mut gaps = Vec::new();
        let price = price_with_gaps(&self.prices, &spec.item_id, self.config.price_mode, &mut gaps);
        let item_gap = gaps.pop();
        let Some(price) = price else {
            return (None, item_gap);
        };
        let (base_value, base_gap) = self.base_item_value();
        let option = RecoveryOption::new(spec.item_id.clone(), price, spec.offsets)
            .with_base_value(base_value)
            .with_base_value_gap(base_gap)
            .with_item_price_gap(item_gap);
        let option = match spec.combine {
            CombineSpec::Sum => option,
            CombineSpec::Weighted { first, second, item } => {
                option.with_rule(move |a: f64, b: f64, p: f64| a * first + b * second + p * item)
            }
        };
        (Some(option), None)
    }

    /// Strategy comparison including the configured recovery item.
    pub fn compare(&self, cache: &mut RefreshCache) -> Result<StrategyComparison, EnhanceError> {
        let (recovery, unpriced) = self.recovery_option();
        let mut comparison = cache.comparison(recovery.as_ref())?;
        if let Some(gap) = unpriced {
            comparison.recovery_gaps.push(gap);
            comparison.recovery_complete = false;
        }
        Ok(comparison)
    }

    /// Value of this item at `level`, flagged incomplete when the item itself has no market price.
    pub fn valuation(
        &self,
        cache: &mut RefreshCache,
        level: EnhancementLevel,
    ) -> Result<GearValuation, EnhanceError> {
        let (base_value, base_gap) = self.base_item_value();
        value_enhanced_item(cache, level, base_value, base_gap)
    }
}
