//! Advisor configuration.

use crate::constants::{MAX_ENHANCEMENT_LEVEL, MIN_PROTECT_LEVEL};
use crate::enhancement::{candidate_policies, EnhanceError, Fallback, ProtectionPolicy, Result};
use crate::pricing::PriceMode;
use serde::{Deserialize, Serialize};

/// Knobs shared by every consumer of one refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Highest level tables and comparisons go up to (1-20)
    pub max_target: u8,

    /// Order-book side used to value materials and protection
    pub price_mode: PriceMode,

    /// Where protected failures land
    pub fallback: Fallback,

    /// Lowest "protect from" threshold to compare, at least +2
    pub min_protect_level: u8,

    /// Threshold the advice table is shown for (0 = never protect)
    pub protect_from: u8,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            max_target: MAX_ENHANCEMENT_LEVEL,
            price_mode: PriceMode::Ask,
            fallback: Fallback::Hold,
            min_protect_level: MIN_PROTECT_LEVEL,
            protect_from: 0,
        }
    }
}

impl AdvisorConfig {
    /// Short table for a quick look at the first few levels
    pub fn quick_check(max_target: u8) -> Self {
        Self {
            max_target,
            ..Default::default()
        }
    }

    /// Sell-side prices, as used when valuing owned gear
    pub fn net_worth() -> Self {
        Self {
            price_mode: PriceMode::Bid,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_target == 0 || self.max_target > MAX_ENHANCEMENT_LEVEL {
            return Err(EnhanceError::invalid(format!(
                "max target must be between +1 and +{}",
                MAX_ENHANCEMENT_LEVEL
            )));
        }
        if self.min_protect_level < MIN_PROTECT_LEVEL {
            return Err(EnhanceError::invalid(format!(
                "minimum protect level must be at least +{}",
                MIN_PROTECT_LEVEL
            )));
        }
        if self.protect_from > MAX_ENHANCEMENT_LEVEL {
            return Err(EnhanceError::invalid("protect-from level is above the maximum"));
        }
        Ok(())
    }

    /// Policy the advice table uses.
    pub fn table_policy(&self) -> ProtectionPolicy {
        ProtectionPolicy::protect_from(self.protect_from).with_fallback(self.fallback)
    }

    /// Policies the comparator searches.
    pub fn candidates(&self) -> Vec<ProtectionPolicy> {
        candidate_policies(self.max_target, self.fallback)
            .into_iter()
            .filter(|p| p.threshold == 0 || p.threshold >= self.min_protect_level)
            .collect()
    }
}
