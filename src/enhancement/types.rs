use super::error::{EnhanceError, Result};
use crate::constants::{MAX_ENHANCEMENT_LEVEL, MIN_SUCCESS_PROBABILITY};
use crate::pricing::PriceGap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Enhancement tier of an item, 0 (base) to 20.
pub type EnhancementLevel = u8;

/// Reject levels above the maximum.
pub fn check_level(level: EnhancementLevel) -> Result<EnhancementLevel> {
    if level > MAX_ENHANCEMENT_LEVEL {
        return Err(EnhanceError::invalid(format!(
            "level +{} is above the maximum +{}",
            level, MAX_ENHANCEMENT_LEVEL
        )));
    }
    Ok(level)
}

/// Reject targets outside 1..=20.
pub fn check_target(level: EnhancementLevel) -> Result<EnhancementLevel> {
    if level == 0 {
        return Err(EnhanceError::invalid("target level must be at least +1"));
    }
    check_level(level)
}

/// Per-level success probabilities after all bonuses are applied.
///
/// `rate(L)` is the chance that one attempt on a +(L-1) item yields +L.
/// Profiles may cover fewer than 20 levels; asking for a level past the
/// end is an [`EnhanceError::InvalidInput`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessProfile {
    rates: Vec<f64>,
}

impl SuccessProfile {
    /// Build a profile from rates for +1, +2, ... Values are clamped to [0, 1].
    pub fn from_rates(rates: &[f64]) -> Result<Self> {
        if rates.is_empty() {
            return Err(EnhanceError::invalid("success profile has no levels"));
        }
        if rates.len() > MAX_ENHANCEMENT_LEVEL as usize {
            return Err(EnhanceError::invalid(format!(
                "success profile has {} levels, maximum is {}",
                rates.len(),
                MAX_ENHANCEMENT_LEVEL
            )));
        }
        if let Some(idx) = rates.iter().position(|r| !r.is_finite()) {
            return Err(EnhanceError::invalid(format!(
                "success rate for +{} is not a number",
                idx + 1
            )));
        }
        Ok(Self {
            rates: rates.iter().map(|r| r.clamp(0.0, 1.0)).collect(),
        })
    }

    /// Same rate at every level up to the maximum.
    pub fn uniform(rate: f64) -> Result<Self> {
        Self::from_rates(&[rate; MAX_ENHANCEMENT_LEVEL as usize])
    }

    /// Highest level this profile has a rate for.
    pub fn max_level(&self) -> EnhancementLevel {
        self.rates.len() as EnhancementLevel
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    /// Success probability of the attempt that produces `level`.
    pub fn rate(&self, level: EnhancementLevel) -> Result<f64> {
        if level == 0 {
            return Err(EnhanceError::invalid("no attempt produces level +0"));
        }
        self.rates
            .get(level as usize - 1)
            .copied()
            .ok_or_else(|| EnhanceError::invalid(format!("missing success rate for +{}", level)))
    }

    /// Like [`rate`](Self::rate) but fails with `Unreachable` below the probability floor.
    pub fn usable_rate(&self, level: EnhancementLevel) -> Result<f64> {
        let probability = self.rate(level)?;
        if probability < MIN_SUCCESS_PROBABILITY {
            return Err(EnhanceError::Unreachable { level, probability });
        }
        Ok(probability)
    }
}

/// Where a protected failure leaves the item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// The item keeps its current level; only the attempt is lost.
    #[default]
    Hold,
    /// The item loses one level (never below +0).
    DropOne,
}

/// Rule for what a failed attempt costs the item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProtectionPolicy {
    /// 0 = never protect; otherwise attempts targeting this level or higher are protected
    pub threshold: EnhancementLevel,
    #[serde(default)]
    pub fallback: Fallback,
}

impl ProtectionPolicy {
    pub fn never() -> Self {
        Self::default()
    }

    pub fn protect_from(threshold: EnhancementLevel) -> Self {
        Self {
            threshold,
            fallback: Fallback::default(),
        }
    }

    pub fn with_fallback(self, fallback: Fallback) -> Self {
        Self { fallback, ..self }
    }

    /// Whether an attempt aiming at `target` consumes protection when it fails.
    pub fn protects(&self, target: EnhancementLevel) -> bool {
        self.threshold > 0 && target >= self.threshold
    }

    /// Level an item at `current` lands on after a failed attempt.
    pub fn landing(&self, current: EnhancementLevel) -> EnhancementLevel {
        if !self.protects(current + 1) {
            return 0;
        }
        match self.fallback {
            Fallback::Hold => current,
            Fallback::DropOne => current.saturating_sub(1),
        }
    }

    pub fn id(&self) -> PolicyId {
        if self.threshold == 0 {
            PolicyId::Unprotected
        } else {
            PolicyId::ProtectFrom(self.threshold)
        }
    }
}

/// Stable identifier of a standard protection policy, used in comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyId {
    Unprotected,
    ProtectFrom(EnhancementLevel),
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyId::Unprotected => write!(f, "no protection"),
            PolicyId::ProtectFrom(t) => write!(f, "protect from +{}", t),
        }
    }
}

/// Expected totals for raising an item from `start_level` to `target_level`.
/// Every number is an expectation and stays fractional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionResult {
    pub policy: ProtectionPolicy,
    pub start_level: EnhancementLevel,
    pub target_level: EnhancementLevel,
    pub expected_attempts: f64,
    pub expected_protection_uses: f64,
    /// Seconds
    pub expected_time: f64,
    pub material_cost: f64,
    pub protection_cost: f64,
    pub total_cost: f64,
    /// Prices that were missing or fell back to vendor value
    #[serde(default)]
    pub price_gaps: Vec<PriceGap>,
}

impl ProgressionResult {
    /// True when every price the totals depend on came from the market.
    pub fn is_complete(&self) -> bool {
        self.price_gaps.is_empty()
    }

    /// Turn the first price gap into an error, for callers that cannot show partial totals.
    pub fn require_complete(&self) -> Result<&Self> {
        match self.price_gaps.first() {
            Some(gap) => Err(EnhanceError::MissingPriceData {
                item_id: gap.item_id.clone(),
            }),
            None => Ok(self),
        }
    }
}

/// A level the table could not fill in, with the reason shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unavailable {
    pub level: EnhancementLevel,
    pub reason: String,
}

/// Results for +1 upward under one fixed policy.
///
/// Rows stop at the first level that cannot be calculated; every higher
/// level depends on it, so `unavailable` covers the rest of the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostTable {
    pub policy: ProtectionPolicy,
    pub rows: Vec<ProgressionResult>,
    pub unavailable: Option<Unavailable>,
}

impl CostTable {
    pub fn row(&self, level: EnhancementLevel) -> Option<&ProgressionResult> {
        self.rows.iter().find(|r| r.target_level == level)
    }

    pub fn is_complete(&self) -> bool {
        self.unavailable.is_none() && self.rows.iter().all(ProgressionResult::is_complete)
    }
}

/// Winning standard policy at one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyChoice {
    pub policy: PolicyId,
    pub total_cost: f64,
    pub expected_attempts: f64,
    pub complete: bool,
}

/// Alternative recovery item evaluated at one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryStep {
    /// Cost of building this level with the recovery item, if both sources exist
    pub recovery_cost: Option<f64>,
    /// Cost of this level (base item included) without the recovery item
    pub baseline_cost: Option<f64>,
    /// Cheapest of the two; complete paths rank ahead of cheaper partial ones
    pub path_cost: f64,
    pub uses_recovery: bool,
    /// Every price along the chosen path came from the market
    pub complete: bool,
}

/// Cheapest policy at one target level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelChoice {
    pub level: EnhancementLevel,
    /// None when every standard policy is unreachable
    pub best: Option<PolicyChoice>,
    pub recovery: Option<RecoveryStep>,
}

/// Outcome of comparing protection strategies over a range of levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub levels: Vec<LevelChoice>,
    /// First level where the recovery item undercuts the baseline. The
    /// baseline at each level is the cheapest standard policy there (plus
    /// the base item), not one fixed protection threshold.
    pub crossover_level: Option<EnhancementLevel>,
    /// Baseline path cost minus recovery path cost at the last level
    pub cumulative_savings: Option<f64>,
    /// Policies dropped from the search because some level was unreachable
    pub excluded: Vec<PolicyId>,
    /// Recovery item or base item prices that did not come from the market
    #[serde(default)]
    pub recovery_gaps: Vec<PriceGap>,
    /// False when the crossover and savings rest on partial totals
    #[serde(default = "default_true")]
    pub recovery_complete: bool,
}

fn default_true() -> bool {
    true
}

impl StrategyComparison {
    pub fn level(&self, level: EnhancementLevel) -> Option<&LevelChoice> {
        self.levels.iter().find(|c| c.level == level)
    }
}
