//! Comparing protection strategies level by level.
//!
//! Standard policies are ranked per level with one rule: complete results
//! before incomplete ones, then lower total cost, then fewer expected
//! attempts, then the order the candidates were given in. A policy with an
//! unreachable level drops out of the search from that level on. The
//! recovery-item path is ranked the same way: complete first, then cost.

use super::cost::{cost_table, CostBasis};
use super::error::{EnhanceError, Result};
use super::types::{
    CostTable, EnhancementLevel, Fallback, LevelChoice, PolicyChoice, PolicyId,
    ProgressionResult, ProtectionPolicy, RecoveryStep, StrategyComparison, SuccessProfile,
};
use crate::constants::MIN_PROTECT_LEVEL;
use crate::pricing::PriceGap;
use std::cmp::Ordering;
use std::fmt;

/// How a one-shot recovery item turns two cheaper items into the next level.
///
/// `first` and `second` are path costs at the two source levels (base item
/// included); the result is the path cost of the produced level.
pub trait CombineRule {
    fn combine(&self, first: f64, second: f64, item_price: f64) -> f64;
}

/// Both source items plus one recovery item are consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SumWithItem;

impl CombineRule for SumWithItem {
    fn combine(&self, first: f64, second: f64, item_price: f64) -> f64 {
        first + second + item_price
    }
}

impl<F> CombineRule for F
where
    F: Fn(f64, f64, f64) -> f64,
{
    fn combine(&self, first: f64, second: f64, item_price: f64) -> f64 {
        self(first, second, item_price)
    }
}

/// An alternative item that rebuilds level L from levels L-a and L-b.
pub struct RecoveryOption {
    pub item_id: String,
    pub item_price: f64,
    /// Offsets a and b below the produced level; both at least 1
    pub offsets: (EnhancementLevel, EnhancementLevel),
    /// Value of an unenhanced item, the path cost of +0
    pub base_item_value: f64,
    /// Set when `item_price` is a vendor fallback
    pub item_price_gap: Option<PriceGap>,
    /// Set when `base_item_value` is a vendor fallback or a missing price
    pub base_value_gap: Option<PriceGap>,
    pub rule: Box<dyn CombineRule>,
}

impl fmt::Debug for RecoveryOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveryOption")
            .field("item_id", &self.item_id)
            .field("item_price", &self.item_price)
            .field("offsets", &self.offsets)
            .field("base_item_value", &self.base_item_value)
            .field("item_price_gap", &self.item_price_gap)
            .field("base_value_gap", &self.base_value_gap)
            .finish_non_exhaustive()
    }
}

impl RecoveryOption {
    pub fn new(
        item_id: impl Into<String>,
        item_price: f64,
        offsets: (EnhancementLevel, EnhancementLevel),
    ) -> Self {
        Self {
            item_id: item_id.into(),
            item_price,
            offsets,
            base_item_value: 0.0,
            item_price_gap: None,
            base_value_gap: None,
            rule: Box::new(SumWithItem),
        }
    }

    pub fn with_base_value(mut self, base_item_value: f64) -> Self {
        self.base_item_value = base_item_value;
        self
    }

    pub fn with_item_price_gap(mut self, gap: Option<PriceGap>) -> Self {
        self.item_price_gap = gap;
        self
    }

    pub fn with_base_value_gap(mut self, gap: Option<PriceGap>) -> Self {
        self.base_value_gap = gap;
        self
    }

    pub fn with_rule(mut self, rule: impl CombineRule + 'static) -> Self {
        self.rule = Box::new(rule);
        self
    }

    fn validate(&self) -> Result<()> {
        let (a, b) = self.offsets;
        if a == 0 || b == 0 {
            return Err(EnhanceError::invalid("recovery offsets must be at least 1"));
        }
        if !self.item_price.is_finite() || self.item_price < 0.0 {
            return Err(EnhanceError::invalid(format!(
                "recovery item '{}' has an invalid price",
                self.item_id
            )));
        }
        if !self.base_item_value.is_finite() || self.base_item_value < 0.0 {
            return Err(EnhanceError::invalid(
                "base item value must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// "Never protect" plus "protect from t" for every t the comparator considers.
pub fn candidate_policies(
    max_target: EnhancementLevel,
    fallback: Fallback,
) -> Vec<ProtectionPolicy> {
    std::iter::once(ProtectionPolicy::never())
        .chain(
            (MIN_PROTECT_LEVEL..=max_target)
                .map(|t| ProtectionPolicy::protect_from(t).with_fallback(fallback)),
        )
        .collect()
}

/// Complete before incomplete, then cheaper. `Less` wins.
fn complete_then_cheaper(a: (bool, f64), b: (bool, f64)) -> Ordering {
    b.0.cmp(&a.0).then_with(|| a.1.total_cmp(&b.1))
}

/// Rank two results by the tie-break rule. `Less` wins.
pub(crate) fn rank(a: &ProgressionResult, b: &ProgressionResult) -> Ordering {
    complete_then_cheaper(
        (a.is_complete(), a.total_cost),
        (b.is_complete(), b.total_cost),
    )
    .then_with(|| a.expected_attempts.total_cmp(&b.expected_attempts))
}

/// Cheapest standard policy at `level`, or None if every table stops earlier.
pub fn best_at(tables: &[CostTable], level: EnhancementLevel) -> Option<PolicyChoice> {
    tables
        .iter()
        .filter_map(|t| t.row(level))
        // min_by keeps the first of equal elements, which preserves candidate order
        .min_by(|a, b| rank(a, b))
        .map(|r| PolicyChoice {
            policy: r.policy.id(),
            total_cost: r.total_cost,
            expected_attempts: r.expected_attempts,
            complete: r.is_complete(),
        })
}

/// Cost of holding a +k item on the cheapest known path.
#[derive(Debug, Clone, Copy)]
struct PathCost {
    cost: f64,
    complete: bool,
}

impl PathCost {
    fn key(self) -> (bool, f64) {
        (self.complete, self.cost)
    }
}

/// Compare precomputed cost tables over +1..=`max_target`.
pub fn compare_tables(
    tables: &[CostTable],
    max_target: EnhancementLevel,
    recovery: Option<&RecoveryOption>,
) -> Result<StrategyComparison> {
    if let Some(option) = recovery {
        option.validate()?;
    }

    let excluded: Vec<PolicyId> = tables
        .iter()
        .filter(|t| t.unavailable.as_ref().is_some_and(|u| u.level <= max_target))
        .map(|t| t.policy.id())
        .collect();
    for policy in &excluded {
        tracing::warn!(%policy, "policy excluded: a level is unreachable");
    }

    let mut levels = Vec::with_capacity(max_target as usize);
    // path[k]: cheapest known cost of holding a +k item, base item included
    let mut path: Vec<Option<PathCost>> = vec![recovery.map(|r| PathCost {
        cost: r.base_item_value,
        complete: r.base_value_gap.is_none(),
    })];
    let mut crossover_level = None;
    let mut recovery_complete = true;

    for level in 1..=max_target {
        let best = best_at(tables, level);
        let recovery_step = recovery.and_then(|option| {
            let baseline = best.as_ref().map(|b| PathCost {
                cost: option.base_item_value + b.total_cost,
                complete: option.base_value_gap.is_none() && b.complete,
            });
            let built = recovery_cost(option, &path, level);
            let (chosen, uses_recovery) = match (baseline, built) {
                (Some(base), Some(alt))
                    if complete_then_cheaper(alt.key(), base.key()) == Ordering::Less =>
                {
                    (alt, true)
                }
                (Some(base), _) => (base, false),
                (None, Some(alt)) => (alt, true),
                (None, None) => {
                    path.push(None);
                    return None;
                }
            };
            path.push(Some(chosen));
            if uses_recovery && crossover_level.is_none() {
                crossover_level = Some(level);
            }
            if !chosen.complete || baseline.is_some_and(|b| !b.complete) {
                recovery_complete = false;
            }
            Some(RecoveryStep {
                recovery_cost: built.map(|b| b.cost),
                baseline_cost: baseline.map(|b| b.cost),
                path_cost: chosen.cost,
                uses_recovery,
                complete: chosen.complete,
            })
        });
        levels.push(LevelChoice {
            level,
            best,
            recovery: recovery_step,
        });
    }

    let cumulative_savings = recovery.and_then(|option| {
        let last = levels.last()?;
        let baseline = option.base_item_value + last.best.as_ref()?.total_cost;
        let path_cost = last.recovery.as_ref()?.path_cost;
        Some(baseline - path_cost)
    });

    let recovery_gaps: Vec<PriceGap> = recovery
        .into_iter()
        .flat_map(|r| r.item_price_gap.iter().chain(r.base_value_gap.iter()))
        .cloned()
        .collect();
    if !recovery_complete {
        tracing::warn!(?crossover_level, "recovery comparison rests on partial totals");
    }
    if let Some(level) = crossover_level {
        tracing::debug!(level, ?cumulative_savings, "recovery item crossover");
    }

    Ok(StrategyComparison {
        levels,
        crossover_level,
        cumulative_savings,
        excluded,
        recovery_gaps,
        recovery_complete,
    })
}

/// Solve every candidate policy and compare the resulting tables.
pub fn compare_strategies(
    profile: &SuccessProfile,
    basis: &CostBasis,
    candidates: &[ProtectionPolicy],
    max_target: EnhancementLevel,
    recovery: Option<&RecoveryOption>,
) -> Result<StrategyComparison> {
    let tables = candidates
        .iter()
        .map(|policy| cost_table(profile, basis, *policy, max_target))
        .collect::<Result<Vec<_>>>()?;
    compare_tables(&tables, max_target, recovery)
}

/// Path cost of building `level` with the recovery item, if both sources are known.
fn recovery_cost(
    option: &RecoveryOption,
    path: &[Option<PathCost>],
    level: EnhancementLevel,
) -> Option<PathCost> {
    let (a, b) = option.offsets;
    let first = path.get(level.checked_sub(a)? as usize).copied().flatten()?;
    let second = path.get(level.checked_sub(b)? as usize).copied().flatten()?;
    let cost = option.rule.combine(first.cost, second.cost, option.item_price);
    cost.is_finite().then_some(PathCost {
        cost,
        complete: first.complete && second.complete && option.item_price_gap.is_none(),
    })
}
