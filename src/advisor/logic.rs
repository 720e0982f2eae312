use super::cache::RefreshCache;
use crate::enhancement::strategy::rank;
use crate::enhancement::{
    check_target, EnhanceError, EnhancementLevel, PolicyId, ProgressionResult, ProtectionPolicy,
    Result,
};
use crate::pricing::PriceGap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Worth of an item already enhanced to `level`: the base item plus the
/// cheapest expected cost of getting it there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearValuation {
    pub level: EnhancementLevel,
    pub policy: PolicyId,
    pub base_item_value: f64,
    pub enhancement_cost: f64,
    pub total_value: f64,
    /// Set when the base item has no market price
    #[serde(default)]
    pub base_gap: Option<PriceGap>,
    pub complete: bool,
}

/// Value gear at its cheapest reachable-path cost over the configured candidates.
///
/// Candidates are ranked like the strategy comparator ranks them. If no
/// candidate can reach `level`, the first candidate's error is returned.
/// `base_gap` marks a base value that did not come from the market; the
/// valuation is then incomplete whatever the enhancing cost.
pub fn value_enhanced_item(
    cache: &mut RefreshCache,
    level: EnhancementLevel,
    base_item_value: f64,
    base_gap: Option<PriceGap>,
) -> Result<GearValuation> {
    if level == 0 {
        return Ok(GearValuation {
            level,
            policy: PolicyId::Unprotected,
            base_item_value,
            enhancement_cost: 0.0,
            total_value: base_item_value,
            complete: base_gap.is_none(),
            base_gap,
        });
    }
    check_target(level)?;

    let mut best: Option<ProgressionResult> = None;
    let mut first_error: Option<EnhanceError> = None;
    for policy in cache.config().candidates() {
        if policy.threshold > level {
            continue;
        }
        match cache.progression(policy, 0, level) {
            Ok(result) => {
                let better = match &best {
                    None => true,
                    Some(current) => rank(&result, current) == Ordering::Less,
                };
                if better {
                    best = Some(result);
                }
            }
            Err(err @ EnhanceError::Unreachable { .. }) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
            Err(err) => return Err(err),
        }
    }

    let best = match (best, first_error) {
        (Some(best), _) => best,
        (None, Some(err)) => return Err(err),
        (None, None) => return Err(EnhanceError::invalid("no candidate policies configured")),
    };
    Ok(GearValuation {
        level,
        policy: best.policy.id(),
        base_item_value,
        enhancement_cost: best.total_cost,
        total_value: base_item_value + best.total_cost,
        complete: best.is_complete() && base_gap.is_none(),
        base_gap,
    })
}

/// Where an in-progress enhancing session stands and what is left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPrediction {
    pub current_level: EnhancementLevel,
    pub target_level: EnhancementLevel,
    /// Expected cost of the rest of the session
    pub remaining: ProgressionResult,
    /// Expected cost of the whole climb from +0, for comparison
    pub from_scratch: ProgressionResult,
    /// Share of the expected attempts already behind the item (0-1)
    pub progress: f64,
}

/// Predict the remainder of a session for an item currently at `current_level`.
pub fn predict_session(
    cache: &mut RefreshCache,
    policy: ProtectionPolicy,
    current_level: EnhancementLevel,
    target_level: EnhancementLevel,
) -> Result<SessionPrediction> {
    let remaining = cache.progression(policy, current_level, target_level)?;
    let from_scratch = cache.progression(policy, 0, target_level)?;
    let progress = if from_scratch.expected_attempts > 0.0 {
        (1.0 - remaining.expected_attempts / from_scratch.expected_attempts).clamp(0.0, 1.0)
    } else {
        1.0
    };
    tracing::debug!(current_level, target_level, progress, "session prediction");
    Ok(SessionPrediction {
        current_level,
        target_level,
        remaining,
        from_scratch,
        progress,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdvisorConfig;
    use crate::enhancement::{CharacterSnapshot, ItemGameData, MaterialRequirement};
    use crate::pricing::{MarketPrices, PriceQuote};

    fn item(curve: Vec<f64>) -> ItemGameData {
        ItemGameData {
            item_id: "iron_sword".into(),
            item_level: 10,
            base_curve: curve,
            materials: vec![MaterialRequirement {
                item_id: "iron_bar".into(),
                count: 1.0,
            }],
            protection_item: Some("iron_sword".into()),
            base_action_seconds: 12.0,
        }
    }

    fn cache_for(curve: Vec<f64>, prices: MarketPrices) -> RefreshCache {
        RefreshCache::new(
            &CharacterSnapshot::new(10),
            &item(curve),
            &prices,
            AdvisorConfig::quick_check(5),
        )
        .unwrap()
    }

    fn prices() -> MarketPrices {
        MarketPrices::new()
            .with("iron_bar", PriceQuote::market(100.0, 90.0))
            .with("iron_sword", PriceQuote::market(150.0, 120.0))
    }

    #[test]
    fn test_valuation_level_zero_is_base() {
        let mut cache = cache_for(vec![0.5; 5], prices());
        let value = value_enhanced_item(&mut cache, 0, 150.0, None).unwrap();
        assert_eq!(value.total_value, 150.0);
        assert_eq!(value.enhancement_cost, 0.0);
    }

    #[test]
    fn test_valuation_picks_cheapest_policy() {
        let mut cache = cache_for(vec![0.5; 5], prices());
        let value = value_enhanced_item(&mut cache, 5, 150.0, None).unwrap();
        let table_never = cache.cost_table(ProtectionPolicy::never()).unwrap();
        let never_cost = table_never.row(5).unwrap().total_cost;
        assert!(value.enhancement_cost <= never_cost + 1e-9);
        assert!((value.total_value - 150.0 - value.enhancement_cost).abs() < 1e-9);
        assert!(value.complete);
    }

    #[test]
    fn test_valuation_unreachable_surfaces() {
        let mut cache = cache_for(vec![0.5, 0.0, 0.5, 0.5, 0.5], prices());
        let err = value_enhanced_item(&mut cache, 3, 150.0, None).unwrap_err();
        assert!(err.is_unreachable());
    }

    #[test]
    fn test_valuation_prefers_complete() {
        // protection item has no price: protected policies are incomplete
        let prices = MarketPrices::new().with("iron_bar", PriceQuote::market(100.0, 90.0));
        let mut cache = cache_for(vec![0.5; 5], prices);
        let value = value_enhanced_item(&mut cache, 5, 0.0, None).unwrap();
        assert_eq!(value.policy, PolicyId::Unprotected);
        assert!(value.complete);
    }

    #[test]
    fn test_valuation_with_unpriced_base_is_incomplete() {
        let mut cache = cache_for(vec![0.5; 5], prices());
        let gap = PriceGap {
            item_id: "iron_sword".into(),
            vendor_fallback: None,
        };
        let value = value_enhanced_item(&mut cache, 4, 0.0, Some(gap.clone())).unwrap();
        assert!(!value.complete);
        assert_eq!(value.base_gap, Some(gap.clone()));
        let at_zero = value_enhanced_item(&mut cache, 0, 0.0, Some(gap)).unwrap();
        assert!(!at_zero.complete);
    }

    #[test]
    fn test_valuation_equal_cost_prefers_fewer_attempts() {
        // nothing is consumed, so every policy costs 0 and attempts decide
        let free = ItemGameData {
            materials: Vec::new(),
            protection_item: None,
            ..item(vec![0.5; 5])
        };
        let mut cache = RefreshCache::new(
            &CharacterSnapshot::new(10),
            &free,
            &MarketPrices::new(),
            AdvisorConfig::quick_check(5),
        )
        .unwrap();
        let value = value_enhanced_item(&mut cache, 3, 0.0, None).unwrap();
        assert_eq!(value.policy, PolicyId::ProtectFrom(2));
        let comparison = cache.comparison(None).unwrap();
        let best = comparison.level(3).unwrap().best.as_ref().unwrap();
        assert_eq!(best.policy, value.policy);
    }

    #[test]
    fn test_session_prediction() {
        let mut cache = cache_for(vec![0.5; 5], prices());
        let prediction = predict_session(&mut cache, ProtectionPolicy::never(), 2, 3).unwrap();
        // p = 0.5: E(+3 from +0) = 14, E(+3 from +2) = 14 - 6 = 8
        assert!((prediction.from_scratch.expected_attempts - 14.0).abs() < 1e-9);
        assert!((prediction.remaining.expected_attempts - 8.0).abs() < 1e-9);
        assert!((prediction.progress - 6.0 / 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_session_already_at_target() {
        let mut cache = cache_for(vec![0.5; 5], prices());
        let prediction = predict_session(&mut cache, ProtectionPolicy::never(), 4, 4).unwrap();
        assert_eq!(prediction.remaining.expected_attempts, 0.0);
        assert_eq!(prediction.progress, 1.0);
    }
}
