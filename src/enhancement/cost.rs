//! Converting expectations into time and coins.

use super::error::{EnhanceError, Result};
use super::snapshot::{CharacterSnapshot, ItemGameData};
use super::solver::{solve, Expectation};
use super::types::{
    CostTable, EnhancementLevel, ProgressionResult, ProtectionPolicy, SuccessProfile, Unavailable,
};
use crate::constants::SPEED_PCT_PER_LEVEL_ADVANTAGE;
use crate::pricing::{price_with_gaps, PriceGap, PriceMode, PriceProvider};
use serde::{Deserialize, Serialize};

/// Seconds per attempt after speed bonuses.
///
/// `speed_bonus_pct` is the sum of equipment, house, community and
/// consumable bonuses; the level advantage adds one percent per level.
pub fn per_action_seconds(
    base_action_seconds: f64,
    speed_bonus_pct: f64,
    character_level: u32,
    item_level: u32,
) -> Result<f64> {
    if !base_action_seconds.is_finite() || base_action_seconds <= 0.0 {
        return Err(EnhanceError::invalid("base action time must be positive"));
    }
    let advantage_pct =
        character_level.saturating_sub(item_level) as f64 * SPEED_PCT_PER_LEVEL_ADVANTAGE;
    let divisor = 1.0 + (speed_bonus_pct + advantage_pct) / 100.0;
    if !divisor.is_finite() || divisor <= 0.0 {
        return Err(EnhanceError::invalid(format!(
            "speed bonus {}% leaves no time per action",
            speed_bonus_pct
        )));
    }
    Ok(base_action_seconds / divisor)
}

/// Prices and timings that do not depend on the policy or the target,
/// resolved once per refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBasis {
    pub per_action_seconds: f64,
    /// Sum of unit count x price over the materials that have a price
    pub material_cost_per_attempt: f64,
    pub material_gaps: Vec<PriceGap>,
    pub protection_item: Option<String>,
    /// None when there is no protection item or it has no price
    pub protection_price: Option<f64>,
    pub protection_gap: Option<PriceGap>,
}

impl CostBasis {
    pub fn resolve<P: PriceProvider + ?Sized>(
        character: &CharacterSnapshot,
        item: &ItemGameData,
        prices: &P,
        mode: PriceMode,
    ) -> Result<Self> {
        let per_action_seconds = per_action_seconds(
            item.base_action_seconds,
            character.speed_bonus_pct(),
            character.enhancing_level,
            item.item_level,
        )?;

        let mut material_gaps = Vec::new();
        let mut material_cost_per_attempt = 0.0;
        for material in &item.materials {
            if !material.count.is_finite() || material.count < 0.0 {
                return Err(EnhanceError::invalid(format!(
                    "material '{}' has an invalid count",
                    material.item_id
                )));
            }
            let price = price_with_gaps(prices, &material.item_id, mode, &mut material_gaps);
            if let Some(price) = price {
                material_cost_per_attempt += material.count * price;
            }
        }

        let mut protection_gaps = Vec::new();
        let protection_price = item
            .protection_item
            .as_deref()
            .and_then(|id| price_with_gaps(prices, id, mode, &mut protection_gaps));

        Ok(Self {
            per_action_seconds,
            material_cost_per_attempt,
            material_gaps,
            protection_item: item.protection_item.clone(),
            protection_price,
            protection_gap: protection_gaps.pop(),
        })
    }

    /// Attach time and coin totals to a solved expectation.
    pub fn price(
        &self,
        policy: ProtectionPolicy,
        start_level: EnhancementLevel,
        target_level: EnhancementLevel,
        expectation: Expectation,
    ) -> ProgressionResult {
        let material_cost = expectation.attempts * self.material_cost_per_attempt;
        let protection_cost = match self.protection_item {
            Some(_) => expectation.protection_uses * self.protection_price.unwrap_or(0.0),
            None => 0.0,
        };

        let mut price_gaps = Vec::new();
        if expectation.attempts > 0.0 {
            price_gaps.extend(self.material_gaps.iter().cloned());
        }
        if expectation.protection_uses > 0.0 {
            price_gaps.extend(self.protection_gap.iter().cloned());
        }

        ProgressionResult {
            policy,
            start_level,
            target_level,
            expected_attempts: expectation.attempts,
            expected_protection_uses: expectation.protection_uses,
            expected_time: expectation.attempts * self.per_action_seconds,
            material_cost,
            protection_cost,
            total_cost: material_cost + protection_cost,
            price_gaps,
        }
    }
}

/// Results for +1 through `max_target` under one policy.
///
/// Stops at the first unreachable level and records it; invalid input
/// (such as a curve shorter than `max_target`) is an error instead.
pub fn cost_table(
    profile: &SuccessProfile,
    basis: &CostBasis,
    policy: ProtectionPolicy,
    max_target: EnhancementLevel,
) -> Result<CostTable> {
    table_from(basis, policy, max_target, |target| solve(profile, &policy, target))
}

/// [`cost_table`] with the solver supplied by the caller, so a memo can sit in between.
pub fn table_from<F>(
    basis: &CostBasis,
    policy: ProtectionPolicy,
    max_target: EnhancementLevel,
    mut solve_to: F,
) -> Result<CostTable>
where
    F: FnMut(EnhancementLevel) -> Result<Expectation>,
{
    let mut rows = Vec::with_capacity(max_target as usize);
    let mut unavailable = None;
    for target in 1..=max_target {
        match solve_to(target) {
            Ok(expectation) => rows.push(basis.price(policy, 0, target, expectation)),
            Err(err @ EnhanceError::Unreachable { .. }) => {
                tracing::debug!(threshold = policy.threshold, target, %err, "table stops");
                unavailable = Some(Unavailable {
                    level: target,
                    reason: err.to_string(),
                });
                break;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(CostTable {
        policy,
        rows,
        unavailable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhancement::snapshot::MaterialRequirement;
    use crate::pricing::{MarketPrices, PriceQuote};

    fn item() -> ItemGameData {
        ItemGameData {
            item_id: "holy_sword".into(),
            item_level: 50,
            base_curve: vec![0.5; 20],
            materials: vec![
                MaterialRequirement {
                    item_id: "holy_bar".into(),
                    count: 2.0,
                },
                MaterialRequirement {
                    item_id: "coin".into(),
                    count: 300.0,
                },
            ],
            protection_item: Some("mirror_shard".into()),
            base_action_seconds: 12.0,
        }
    }

    fn prices() -> MarketPrices {
        MarketPrices::new()
            .with("holy_bar", PriceQuote::market(500.0, 450.0))
            .with("mirror_shard", PriceQuote::market(10_000.0, 9_000.0))
    }

    fn basis_for(item: &ItemGameData, prices: &MarketPrices) -> Result<CostBasis> {
        CostBasis::resolve(&CharacterSnapshot::new(50), item, prices, PriceMode::Ask)
    }

    #[test]
    fn test_action_time_formula() {
        // 12 / (1 + (10 + 20) / 100)
        let secs = per_action_seconds(12.0, 10.0, 70, 50).unwrap();
        assert!((secs - 12.0 / 1.3).abs() < 1e-12);
        // under-levelled: no penalty
        let secs = per_action_seconds(12.0, 0.0, 10, 50).unwrap();
        assert!((secs - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_action_time_rejects_bad_input() {
        assert!(per_action_seconds(0.0, 0.0, 1, 1).is_err());
        assert!(per_action_seconds(12.0, -100.0, 1, 1).is_err());
    }

    #[test]
    fn test_basis_sums_materials() {
        let basis = basis_for(&item(), &prices()).unwrap();
        assert!((basis.material_cost_per_attempt - 1300.0).abs() < 1e-9);
        assert_eq!(basis.protection_price, Some(10_000.0));
        assert!(basis.material_gaps.is_empty());
    }

    #[test]
    fn test_price_totals() {
        let basis = basis_for(&item(), &prices()).unwrap();
        let result = basis.price(
            ProtectionPolicy::protect_from(2),
            0,
            2,
            Expectation {
                attempts: 4.0,
                protection_uses: 1.0,
            },
        );
        assert!((result.material_cost - 5200.0).abs() < 1e-9);
        assert!((result.protection_cost - 10_000.0).abs() < 1e-9);
        assert!((result.total_cost - 15_200.0).abs() < 1e-9);
        assert!((result.expected_time - 48.0).abs() < 1e-9);
        assert!(result.is_complete());
    }

    #[test]
    fn test_missing_material_flags_partial_total() {
        let prices = MarketPrices::new().with("mirror_shard", PriceQuote::market(10.0, 9.0));
        let basis = basis_for(&item(), &prices).unwrap();
        // only the coin component is priced
        assert!((basis.material_cost_per_attempt - 300.0).abs() < 1e-9);

        let result = basis.price(
            ProtectionPolicy::never(),
            0,
            1,
            Expectation {
                attempts: 2.0,
                protection_uses: 0.0,
            },
        );
        assert!(!result.is_complete());
        assert!((result.total_cost - 600.0).abs() < 1e-9);
        assert_eq!(
            result.require_complete().unwrap_err(),
            EnhanceError::MissingPriceData {
                item_id: "holy_bar".into(),
            }
        );
    }

    #[test]
    fn test_unused_protection_gap_not_reported() {
        let prices = MarketPrices::new().with("holy_bar", PriceQuote::market(1.0, 1.0));
        let basis = basis_for(&item(), &prices).unwrap();
        assert!(basis.protection_gap.is_some());

        let unprotected = basis.price(
            ProtectionPolicy::never(),
            0,
            3,
            Expectation {
                attempts: 8.0,
                protection_uses: 0.0,
            },
        );
        assert!(unprotected.is_complete());

        let protected = basis.price(
            ProtectionPolicy::protect_from(2),
            0,
            3,
            Expectation {
                attempts: 6.0,
                protection_uses: 2.0,
            },
        );
        assert!(!protected.is_complete());
        assert_eq!(protected.protection_cost, 0.0);
    }

    #[test]
    fn test_no_protection_item_costs_nothing() {
        let mut item = item();
        item.protection_item = None;
        let basis = basis_for(&item, &prices()).unwrap();
        let result = basis.price(
            ProtectionPolicy::protect_from(2),
            0,
            2,
            Expectation {
                attempts: 4.0,
                protection_uses: 1.0,
            },
        );
        assert_eq!(result.protection_cost, 0.0);
        assert!(result.is_complete());
    }

    #[test]
    fn test_cost_table_stops_at_unreachable() {
        let basis = basis_for(&item(), &prices()).unwrap();
        let profile = SuccessProfile::from_rates(&[0.9, 0.9, 0.0, 0.9]).unwrap();
        let table = cost_table(&profile, &basis, ProtectionPolicy::never(), 4).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.unavailable.as_ref().map(|u| u.level), Some(3));
        assert!(!table.is_complete());
        assert!(table.row(2).is_some());
        assert!(table.row(3).is_none());
    }

    #[test]
    fn test_cost_table_short_curve_is_error() {
        let basis = basis_for(&item(), &prices()).unwrap();
        let profile = SuccessProfile::from_rates(&[0.9, 0.9]).unwrap();
        assert!(matches!(
            cost_table(&profile, &basis, ProtectionPolicy::never(), 5),
            Err(EnhanceError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_negative_count_rejected() {
        let mut item = item();
        item.materials[0].count = -1.0;
        assert!(basis_for(&item, &prices()).is_err());
    }
}
