//! Success rate aggregation: base curve plus flat bonuses.

use super::error::{EnhanceError, Result};
use super::snapshot::{CharacterSnapshot, ItemGameData};
use super::types::SuccessProfile;
use crate::constants::SUCCESS_PCT_PER_LEVEL_ADVANTAGE;

/// Success bonus (percentage points) from out-levelling the item.
/// Under-levelled characters get 0, not a penalty.
pub fn level_advantage_success_pct(character_level: u32, item_level: u32) -> f64 {
    character_level.saturating_sub(item_level) as f64 * SUCCESS_PCT_PER_LEVEL_ADVANTAGE
}

/// Add `bonus_pct` percentage points to every level of `base_curve` and clamp to [0, 1].
pub fn aggregate_rates(base_curve: &[f64], bonus_pct: f64) -> Result<SuccessProfile> {
    if !bonus_pct.is_finite() {
        return Err(EnhanceError::invalid("success bonus is not a number"));
    }
    if let Some(idx) = base_curve.iter().position(|r| !r.is_finite() || *r < 0.0) {
        return Err(EnhanceError::invalid(format!(
            "base success rate for +{} must be a non-negative number",
            idx + 1
        )));
    }
    let shift = bonus_pct / 100.0;
    let rates: Vec<f64> = base_curve
        .iter()
        .map(|base| (base + shift).clamp(0.0, 1.0))
        .collect();
    SuccessProfile::from_rates(&rates)
}

/// Build the success profile for one item from a character snapshot.
pub fn success_profile(
    character: &CharacterSnapshot,
    item: &ItemGameData,
) -> Result<SuccessProfile> {
    let bonus = character.success_bonus_pct()
        + level_advantage_success_pct(character.enhancing_level, item.item_level);
    tracing::debug!(
        item = %item.item_id,
        bonus_pct = bonus,
        "aggregating success rates"
    );
    aggregate_rates(&item.base_curve, bonus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhancement::snapshot::ConsumableEffect;

    fn item(curve: Vec<f64>, item_level: u32) -> ItemGameData {
        ItemGameData {
            item_id: "test_item".into(),
            item_level,
            base_curve: curve,
            materials: Vec::new(),
            protection_item: None,
            base_action_seconds: 12.0,
        }
    }

    #[test]
    fn test_level_advantage_only_positive() {
        assert!((level_advantage_success_pct(60, 40) - 1.0).abs() < 1e-12);
        assert_eq!(level_advantage_success_pct(10, 40), 0.0);
        assert_eq!(level_advantage_success_pct(40, 40), 0.0);
    }

    #[test]
    fn test_bonus_is_additive_percentage_points() {
        let profile = aggregate_rates(&[0.5, 0.45], 10.0).unwrap();
        assert!((profile.rates()[0] - 0.6).abs() < 1e-12);
        assert!((profile.rates()[1] - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_clamped_to_one() {
        let profile = aggregate_rates(&[0.95], 20.0).unwrap();
        assert_eq!(profile.rates(), &[1.0]);
    }

    #[test]
    fn test_zero_base_stays_zero_without_bonus() {
        let profile = aggregate_rates(&[0.5, 0.0], 0.0).unwrap();
        assert_eq!(profile.rates()[1], 0.0);
    }

    #[test]
    fn test_negative_base_rejected() {
        assert!(matches!(
            aggregate_rates(&[0.5, -0.1], 0.0),
            Err(EnhanceError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_profile_from_snapshot_sums_sources() {
        let mut character = CharacterSnapshot::new(60);
        character.equipment.success_pct = 2.0;
        character.house.success_pct = 0.5;
        character.community.success_pct = 0.5;
        character.consumables.push(ConsumableEffect {
            id: "blessed_tea".into(),
            active: true,
            success_pct: 1.0,
            speed_pct: 0.0,
        });
        // 2 + 0.5 + 0.5 + 1 + (60 - 40) * 0.05 = 5 points
        let profile = success_profile(&character, &item(vec![0.5, 0.4], 40)).unwrap();
        assert!((profile.rates()[0] - 0.55).abs() < 1e-12);
        assert!((profile.rates()[1] - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_profile_is_pure() {
        let character = CharacterSnapshot::new(10);
        let item = item(vec![0.5; 20], 1);
        assert_eq!(
            success_profile(&character, &item).unwrap(),
            success_profile(&character, &item).unwrap()
        );
    }
}
