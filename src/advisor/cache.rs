use crate::config::AdvisorConfig;
use crate::enhancement::{
    compare_tables, solve_range, success_profile, table_from, CharacterSnapshot, CostBasis,
    CostTable, EnhancementLevel, Expectation, ItemGameData, ProgressionResult, ProtectionPolicy,
    RecoveryOption, Result, StrategyComparison, SuccessProfile,
};
use crate::pricing::PriceProvider;
use std::collections::HashMap;

/// Inputs of one refresh plus memoized solver results.
///
/// Build a new cache whenever the character, equipment, consumables or
/// prices change; nothing here is kept across refreshes.
#[derive(Debug, Clone)]
pub struct RefreshCache {
    profile: SuccessProfile,
    basis: CostBasis,
    config: AdvisorConfig,
    solved: HashMap<(ProtectionPolicy, EnhancementLevel, EnhancementLevel), Result<Expectation>>,
    hits: u32,
}

impl RefreshCache {
    /// Snapshot the character, item and prices into a fresh cache.
    pub fn new<P: PriceProvider + ?Sized>(
        character: &CharacterSnapshot,
        item: &ItemGameData,
        prices: &P,
        config: AdvisorConfig,
    ) -> Result<Self> {
        config.validate()?;
        let profile = success_profile(character, item)?;
        let basis = CostBasis::resolve(character, item, prices, config.price_mode)?;
        Ok(Self::from_parts(profile, basis, config))
    }

    pub fn from_parts(profile: SuccessProfile, basis: CostBasis, config: AdvisorConfig) -> Self {
        Self {
            profile,
            basis,
            config,
            solved: HashMap::new(),
            hits: 0,
        }
    }

    pub fn profile(&self) -> &SuccessProfile {
        &self.profile
    }

    pub fn basis(&self) -> &CostBasis {
        &self.basis
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Number of solves answered from the memo.
    pub fn hits(&self) -> u32 {
        self.hits
    }

    /// Expected attempts and protection uses, solved once per key.
    pub fn expectation(
        &mut self,
        policy: ProtectionPolicy,
        start: EnhancementLevel,
        target: EnhancementLevel,
    ) -> Result<Expectation> {
        if let Some(found) = self.solved.get(&(policy, start, target)) {
            self.hits += 1;
            return found.clone();
        }
        let result = solve_range(&self.profile, &policy, start, target);
        self.solved.insert((policy, start, target), result.clone());
        result
    }

    /// Priced result for one (start, target) pair.
    pub fn progression(
        &mut self,
        policy: ProtectionPolicy,
        start: EnhancementLevel,
        target: EnhancementLevel,
    ) -> Result<ProgressionResult> {
        let expectation = self.expectation(policy, start, target)?;
        Ok(self.basis.price(policy, start, target, expectation))
    }

    /// Table for +1..=max_target under `policy`.
    pub fn cost_table(&mut self, policy: ProtectionPolicy) -> Result<CostTable> {
        let basis = self.basis.clone();
        let max_target = self.config.max_target;
        table_from(&basis, policy, max_target, |target| self.expectation(policy, 0, target))
    }

    /// Compare every configured candidate policy, optionally against a recovery item.
    pub fn comparison(&mut self, recovery: Option<&RecoveryOption>) -> Result<StrategyComparison> {
        let tables = self
            .config
            .candidates()
            .into_iter()
            .map(|policy| self.cost_table(policy))
            .collect::<Result<Vec<_>>>()?;
        compare_tables(&tables, self.config.max_target, recovery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::MarketPrices;

    fn cache() -> RefreshCache {
        let item = ItemGameData {
            item_id: "cheese_sword".into(),
            item_level: 1,
            base_curve: vec![0.5; 20],
            materials: Vec::new(),
            protection_item: None,
            base_action_seconds: 12.0,
        };
        RefreshCache::new(
            &CharacterSnapshot::new(1),
            &item,
            &MarketPrices::new(),
            AdvisorConfig::quick_check(5),
        )
        .unwrap()
    }

    #[test]
    fn test_repeated_solve_hits_memo() {
        let mut cache = cache();
        let first = cache.expectation(ProtectionPolicy::never(), 0, 3).unwrap();
        assert_eq!(cache.hits(), 0);
        let second = cache.expectation(ProtectionPolicy::never(), 0, 3).unwrap();
        assert_eq!(cache.hits(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_table_then_comparison_reuses_solves() {
        let mut cache = cache();
        let table = cache.cost_table(ProtectionPolicy::never()).unwrap();
        assert_eq!(table.rows.len(), 5);
        let comparison = cache.comparison(None).unwrap();
        assert_eq!(comparison.levels.len(), 5);
        // the never-protect column was already solved for the table
        assert!(cache.hits() >= 5);
    }

    #[test]
    fn test_errors_are_memoized_too() {
        let mut cache = cache();
        assert!(cache.expectation(ProtectionPolicy::never(), 4, 2).is_err());
        assert!(cache.expectation(ProtectionPolicy::never(), 4, 2).is_err());
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let item = ItemGameData {
            item_id: "x".into(),
            item_level: 1,
            base_curve: vec![0.5; 20],
            materials: Vec::new(),
            protection_item: None,
            base_action_seconds: 12.0,
        };
        let result = RefreshCache::new(
            &CharacterSnapshot::new(1),
            &item,
            &MarketPrices::new(),
            AdvisorConfig::quick_check(0),
        );
        assert!(result.is_err());
    }
}
