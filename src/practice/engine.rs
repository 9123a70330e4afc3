use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::practice::catalog::{StrategyId, StrategyKey};
use crate::practice::generator;
use crate::practice::selector::select_strategy;
use crate::practice::types::{PerformanceProfile, Problem, UserPreferences};
use crate::practice::weighting::{WeightCalculator, WeightingConfig};

/// Catalog strategies whose operation is enabled, in catalog order.
pub fn candidate_strategies(preferences: &UserPreferences) -> Vec<StrategyId> {
    StrategyId::ALL
        .into_iter()
        .filter(|id| preferences.is_enabled(id.operation()))
        .collect()
}

/// Public generation entry point: weighting, selection and synthesis over an
/// injected random source.
pub struct PracticeEngine<R: Rng = ChaCha8Rng> {
    rng: R,
    weights: WeightCalculator,
}

impl PracticeEngine<ChaCha8Rng> {
    /// Seeded engine when `seed` is given, otherwise seeded from the clock.
    pub fn new(seed: Option<u64>, weighting: WeightingConfig) -> Self {
        let seed = seed.unwrap_or_else(|| {
            use std::time::{SystemTime, UNIX_EPOCH};
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(42)
        });
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed), weighting)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(Some(seed), WeightingConfig::default())
    }
}

impl<R: Rng> PracticeEngine<R> {
    pub fn from_rng(rng: R, weighting: WeightingConfig) -> Self {
        Self {
            rng,
            weights: WeightCalculator::new(weighting),
        }
    }

    pub fn weights(&self) -> &WeightCalculator {
        &self.weights
    }

    pub fn generate_problem(
        &mut self,
        preferences: &UserPreferences,
        profile: &PerformanceProfile,
        focused: Option<StrategyId>,
    ) -> Option<Problem> {
        let strategy = match focused {
            Some(strategy) => strategy,
            None => {
                let weighted = self
                    .weights
                    .weigh(&candidate_strategies(preferences), profile);
                select_strategy(&mut self.rng, &weighted)?
            }
        };
        Some(self.generate_for(strategy, preferences))
    }

    /// Focused generation from a textual key. Keys outside the catalog still
    /// produce a plain problem when their prefix names an operation.
    pub fn generate_problem_for_key(
        &mut self,
        preferences: &UserPreferences,
        profile: &PerformanceProfile,
        key: &str,
    ) -> Option<Problem> {
        match StrategyKey::resolve(key) {
            StrategyKey::Known(strategy) => self.generate_problem(preferences, profile, Some(strategy)),
            StrategyKey::Unknown(operation) => {
                tracing::warn!(key = %key, operation = operation.as_str(), "unknown strategy, using generic problem");
                Some(generator::generate_generic(
                    &mut self.rng,
                    operation,
                    preferences.difficulty_level,
                    &preferences.number_ranges,
                ))
            }
            StrategyKey::Unresolvable => {
                tracing::warn!(key = %key, "strategy key names no operation");
                None
            }
        }
    }

    /// `count` problems drawn from a single weighting snapshot. Outcomes
    /// recorded while the batch is practiced do not change these weights.
    pub fn generate_batch(
        &mut self,
        preferences: &UserPreferences,
        profile: &PerformanceProfile,
        count: usize,
    ) -> Vec<Problem> {
        let weighted = self
            .weights
            .weigh(&candidate_strategies(preferences), profile);
        if weighted.is_empty() {
            return Vec::new();
        }

        let mut problems = Vec::with_capacity(count);
        for _ in 0..count {
            match select_strategy(&mut self.rng, &weighted) {
                Some(strategy) => problems.push(self.generate_for(strategy, preferences)),
                None => break,
            }
        }
        problems
    }

    fn generate_for(&mut self, strategy: StrategyId, preferences: &UserPreferences) -> Problem {
        generator::generate(
            &mut self.rng,
            strategy,
            preferences.difficulty_level,
            &preferences.number_ranges,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::practice::types::{Operation, StrategyMetrics};

    #[test]
    fn test_no_enabled_operations_yields_none() {
        let mut engine = PracticeEngine::with_seed(1);
        let prefs = UserPreferences {
            enabled_operations: vec![],
            ..Default::default()
        };
        let profile = PerformanceProfile::new();
        assert!(engine.generate_problem(&prefs, &profile, None).is_none());
        assert!(engine.generate_batch(&prefs, &profile, 10).is_empty());
    }

    #[test]
    fn test_only_enabled_operations_are_drawn() {
        let mut engine = PracticeEngine::with_seed(2);
        let prefs = UserPreferences {
            enabled_operations: vec![Operation::Division],
            ..Default::default()
        };
        let profile = PerformanceProfile::new();
        for problem in engine.generate_batch(&prefs, &profile, 200) {
            assert_eq!(problem.operation_type, Operation::Division);
        }
    }

    #[test]
    fn test_focused_bypasses_selection() {
        let mut engine = PracticeEngine::with_seed(3);
        let prefs = UserPreferences {
            enabled_operations: vec![Operation::Addition],
            ..Default::default()
        };
        let profile = PerformanceProfile::new();
        let problem = engine
            .generate_problem(&prefs, &profile, Some(StrategyId::DivisionHalving))
            .unwrap();
        assert_eq!(problem.intended_strategy, Some(StrategyId::DivisionHalving));
        assert_eq!(problem.operation_type, Operation::Division);
    }

    #[test]
    fn test_unknown_key_falls_back_to_generic() {
        let mut engine = PracticeEngine::with_seed(4);
        let prefs = UserPreferences::default();
        let profile = PerformanceProfile::new();

        let problem = engine
            .generate_problem_for_key(&prefs, &profile, "SubtractionCrossingZero")
            .unwrap();
        assert_eq!(problem.operation_type, Operation::Subtraction);
        assert_eq!(problem.intended_strategy, None);
        assert!(problem.operands[0] >= problem.operands[1]);

        assert!(engine
            .generate_problem_for_key(&prefs, &profile, "Juggling")
            .is_none());
    }

    #[test]
    fn test_batch_uses_one_snapshot() {
        let prefs = UserPreferences {
            enabled_operations: vec![Operation::Multiplication],
            ..Default::default()
        };
        let mut profile = PerformanceProfile::new();
        for id in StrategyId::for_operation(Operation::Multiplication) {
            if id != StrategyId::MultiplicationNearSquares {
                profile.set(id, StrategyMetrics::new(10, 0));
            }
        }
        let mut engine = PracticeEngine::with_seed(5);
        let batch = engine.generate_batch(&prefs, &profile, 300);
        let near = batch
            .iter()
            .filter(|p| p.intended_strategy == Some(StrategyId::MultiplicationNearSquares))
            .count();
        assert_eq!(batch.len(), 300);
        assert!(near > 270, "untried strategy should dominate, got {near}");
    }
}
