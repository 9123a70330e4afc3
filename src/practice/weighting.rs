use serde::{Deserialize, Serialize};

use crate::practice::catalog::StrategyId;
use crate::practice::types::{PerformanceProfile, StrategyMetrics};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightingConfig {
    pub untried_weight: f64,
    pub mastered_weight: f64,
    pub mastery_accuracy: f64,
    pub mastery_min_attempts: u32,
    pub attempt_threshold: u32,
    pub low_attempt_boost: f64,
    pub min_tried_weight: f64,
}

impl Default for WeightingConfig {
    fn default() -> Self {
        Self {
            untried_weight: 1.0,
            mastered_weight: 0.01,
            mastery_accuracy: 0.9,
            mastery_min_attempts: 10,
            attempt_threshold: 5,
            low_attempt_boost: 0.2,
            min_tried_weight: 0.05,
        }
    }
}

/// Turns accuracy history into roulette-wheel weights.
///
/// Untried strategies get full exposure, weak ones get weight proportional
/// to their error rate (boosted while data is sparse), and mastered ones
/// stay in rotation at a near-zero weight.
#[derive(Debug, Clone, Default)]
pub struct WeightCalculator {
    config: WeightingConfig,
}

impl WeightCalculator {
    pub fn new(config: WeightingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WeightingConfig {
        &self.config
    }

    pub fn is_mastered(&self, metrics: &StrategyMetrics) -> bool {
        match metrics.accuracy() {
            Some(accuracy) => {
                accuracy >= self.config.mastery_accuracy
                    && metrics.total_attempts >= self.config.mastery_min_attempts
            }
            None => false,
        }
    }

    pub fn weight(&self, metrics: &StrategyMetrics) -> f64 {
        let cfg = &self.config;
        let Some(accuracy) = metrics.accuracy() else {
            return cfg.untried_weight;
        };

        if self.is_mastered(metrics) {
            return cfg.mastered_weight.max(0.0);
        }

        let mut weight = 1.0 - accuracy;
        if metrics.total_attempts < cfg.attempt_threshold {
            let missing = (cfg.attempt_threshold - metrics.total_attempts) as f64;
            weight += cfg.low_attempt_boost * missing;
        }
        weight.max(cfg.min_tried_weight).max(0.0)
    }

    pub fn weigh(
        &self,
        candidates: &[StrategyId],
        profile: &PerformanceProfile,
    ) -> Vec<(StrategyId, f64)> {
        candidates
            .iter()
            .map(|id| (*id, self.weight(&profile.get(*id))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> WeightCalculator {
        WeightCalculator::default()
    }

    #[test]
    fn test_untried_gets_full_weight() {
        assert_eq!(calc().weight(&StrategyMetrics::default()), 1.0);
    }

    #[test]
    fn test_mastered_is_nearly_suppressed() {
        let w = calc().weight(&StrategyMetrics::new(9, 1));
        assert!((w - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_high_accuracy_without_enough_attempts_is_not_mastered() {
        // 4/4 correct: accuracy 1.0, boost 0.2 * (5 - 4)
        let w = calc().weight(&StrategyMetrics::new(4, 0));
        assert!((w - 0.2).abs() < 1e-12, "got {w}");
    }

    #[test]
    fn test_low_attempt_boost() {
        // 1/2 correct: 0.5 + 0.2 * 3
        let w = calc().weight(&StrategyMetrics::new(1, 1));
        assert!((w - 1.1).abs() < 1e-12, "got {w}");
    }

    #[test]
    fn test_error_rate_weight() {
        let w = calc().weight(&StrategyMetrics::new(2, 8));
        assert!((w - 0.8).abs() < 1e-12, "got {w}");
    }

    #[test]
    fn test_floor_applies_to_strong_but_unmastered() {
        // 17/20 = 0.85, below mastery: 1 - 0.85 = 0.15 stays above floor
        let w = calc().weight(&StrategyMetrics::new(17, 3));
        assert!((w - 0.15).abs() < 1e-9);

        // 8/9 just shy of the attempt requirement: 1 - 0.888.. = 0.111..
        let w = calc().weight(&StrategyMetrics::new(8, 1));
        assert!(w >= 0.05);

        let cfg = WeightingConfig {
            mastery_min_attempts: 1000,
            ..Default::default()
        };
        let w = WeightCalculator::new(cfg).weight(&StrategyMetrics::new(50, 0));
        assert!((w - 0.05).abs() < 1e-12, "perfect but unmastered should sit on the floor");
    }

    #[test]
    fn test_weigh_preserves_candidate_order() {
        let mut profile = PerformanceProfile::new();
        for _ in 0..10 {
            profile.record(StrategyId::MultiplicationTimes5, true);
        }
        let weights = calc().weigh(
            &[StrategyId::MultiplicationTimes5, StrategyId::AdditionDoubles],
            &profile,
        );
        assert_eq!(weights[0].0, StrategyId::MultiplicationTimes5);
        assert!((weights[0].1 - 0.01).abs() < 1e-12);
        assert_eq!(weights[1], (StrategyId::AdditionDoubles, 1.0));
    }
}
