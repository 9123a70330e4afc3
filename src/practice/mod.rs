pub mod catalog;
pub mod engine;
pub mod generator;
pub mod selector;
pub mod types;
pub mod weighting;

pub use catalog::{ScalingRule, StrategyId, StrategyKey, CATALOG};
pub use engine::{candidate_strategies, PracticeEngine};
pub use selector::select_strategy;
pub use types::*;
pub use weighting::{WeightCalculator, WeightingConfig};
