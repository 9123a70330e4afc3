use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::practice::catalog::StrategyId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Self::Addition,
        Self::Subtraction,
        Self::Multiplication,
        Self::Division,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Addition => "addition",
            Self::Subtraction => "subtraction",
            Self::Multiplication => "multiplication",
            Self::Division => "division",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Addition => "+",
            Self::Subtraction => "-",
            Self::Multiplication => "×",
            Self::Division => "÷",
        }
    }

    /// Exact result of `a op b`. Division is integer division; callers
    /// guarantee a non-zero divisor.
    pub fn apply(&self, a: i64, b: i64) -> i64 {
        match self {
            Self::Addition => a + b,
            Self::Subtraction => a - b,
            Self::Multiplication => a * b,
            Self::Division => a / b,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "addition" | "add" => Some(Self::Addition),
            "subtraction" | "sub" => Some(Self::Subtraction),
            "multiplication" | "mul" => Some(Self::Multiplication),
            "division" | "div" => Some(Self::Division),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "intermediate" => Self::Intermediate,
            "advanced" => Self::Advanced,
            _ => Self::Beginner,
        }
    }

    /// Fraction of the configured `[min, max]` span this level draws from.
    pub fn band(&self) -> (f64, f64) {
        match self {
            Self::Beginner => (0.0, 0.5),
            Self::Intermediate => (0.25, 0.75),
            Self::Advanced => (0.5, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberRange {
    pub min: i64,
    pub max: i64,
}

impl NumberRange {
    /// Largest usable bound. Generators multiply two drawn operands and add a
    /// small offset or remainder, which must stay inside `i64`.
    pub const MAX_BOUND: i64 = 1_000_000_000;

    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Swaps inverted bounds and clamps both into `0..=MAX_BOUND`. Never
    /// fails.
    pub fn normalized(&self) -> Self {
        let (lo, hi) = if self.min > self.max {
            (self.max, self.min)
        } else {
            (self.min, self.max)
        };
        Self {
            min: lo.clamp(0, Self::MAX_BOUND),
            max: hi.clamp(0, Self::MAX_BOUND),
        }
    }

    /// Sub-range of the normalized bounds selected by a difficulty band.
    pub fn banded(&self, difficulty: DifficultyLevel) -> Self {
        let range = self.normalized();
        let span = range.max.saturating_sub(range.min) as f64;
        let (lo, hi) = difficulty.band();
        let band_min = range
            .min
            .saturating_add((span * lo).floor() as i64)
            .min(range.max);
        let band_max = range
            .min
            .saturating_add((span * hi).ceil() as i64)
            .min(range.max);
        Self {
            min: band_min,
            max: band_max.max(band_min),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberRangeConfig {
    pub addition: NumberRange,
    pub subtraction: NumberRange,
    pub multiplication: NumberRange,
    pub division: NumberRange,
}

impl NumberRangeConfig {
    pub fn for_operation(&self, operation: Operation) -> NumberRange {
        let range = match operation {
            Operation::Addition => self.addition,
            Operation::Subtraction => self.subtraction,
            Operation::Multiplication => self.multiplication,
            Operation::Division => self.division,
        };
        range.normalized()
    }
}

impl Default for NumberRangeConfig {
    fn default() -> Self {
        Self {
            addition: NumberRange::new(1, 100),
            subtraction: NumberRange::new(1, 100),
            multiplication: NumberRange::new(2, 12),
            division: NumberRange::new(2, 12),
        }
    }
}

/// Missing fields fall back to [`UserPreferences::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub enabled_operations: Vec<Operation>,
    pub difficulty_level: DifficultyLevel,
    pub session_length: u32,
    /// Seconds allowed per problem.
    pub time_limit: u32,
    pub number_ranges: NumberRangeConfig,
}

impl UserPreferences {
    pub fn is_enabled(&self, operation: Operation) -> bool {
        self.enabled_operations.contains(&operation)
    }

    pub fn effective_session_length(&self) -> usize {
        self.session_length.max(1) as usize
    }

    pub fn effective_time_limit(&self) -> u32 {
        self.time_limit.max(1)
    }
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            enabled_operations: Operation::ALL.to_vec(),
            difficulty_level: DifficultyLevel::default(),
            session_length: 10,
            time_limit: 30,
            number_ranges: NumberRangeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StrategyMetrics {
    pub total_attempts: u32,
    pub correct: u32,
    pub incorrect: u32,
}

impl StrategyMetrics {
    pub fn new(correct: u32, incorrect: u32) -> Self {
        Self {
            total_attempts: correct + incorrect,
            correct,
            incorrect,
        }
    }

    pub fn record(&mut self, is_correct: bool) {
        if is_correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
        self.total_attempts = self.correct + self.incorrect;
    }

    pub fn accuracy(&self) -> Option<f64> {
        if self.total_attempts == 0 {
            None
        } else {
            Some(self.correct as f64 / self.total_attempts as f64)
        }
    }

    pub fn merge(&mut self, other: &StrategyMetrics) {
        self.correct += other.correct;
        self.incorrect += other.incorrect;
        self.total_attempts = self.correct + self.incorrect;
    }
}

/// Per-strategy history. Every catalog strategy always has an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, StrategyMetrics>", into = "BTreeMap<String, StrategyMetrics>")]
pub struct PerformanceProfile {
    metrics: BTreeMap<StrategyId, StrategyMetrics>,
}

impl PerformanceProfile {
    pub fn new() -> Self {
        Self {
            metrics: StrategyId::ALL
                .iter()
                .map(|id| (*id, StrategyMetrics::default()))
                .collect(),
        }
    }

    pub fn get(&self, strategy: StrategyId) -> StrategyMetrics {
        self.metrics.get(&strategy).copied().unwrap_or_default()
    }

    pub fn set(&mut self, strategy: StrategyId, metrics: StrategyMetrics) {
        self.metrics
            .insert(strategy, StrategyMetrics::new(metrics.correct, metrics.incorrect));
    }

    pub fn record(&mut self, strategy: StrategyId, is_correct: bool) {
        self.metrics.entry(strategy).or_default().record(is_correct);
    }

    pub fn merge(&mut self, other: &PerformanceProfile) {
        for (id, delta) in &other.metrics {
            self.metrics.entry(*id).or_default().merge(delta);
        }
    }

    pub fn total_attempts(&self) -> u32 {
        self.metrics.values().map(|m| m.total_attempts).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StrategyId, StrategyMetrics)> + '_ {
        self.metrics.iter().map(|(id, m)| (*id, *m))
    }
}

impl Default for PerformanceProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BTreeMap<String, StrategyMetrics>> for PerformanceProfile {
    fn from(raw: BTreeMap<String, StrategyMetrics>) -> Self {
        let mut profile = Self::new();
        for (key, metrics) in raw {
            match StrategyId::parse(&key) {
                Some(id) => profile.set(id, metrics),
                None => tracing::warn!(key = %key, "dropping metrics for unknown strategy"),
            }
        }
        profile
    }
}

impl From<PerformanceProfile> for BTreeMap<String, StrategyMetrics> {
    fn from(profile: PerformanceProfile) -> Self {
        profile
            .metrics
            .into_iter()
            .map(|(id, m)| (id.as_str().to_string(), m))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: String,
    pub operation_type: Operation,
    pub operands: [i64; 2],
    pub correct_answer: i64,
    /// Absent only for generic fallback problems.
    pub intended_strategy: Option<StrategyId>,
    pub difficulty: DifficultyLevel,
    /// Seconds spent before answering or timing out.
    pub time_spent: u32,
    pub attempted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Problem {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn is_timed_out(&self) -> bool {
        self.completed_at.is_some() && self.user_answer.is_none()
    }

    pub fn prompt(&self) -> String {
        format!(
            "{} {} {} = ?",
            self.operands[0],
            self.operation_type.symbol(),
            self.operands[1]
        )
    }
}
