use crate::practice::catalog::StrategyId;
use crate::practice::types::PerformanceProfile;

/// Per-attempt strategy outcomes for the running session.
///
/// Each answer or timeout lands here immediately; the persisted profile only
/// sees the accumulated delta when the session completes.
#[derive(Debug, Clone, Default)]
pub struct PerformanceTracker {
    delta: PerformanceProfile,
    attempts: u32,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, strategy: Option<StrategyId>, is_correct: bool) {
        self.attempts += 1;
        match strategy {
            Some(id) => {
                self.delta.record(id, is_correct);
                tracing::debug!(strategy = %id, correct = is_correct, "attempt recorded");
            }
            None => tracing::debug!(correct = is_correct, "untracked attempt recorded"),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn delta(&self) -> &PerformanceProfile {
        &self.delta
    }

    pub fn into_delta(self) -> PerformanceProfile {
        self.delta
    }
}
