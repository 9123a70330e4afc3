use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::practice::types::{PerformanceProfile, Problem, UserPreferences};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    NotStarted,
    Active,
    Paused,
    Completed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "notstarted",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStatistics {
    pub total_problems: u64,
    pub correct_answers: u64,
    pub wrong_answers: u64,
    pub total_sessions: u64,
    /// Seconds, averaged over every completed problem.
    pub average_time_per_problem: f64,
    pub current_streak: u32,
    pub best_streak: u32,
}

impl UserStatistics {
    pub fn accuracy(&self) -> Option<f64> {
        if self.total_problems == 0 {
            None
        } else {
            Some(self.correct_answers as f64 / self.total_problems as f64)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub preferences: UserPreferences,
    #[serde(default)]
    pub statistics: UserStatistics,
    #[serde(default)]
    pub performance: PerformanceProfile,
}

impl UserProfile {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            created_at: Utc::now(),
            preferences: UserPreferences::default(),
            statistics: UserStatistics::default(),
            performance: PerformanceProfile::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub problems: Vec<Problem>,
    pub completed: bool,
    pub total_correct: u32,
    pub total_wrong: u32,
    /// Mean seconds per completed problem.
    pub average_time: f64,
    /// Completed problems once finalized; planned length before that.
    pub session_length: u32,
}

impl Session {
    pub fn new(user_id: impl Into<String>, problems: Vec<Problem>) -> Self {
        let session_length = problems.len() as u32;
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            start_time: Utc::now(),
            end_time: None,
            problems,
            completed: false,
            total_correct: 0,
            total_wrong: 0,
            average_time: 0.0,
            session_length,
        }
    }

    pub fn completed_problems(&self) -> impl Iterator<Item = &Problem> + '_ {
        self.problems.iter().filter(|p| p.is_completed())
    }
}

/// Result of finalizing a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session: Session,
    pub statistics: UserStatistics,
    /// Per-strategy outcomes recorded during this session alone.
    pub performance_delta: PerformanceProfile,
}

impl SessionSummary {
    pub fn accuracy(&self) -> Option<f64> {
        let attempted = self.session.total_correct + self.session.total_wrong;
        if attempted == 0 {
            None
        } else {
            Some(self.session.total_correct as f64 / attempted as f64)
        }
    }
}

/// Read-only snapshot for renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub state: SessionState,
    pub current_problem: Option<Problem>,
    pub index: usize,
    /// Planned problem count.
    pub session_length: usize,
    pub time_remaining: u32,
    pub time_elapsed: u32,
    pub paused: bool,
    pub completed: bool,
    /// Resolved problems over planned problems. An early end leaves it below
    /// 1.0.
    pub progress: f64,
}
