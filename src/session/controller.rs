use chrono::Utc;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::practice::catalog::StrategyId;
use crate::practice::engine::PracticeEngine;
use crate::practice::types::Problem;
use crate::session::stats::{finalize_aggregates, merge_session};
use crate::session::tracker::PerformanceTracker;
use crate::session::types::{Session, SessionState, SessionSummary, SessionView, UserProfile};
use crate::session::{SessionError, SessionResult};
use crate::store::ProfileStore;

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub problem: Problem,
    pub is_correct: bool,
    pub timed_out: bool,
    /// Present when this outcome finished the session.
    pub summary: Option<SessionSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Not active (paused, finished or never started).
    Ignored,
    Running { remaining: u32 },
    TimedOut(AnswerOutcome),
}

/// Drives one practice session at a time:
/// `NotStarted -> Active <-> Paused -> Completed`.
///
/// Every mutation goes through `&mut self`, so ticks, answers and focus
/// changes are applied one at a time.
pub struct SessionController<S: ProfileStore, R: Rng = ChaCha8Rng> {
    store: S,
    engine: PracticeEngine<R>,
    state: SessionState,
    profile: Option<UserProfile>,
    session: Option<Session>,
    tracker: PerformanceTracker,
    summary: Option<SessionSummary>,
    index: usize,
    time_limit: u32,
    time_remaining: u32,
}

impl<S: ProfileStore, R: Rng> SessionController<S, R> {
    pub fn new(store: S, engine: PracticeEngine<R>) -> Self {
        Self {
            store,
            engine,
            state: SessionState::NotStarted,
            profile: None,
            session: None,
            tracker: PerformanceTracker::new(),
            summary: None,
            index: 0,
            time_limit: 0,
            time_remaining: 0,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Summary of the last completed session, kept even if persisting it
    /// failed.
    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn tracker(&self) -> &PerformanceTracker {
        &self.tracker
    }

    pub fn current_problem(&self) -> Option<&Problem> {
        match self.state {
            SessionState::Active | SessionState::Paused => {
                self.session.as_ref().and_then(|s| s.problems.get(self.index))
            }
            _ => None,
        }
    }

    pub fn start_session(&mut self, user_id: &str) -> SessionResult<&Session> {
        self.begin(user_id, None)
    }

    /// Session where every problem targets one strategy, for remedial
    /// practice. Weighting is bypassed.
    pub fn start_focused_session(
        &mut self,
        user_id: &str,
        strategy: StrategyId,
    ) -> SessionResult<&Session> {
        self.begin(user_id, Some(strategy))
    }

    fn begin(&mut self, user_id: &str, focus: Option<StrategyId>) -> SessionResult<&Session> {
        if matches!(self.state, SessionState::Active | SessionState::Paused) {
            return Err(SessionError::SessionInProgress);
        }

        let profile = self
            .store
            .load_profile(user_id)?
            .unwrap_or_else(|| UserProfile::new(user_id));

        // this snapshot drives the whole batch
        let preferences = &profile.preferences;
        let count = preferences.effective_session_length();
        let problems: Vec<Problem> = match focus {
            Some(strategy) => (0..count)
                .filter_map(|_| {
                    self.engine
                        .generate_problem(preferences, &profile.performance, Some(strategy))
                })
                .collect(),
            None => self
                .engine
                .generate_batch(preferences, &profile.performance, count),
        };

        if problems.is_empty() {
            tracing::warn!(user_id = %user_id, "refusing to start session without problems");
            return Err(SessionError::NoEnabledOperations);
        }

        self.time_limit = preferences.effective_time_limit();
        self.time_remaining = self.time_limit;
        self.index = 0;
        self.tracker = PerformanceTracker::new();
        self.summary = None;
        self.state = SessionState::Active;

        let mut session = Session::new(user_id, problems);
        if let Some(first) = session.problems.first_mut() {
            first.attempted_at = Utc::now();
        }
        tracing::info!(
            user_id = %user_id,
            session_id = %session.id,
            problems = session.problems.len(),
            focus = focus.map(|s| s.as_str()).unwrap_or("weighted"),
            "session started"
        );

        self.profile = Some(profile);
        Ok(&*self.session.insert(session))
    }

    /// One-second timer tick. Only counts down while active.
    pub fn tick(&mut self) -> SessionResult<TickOutcome> {
        if self.state != SessionState::Active {
            return Ok(TickOutcome::Ignored);
        }

        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining > 0 {
            return Ok(TickOutcome::Running {
                remaining: self.time_remaining,
            });
        }

        let problem = self.resolve_current(None)?;
        tracing::debug!(problem_id = %problem.id, "problem timed out");
        let summary = self.advance()?;
        Ok(TickOutcome::TimedOut(AnswerOutcome {
            problem,
            is_correct: false,
            timed_out: true,
            summary,
        }))
    }

    /// Focus lost. Returns whether the state changed.
    pub fn pause(&mut self) -> bool {
        if self.state == SessionState::Active {
            self.state = SessionState::Paused;
            tracing::debug!(remaining = self.time_remaining, "session paused");
            true
        } else {
            false
        }
    }

    /// Focus regained. Returns whether the state changed.
    pub fn resume(&mut self) -> bool {
        if self.state == SessionState::Paused {
            self.state = SessionState::Active;
            tracing::debug!(remaining = self.time_remaining, "session resumed");
            true
        } else {
            false
        }
    }

    pub fn submit_answer(&mut self, raw: &str) -> SessionResult<AnswerOutcome> {
        if self.state != SessionState::Active {
            return Err(SessionError::NotActive(self.state.as_str()));
        }
        let answer: i64 = raw
            .trim()
            .parse()
            .map_err(|_| SessionError::InvalidAnswer(raw.to_string()))?;

        let problem = self.resolve_current(Some(answer))?;
        let is_correct = problem.is_correct == Some(true);
        let summary = self.advance()?;
        Ok(AnswerOutcome {
            problem,
            is_correct,
            timed_out: false,
            summary,
        })
    }

    /// Early termination. Problems not yet reached are left out of every
    /// aggregate. A second call after completion is a no-op.
    pub fn end_session(&mut self) -> SessionResult<Option<SessionSummary>> {
        match self.state {
            SessionState::NotStarted => Err(SessionError::NoActiveSession),
            SessionState::Completed => Ok(None),
            SessionState::Active | SessionState::Paused => self.complete(),
        }
    }

    /// Drops the current session without finalizing it. Nothing is written
    /// to the store.
    pub fn clear_session(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!(session_id = %session.id, completed = session.completed, "session cleared");
        }
        self.profile = None;
        self.tracker = PerformanceTracker::new();
        self.summary = None;
        self.index = 0;
        self.time_remaining = 0;
        self.state = SessionState::NotStarted;
    }

    pub fn view(&self) -> SessionView {
        let (session_length, resolved) = self
            .session
            .as_ref()
            .map(|s| (s.problems.len(), s.completed_problems().count()))
            .unwrap_or((0, 0));
        let progress = if session_length > 0 {
            resolved as f64 / session_length as f64
        } else {
            0.0
        };
        let live = matches!(self.state, SessionState::Active | SessionState::Paused);
        SessionView {
            state: self.state,
            current_problem: self.current_problem().cloned(),
            index: self.index,
            session_length,
            time_remaining: if live { self.time_remaining } else { 0 },
            time_elapsed: if live {
                self.time_limit - self.time_remaining
            } else {
                0
            },
            paused: self.state == SessionState::Paused,
            completed: self.state == SessionState::Completed,
            progress,
        }
    }

    /// Stamps the current problem once and reports it to the tracker.
    fn resolve_current(&mut self, answer: Option<i64>) -> SessionResult<Problem> {
        let time_spent = self.time_limit - self.time_remaining;
        let session = self.session.as_mut().ok_or(SessionError::NoActiveSession)?;
        let problem = session
            .problems
            .get_mut(self.index)
            .ok_or(SessionError::NoActiveSession)?;

        let is_correct = answer == Some(problem.correct_answer);
        problem.user_answer = answer;
        problem.is_correct = Some(is_correct);
        problem.time_spent = time_spent;
        problem.completed_at = Some(Utc::now());

        self.tracker.record(problem.intended_strategy, is_correct);
        Ok(problem.clone())
    }

    fn advance(&mut self) -> SessionResult<Option<SessionSummary>> {
        let total = self.session.as_ref().map(|s| s.problems.len()).unwrap_or(0);
        if self.index + 1 < total {
            self.index += 1;
            self.time_remaining = self.time_limit;
            if let Some(next) = self
                .session
                .as_mut()
                .and_then(|s| s.problems.get_mut(self.index))
            {
                next.attempted_at = Utc::now();
            }
            Ok(None)
        } else {
            self.complete()
        }
    }

    fn complete(&mut self) -> SessionResult<Option<SessionSummary>> {
        if self.state == SessionState::Completed {
            return Ok(None);
        }
        let (Some(session), Some(profile)) = (self.session.as_mut(), self.profile.as_mut()) else {
            return Err(SessionError::NoActiveSession);
        };
        if session.completed {
            return Ok(None);
        }

        session.completed = true;
        session.end_time = Some(Utc::now());
        finalize_aggregates(session);
        self.state = SessionState::Completed;

        let delta = std::mem::take(&mut self.tracker).into_delta();
        profile.performance.merge(&delta);
        merge_session(&mut profile.statistics, session);

        let summary = SessionSummary {
            session: session.clone(),
            statistics: profile.statistics.clone(),
            performance_delta: delta,
        };
        self.summary = Some(summary.clone());

        tracing::info!(
            session_id = %session.id,
            correct = session.total_correct,
            wrong = session.total_wrong,
            completed = session.session_length,
            streak = profile.statistics.current_streak,
            "session completed"
        );

        self.store.save_session(session)?;
        self.store.save_profile(profile)?;
        Ok(Some(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::practice::types::{Operation, UserPreferences};
    use crate::store::MemoryStore;

    fn controller_with(prefs: UserPreferences) -> SessionController<MemoryStore> {
        let mut profile = UserProfile::new("ada");
        profile.preferences = prefs;
        SessionController::new(MemoryStore::with_profile(profile), PracticeEngine::with_seed(17))
    }

    fn short_prefs(length: u32, time_limit: u32) -> UserPreferences {
        UserPreferences {
            session_length: length,
            time_limit,
            ..Default::default()
        }
    }

    fn answer_current(ctl: &mut SessionController<MemoryStore>, correct: bool) -> AnswerOutcome {
        let expected = ctl.current_problem().unwrap().correct_answer;
        let given = if correct { expected } else { expected + 1 };
        ctl.submit_answer(&given.to_string()).unwrap()
    }

    #[test]
    fn test_start_requires_an_enabled_operation() {
        let mut ctl = controller_with(UserPreferences {
            enabled_operations: vec![],
            ..Default::default()
        });
        let err = ctl.start_session("ada").unwrap_err();
        assert!(matches!(err, SessionError::NoEnabledOperations));
        assert_eq!(ctl.state(), SessionState::NotStarted);
        assert!(ctl.session().is_none());
    }

    #[test]
    fn test_unknown_user_gets_default_profile() {
        let mut ctl = SessionController::new(MemoryStore::new(), PracticeEngine::with_seed(1));
        let session = ctl.start_session("newcomer").unwrap();
        assert_eq!(session.problems.len(), UserPreferences::default().session_length as usize);
        assert_eq!(ctl.state(), SessionState::Active);
    }

    #[test]
    fn test_cannot_start_twice() {
        let mut ctl = controller_with(short_prefs(3, 10));
        ctl.start_session("ada").unwrap();
        assert!(matches!(
            ctl.start_session("ada"),
            Err(SessionError::SessionInProgress)
        ));
    }

    #[test]
    fn test_timer_counts_down_and_times_out() {
        let mut ctl = controller_with(short_prefs(2, 3));
        ctl.start_session("ada").unwrap();

        assert_eq!(ctl.tick().unwrap(), TickOutcome::Running { remaining: 2 });
        assert_eq!(ctl.tick().unwrap(), TickOutcome::Running { remaining: 1 });
        let outcome = match ctl.tick().unwrap() {
            TickOutcome::TimedOut(outcome) => outcome,
            other => panic!("expected timeout, got {other:?}"),
        };
        assert!(outcome.timed_out);
        assert!(outcome.problem.user_answer.is_none());
        assert_eq!(outcome.problem.is_correct, Some(false));
        assert_eq!(outcome.problem.time_spent, 3);
        assert!(outcome.summary.is_none());

        // timer resets for the next problem
        assert_eq!(ctl.view().time_remaining, 3);
        assert_eq!(ctl.view().index, 1);
    }

    #[test]
    fn test_pause_freezes_timer() {
        let mut ctl = controller_with(short_prefs(2, 2));
        ctl.start_session("ada").unwrap();
        assert!(ctl.pause());
        assert!(!ctl.pause());
        for _ in 0..10 {
            assert_eq!(ctl.tick().unwrap(), TickOutcome::Ignored);
        }
        assert_eq!(ctl.view().time_remaining, 2);
        assert!(ctl.view().paused);
        assert!(matches!(
            ctl.submit_answer("4"),
            Err(SessionError::NotActive("paused"))
        ));

        assert!(ctl.resume());
        assert_eq!(ctl.tick().unwrap(), TickOutcome::Running { remaining: 1 });
    }

    #[test]
    fn test_invalid_answer_leaves_problem_open() {
        let mut ctl = controller_with(short_prefs(2, 10));
        ctl.start_session("ada").unwrap();
        assert!(matches!(
            ctl.submit_answer("twelve"),
            Err(SessionError::InvalidAnswer(_))
        ));
        assert_eq!(ctl.view().index, 0);
        assert!(ctl.current_problem().unwrap().completed_at.is_none());
        assert_eq!(ctl.tracker().attempts(), 0);
    }

    #[test]
    fn test_answer_stamps_time_spent() {
        let mut ctl = controller_with(short_prefs(2, 10));
        ctl.start_session("ada").unwrap();
        ctl.tick().unwrap();
        ctl.tick().unwrap();
        let outcome = answer_current(&mut ctl, true);
        assert!(outcome.is_correct);
        assert_eq!(outcome.problem.time_spent, 2);
        assert!(outcome.problem.completed_at.is_some());
        assert_eq!(ctl.tracker().attempts(), 1);
    }

    #[test]
    fn test_answers_are_trimmed() {
        let mut ctl = controller_with(short_prefs(1, 10));
        ctl.start_session("ada").unwrap();
        let answer = ctl.current_problem().unwrap().correct_answer;
        let outcome = ctl.submit_answer(&format!("  {answer}\n")).unwrap();
        assert!(outcome.is_correct);
        assert!(outcome.summary.is_some());
    }

    #[test]
    fn test_profile_untouched_until_completion() {
        let mut ctl = controller_with(short_prefs(3, 10));
        ctl.start_session("ada").unwrap();
        answer_current(&mut ctl, true);
        answer_current(&mut ctl, false);

        let stored = ctl.store().load_profile("ada").unwrap().unwrap();
        assert_eq!(stored.performance.total_attempts(), 0);
        assert_eq!(ctl.store().write_count(), 0);

        let outcome = answer_current(&mut ctl, true);
        let summary = outcome.summary.unwrap();
        assert_eq!(summary.performance_delta.total_attempts(), 3);

        let stored = ctl.store().load_profile("ada").unwrap().unwrap();
        assert_eq!(stored.performance.total_attempts(), 3);
        assert_eq!(stored.statistics.total_sessions, 1);
        assert_eq!(ctl.store().load_sessions("ada").unwrap().len(), 1);
    }

    #[test]
    fn test_views_follow_progress() {
        let mut ctl = controller_with(short_prefs(4, 10));
        assert_eq!(ctl.view().state, SessionState::NotStarted);
        ctl.start_session("ada").unwrap();
        answer_current(&mut ctl, true);
        let view = ctl.view();
        assert!((view.progress - 0.25).abs() < 1e-9);
        assert_eq!(view.session_length, 4);
        assert!(view.current_problem.is_some());

        ctl.end_session().unwrap();
        let view = ctl.view();
        assert!(view.completed);
        assert!(view.current_problem.is_none());
        // early end keeps the fraction actually worked through
        assert!((view.progress - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_full_session_reaches_full_progress() {
        let mut ctl = controller_with(short_prefs(2, 10));
        ctl.start_session("ada").unwrap();
        answer_current(&mut ctl, true);
        answer_current(&mut ctl, false);
        assert_eq!(ctl.view().progress, 1.0);
    }

    #[test]
    fn test_progress_after_early_end_at_three_of_ten() {
        let mut ctl = controller_with(short_prefs(10, 10));
        ctl.start_session("ada").unwrap();
        for _ in 0..3 {
            answer_current(&mut ctl, true);
        }
        assert!(ctl.end_session().unwrap().is_some());
        let view = ctl.view();
        assert_eq!(view.session_length, 10);
        assert!((view.progress - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_focused_session_targets_one_strategy() {
        let mut ctl = controller_with(UserPreferences {
            enabled_operations: vec![Operation::Addition],
            session_length: 20,
            ..Default::default()
        });
        let session = ctl
            .start_focused_session("ada", StrategyId::DivisionEstimation)
            .unwrap();
        assert!(session
            .problems
            .iter()
            .all(|p| p.intended_strategy == Some(StrategyId::DivisionEstimation)));
    }

    #[test]
    fn test_new_session_after_completion() {
        let mut ctl = controller_with(short_prefs(1, 10));
        ctl.start_session("ada").unwrap();
        answer_current(&mut ctl, true);
        assert_eq!(ctl.state(), SessionState::Completed);

        let first_id = ctl.summary().unwrap().session.id.clone();
        let second = ctl.start_session("ada").unwrap();
        assert_ne!(second.id, first_id);
        assert_eq!(ctl.state(), SessionState::Active);
        // the snapshot now includes the previous session
        assert_eq!(ctl.profile().unwrap().statistics.total_sessions, 1);
    }
}
