#![allow(dead_code)]

use mental_math_drill::practice::{PracticeEngine, UserPreferences};
use mental_math_drill::session::{AnswerOutcome, SessionController, UserProfile};
use mental_math_drill::store::{MemoryStore, ProfileStore};

pub const USER: &str = "learner";

pub fn prefs(session_length: u32, time_limit: u32) -> UserPreferences {
    UserPreferences {
        session_length,
        time_limit,
        ..Default::default()
    }
}

pub fn seeded_store(preferences: UserPreferences) -> MemoryStore {
    let mut profile = UserProfile::new(USER);
    profile.preferences = preferences;
    MemoryStore::with_profile(profile)
}

pub fn controller<S: ProfileStore>(store: S, seed: u64) -> SessionController<S> {
    SessionController::new(store, PracticeEngine::with_seed(seed))
}

/// Answers the current problem, right or deliberately wrong.
pub fn answer<S: ProfileStore>(ctl: &mut SessionController<S>, correct: bool) -> AnswerOutcome {
    let expected = ctl
        .current_problem()
        .map(|p| p.correct_answer)
        .expect("a problem should be on screen");
    let given = if correct { expected } else { expected + 1 };
    ctl.submit_answer(&given.to_string())
        .expect("answer should be accepted")
}
