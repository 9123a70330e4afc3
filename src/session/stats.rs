use crate::session::types::{Session, UserStatistics};

/// Fills the session aggregates from problems that reached `completed_at`.
/// Unattempted problems are excluded from every figure, including
/// `session_length`.
pub fn finalize_aggregates(session: &mut Session) {
    let mut correct = 0u32;
    let mut wrong = 0u32;
    let mut time_total = 0u64;

    for problem in session.completed_problems() {
        if problem.is_correct == Some(true) {
            correct += 1;
        } else {
            wrong += 1;
        }
        time_total += problem.time_spent as u64;
    }

    let completed = correct + wrong;
    session.total_correct = correct;
    session.total_wrong = wrong;
    session.session_length = completed;
    session.average_time = if completed > 0 {
        time_total as f64 / completed as f64
    } else {
        0.0
    };
}

/// Folds a finalized session into lifetime statistics. Sessions with no
/// completed problem leave the statistics untouched.
pub fn merge_session(stats: &mut UserStatistics, session: &Session) {
    let completed = (session.total_correct + session.total_wrong) as u64;
    if completed == 0 {
        return;
    }

    let previous_total = stats.total_problems;
    let session_time = session.average_time * completed as f64;
    let new_total = previous_total + completed;

    stats.average_time_per_problem =
        (stats.average_time_per_problem * previous_total as f64 + session_time) / new_total as f64;
    stats.total_problems = new_total;
    stats.correct_answers += session.total_correct as u64;
    stats.wrong_answers += session.total_wrong as u64;
    stats.total_sessions += 1;

    if session.total_wrong == 0 {
        stats.current_streak += 1;
    } else {
        stats.current_streak = 0;
    }
    stats.best_streak = stats.best_streak.max(stats.current_streak);
}
