use std::process::ExitCode;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, Duration, MissedTickBehavior};

use mental_math_drill::config::EngineConfig;
use mental_math_drill::logging::init_tracing;
use mental_math_drill::practice::{PracticeEngine, StrategyKey};
use mental_math_drill::session::{
    AnswerOutcome, SessionController, SessionError, SessionResult, SessionSummary, TickOutcome,
};
use mental_math_drill::store::{JsonFileStore, ProfileStore};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = EngineConfig::from_env();
    let _log_guard = init_tracing(&config.log_level, config.log_dir.as_deref());

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "drill failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: EngineConfig) -> SessionResult<()> {
    let store = JsonFileStore::open(&config.data_dir)?;
    tracing::info!(data_dir = %config.data_dir.display(), user_id = %config.user_id, "store opened");

    let engine = PracticeEngine::new(config.seed, config.weighting.clone());
    let mut controller = SessionController::new(store, engine);

    let focus = config.focus.as_deref().and_then(|key| match StrategyKey::resolve(key) {
        StrategyKey::Known(strategy) => Some(strategy),
        _ => {
            tracing::warn!(key = %key, "focus is not a catalog strategy, running weighted session");
            None
        }
    });
    let planned = match focus {
        Some(strategy) => controller.start_focused_session(&config.user_id, strategy)?,
        None => controller.start_session(&config.user_id)?,
    }
    .problems
    .len();

    println!("{planned} problems. Type an answer and press enter; :pause, :resume or :quit.");
    render(&controller);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;

    let finished: SessionResult<Option<SessionSummary>> = loop {
        tokio::select! {
            _ = ticker.tick() => match controller.tick() {
                Ok(TickOutcome::TimedOut(outcome)) => {
                    report(&outcome);
                    if outcome.summary.is_some() {
                        break Ok(outcome.summary);
                    }
                    render(&controller);
                }
                Ok(_) => {}
                Err(err) => break Err(err),
            },
            line = lines.next_line() => match line {
                Ok(Some(line)) => match line.trim() {
                    "" => {}
                    ":quit" => break controller.end_session(),
                    ":pause" => {
                        if controller.pause() {
                            println!("paused");
                        }
                    }
                    ":resume" => {
                        if controller.resume() {
                            render(&controller);
                        }
                    }
                    answer => match controller.submit_answer(answer) {
                        Ok(outcome) => {
                            report(&outcome);
                            if outcome.summary.is_some() {
                                break Ok(outcome.summary);
                            }
                            render(&controller);
                        }
                        Err(SessionError::InvalidAnswer(_)) => println!("enter a whole number"),
                        Err(SessionError::NotActive(state)) => {
                            println!("session is {state}, type :resume to continue")
                        }
                        Err(err) => break Err(err),
                    },
                },
                // stdin closed
                Ok(None) => break controller.end_session(),
                Err(err) => {
                    tracing::warn!(error = %err, "stdin read failed, ending session");
                    break controller.end_session();
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, ending session early");
                break controller.end_session();
            }
        }
    };

    // shown even when saving failed
    if let Some(summary) = controller.summary() {
        print_summary(summary);
    }
    finished?;

    let history = controller.store().load_sessions(&config.user_id)?;
    tracing::info!(sessions = history.len(), "history saved");
    Ok(())
}

fn render<S: ProfileStore>(controller: &SessionController<S>) {
    let view = controller.view();
    if let Some(problem) = view.current_problem {
        println!(
            "[{}/{}] {}   ({}s)",
            view.index + 1,
            view.session_length,
            problem.prompt(),
            view.time_remaining
        );
    }
}

fn report(outcome: &AnswerOutcome) {
    let expected = outcome.problem.correct_answer;
    if outcome.timed_out {
        println!("time's up, the answer was {expected}");
    } else if outcome.is_correct {
        println!("correct");
    } else {
        println!("not quite, the answer was {expected}");
    }
}

fn print_summary(summary: &SessionSummary) {
    let session = &summary.session;
    let stats = &summary.statistics;
    println!();
    println!(
        "session: {} correct, {} wrong, {:.1}s per problem",
        session.total_correct, session.total_wrong, session.average_time
    );
    if let Some(accuracy) = summary.accuracy() {
        println!("accuracy: {:.0}%", accuracy * 100.0);
    }
    println!(
        "lifetime: {} problems over {} sessions, streak {} (best {})",
        stats.total_problems, stats.total_sessions, stats.current_streak, stats.best_streak
    );
}
