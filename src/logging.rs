use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CRATE_TARGET: &str = "mental_math_drill";
const LOG_FILE_PREFIX: &str = "drill.log";

/// Keeps the background file writer alive; drop it last.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// A bare level such as `debug` applies to this crate only and keeps
/// dependencies at `warn`. Full directive lists are used as given.
pub fn filter_directives(log_level: &str) -> String {
    let level = log_level.trim();
    if level.is_empty() {
        return format!("warn,{CRATE_TARGET}=info");
    }
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    format!("warn,{CRATE_TARGET}={level}")
}

fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(filter_directives(log_level)).unwrap_or_else(|err| {
        eprintln!("invalid log filter {log_level:?}: {err}");
        EnvFilter::new(filter_directives("info"))
    })
}

/// Installs the global subscriber. Events go to stderr, compact, so they
/// never interleave with the prompts on stdout. With `log_dir` set, a daily
/// rolling file receives the same events.
pub fn init_tracing(log_level: &str, log_dir: Option<&Path>) -> Option<FileLogGuard> {
    let stderr_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file = log_dir.and_then(|dir| match std::fs::create_dir_all(dir) {
        Ok(()) => {
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
            Some(tracing_appender::non_blocking(appender))
        }
        Err(err) => {
            eprintln!("file logs disabled, cannot create {}: {err}", dir.display());
            None
        }
    });

    let registry = tracing_subscriber::registry()
        .with(build_filter(log_level))
        .with(stderr_layer);

    match file {
        Some((writer, guard)) => {
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            if registry.with(file_layer).try_init().is_err() {
                eprintln!("tracing subscriber already installed");
            }
            Some(FileLogGuard { _guard: guard })
        }
        None => {
            if registry.try_init().is_err() {
                eprintln!("tracing subscriber already installed");
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_level_is_scoped_to_crate() {
        assert_eq!(filter_directives("debug"), "warn,mental_math_drill=debug");
        assert_eq!(filter_directives(" trace "), "warn,mental_math_drill=trace");
        assert_eq!(filter_directives(""), "warn,mental_math_drill=info");
    }

    #[test]
    fn test_directive_lists_pass_through() {
        assert_eq!(filter_directives("info,tokio=debug"), "info,tokio=debug");
        assert_eq!(
            filter_directives("mental_math_drill::session=trace"),
            "mental_math_drill::session=trace"
        );
    }

    #[test]
    fn test_scoped_directives_parse() {
        for level in ["error", "warn", "info", "debug", "trace"] {
            assert!(EnvFilter::try_new(filter_directives(level)).is_ok(), "{level}");
        }
    }
}
