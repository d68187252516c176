//! Stderr logger for the `stripmap` binary and benchmarks.
//!
//! Each record becomes one line, `[elapsed LEVEL crate] message`, where
//! `crate` is the first path segment of the record target, so planner,
//! sweep and solver output can be told apart without module noise. The
//! level passed by the caller is a fallback: `STRIPMAP_LOG`
//! (`error|warn|info|debug|trace|off`, any case) wins when it parses.
//!
//! With the `tracing` feature, [`init_tracing`] reads the same variable as
//! an `EnvFilter` directive and prints span close events, which carry the
//! duration of every instrumented planner stage.

use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable consulted by [`init_with_level`].
pub const LOG_ENV: &str = "STRIPMAP_LOG";

struct PlannerLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for PlannerLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(self.started.elapsed().as_secs_f64(), record);
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<PlannerLogger> = OnceLock::new();

fn format_line(elapsed: f64, record: &Record) -> String {
    let krate = record.target().split("::").next().unwrap_or("");
    format!(
        "[{:8.3}s {:>5} {}] {}",
        elapsed,
        record.level(),
        krate,
        record.args()
    )
}

/// `raw` as a level filter, or `default` when it is missing or unknown.
fn parse_level(raw: Option<&str>, default: LevelFilter) -> LevelFilter {
    raw.and_then(|raw| LevelFilter::from_str(raw.trim()).ok())
        .unwrap_or(default)
}

/// Install the logger, preferring `STRIPMAP_LOG` over `level` when set.
///
/// Only the first call decides the level; later calls return `Ok` without
/// touching the installed logger.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let level = parse_level(std::env::var(LOG_ENV).ok().as_deref(), level);
        let logger = LOGGER.get_or_init(|| PlannerLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(logger.level);
    }
    Ok(())
}

/// Install a `tracing` subscriber filtered by `STRIPMAP_LOG` (default
/// `info`) that reports span close times. `json` selects flattened JSON
/// events; otherwise lines carry the process uptime.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn lines_name_the_crate_of_the_target() {
        let line = format_line(
            1.5,
            &Record::builder()
                .level(Level::Warn)
                .target("stripmap_planner::graph")
                .args(format_args!("no edge"))
                .build(),
        );
        assert_eq!(line, "[   1.500s  WARN stripmap_planner] no edge");
    }

    #[test]
    fn unknown_levels_fall_back() {
        assert_eq!(parse_level(Some(" DEBUG "), LevelFilter::Info), LevelFilter::Debug);
        assert_eq!(parse_level(Some("off"), LevelFilter::Info), LevelFilter::Off);
        assert_eq!(parse_level(Some("loud"), LevelFilter::Warn), LevelFilter::Warn);
        assert_eq!(parse_level(None, LevelFilter::Error), LevelFilter::Error);
    }
}
