//! Tracing subscriber setup.
//!
//! `RUST_LOG` takes precedence; otherwise this crate logs at the configured
//! `[log] level` and everything else at `warn`.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

use crate::config::{LogFormat, LogSection};

/// File name prefix for the daily-rolling log file.
const LOG_FILE_PREFIX: &str = "kanban.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Expand a bare level into a crate-scoped directive.
///
/// Values that already look like directives (`target=level`, lists) are kept.
pub fn filter_directive(level: &str) -> String {
    let level = level.trim();
    if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("warn,kanban={}", level)
    }
}

fn env_filter(section: &LogSection) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(filter_directive(&section.level))
            .with_context(|| format!("Invalid log level '{}'", section.level)),
    }
}

fn stdout_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Text => fmt::layer().boxed(),
        LogFormat::Json => fmt::layer().json().boxed(),
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process when `dir` is set.
pub fn init_logging(section: &LogSection) -> Result<Option<WorkerGuard>> {
    let filter = env_filter(section)?;
    let mut layers: Vec<BoxedLayer> = vec![stdout_layer(section.format)];

    let guard = match &section.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer().with_ansi(false).with_writer(writer);
            layers.push(match section.format {
                LogFormat::Text => file_layer.boxed(),
                LogFormat::Json => file_layer.json().boxed(),
            });
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_scopes_bare_level() {
        assert_eq!(filter_directive("debug"), "warn,kanban=debug");
        assert_eq!(filter_directive(" info "), "warn,kanban=info");
    }

    #[test]
    fn test_filter_directive_keeps_directives() {
        assert_eq!(filter_directive("kanban=trace"), "kanban=trace");
        assert_eq!(
            filter_directive("info,tower_http=debug"),
            "info,tower_http=debug"
        );
    }

    #[test]
    fn test_filter_directive_is_valid_env_filter() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(EnvFilter::try_new(filter_directive(level)).is_ok());
        }
    }
}
