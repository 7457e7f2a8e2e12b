//! Logging infrastructure for satlink
//!
//! This module provides configurable logging using the `tracing` crate and a
//! couple of structured helpers for the events every link-layer component
//! emits: table loads and ACM decisions.

use std::fmt;
use tracing::Level;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level (default)
    #[default]
    Info,
    /// Warn level
    Warn,
    /// Error level - least verbose
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("unknown log level: {s}")),
        }
    }
}

/// Initialize the tracing subscriber with the specified log level.
///
/// Call once at application startup. `RUST_LOG` overrides the level.
///
/// # Example
///
/// ```no_run
/// use satlink_common::logging::{init_logging, LogLevel};
///
/// init_logging(LogLevel::Debug);
/// ```
pub fn init_logging(level: LogLevel) {
    init_logging_with_filter(&level.to_string());
}

/// Initialize logging with a custom filter string.
///
/// # Example
///
/// ```no_run
/// use satlink_common::logging::init_logging_with_filter;
///
/// // Info everywhere, debug for the return-link crate
/// init_logging_with_filter("info,satlink_rtn=debug");
/// ```
pub fn init_logging_with_filter(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_span_events(FmtSpan::NONE)
        .init();
}

/// Link direction, used as a structured field in log events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDirection {
    /// Gateway to terminal (DVB-S2)
    Forward,
    /// Terminal to gateway (DVB-RCS2)
    Return,
}

impl fmt::Display for LinkDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkDirection::Forward => write!(f, "FWD"),
            LinkDirection::Return => write!(f, "RTN"),
        }
    }
}

/// Log a successfully loaded table (waveforms, BLER curves, ...).
pub fn log_table_loaded(direction: LinkDirection, table: &str, path: &std::path::Path, rows: usize) {
    tracing::debug!(
        direction = %direction,
        table = table,
        path = %path.display(),
        rows = rows,
        "{} {} table loaded",
        direction,
        table
    );
}

/// Log the outcome of an ACM selection at trace level.
///
/// `selected` is `None` when no candidate satisfied the C/N0 requirement.
pub fn log_acm_decision(direction: LinkDirection, cno: f64, selected: Option<&dyn fmt::Display>) {
    match selected {
        Some(choice) => tracing::trace!(
            direction = %direction,
            cno = cno,
            selected = %choice,
            "{} ACM selection",
            direction
        ),
        None => tracing::trace!(
            direction = %direction,
            cno = cno,
            "{} ACM selection found no candidate",
            direction
        ),
    }
}
