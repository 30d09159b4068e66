/// Structured logging for the feeding-station service
///
/// Provides context-rich logging with component and station identifiers
/// on top of `tracing`. Console output always goes to stderr; an optional
/// log file receives the same events without ANSI colours.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::sync::Mutex;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt as layer_fmt};

use crate::sync::SyncError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parses a level name as used in config files and `--log-level`.
    /// Unknown names fall back to `Info`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => LogLevel::Debug,
            "warn" | "warning" => LogLevel::Warning,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    fn directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Simulation,
    Alerts,
    Rewards,
    Sync,
    Store,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Simulation => write!(f, "SIM"),
            Component::Alerts => write!(f, "ALERT"),
            Component::Rewards => write!(f, "REWARD"),
            Component::Sync => write!(f, "SYNC"),
            Component::Store => write!(f, "STORE"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - e.g. a locally created user the backend has never seen
    Expected,
    /// Unexpected failure - indicates service degradation or configuration issue
    Unexpected,
    /// Unknown - typically transient network trouble
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Initialisation
// ---------------------------------------------------------------------------

/// Initialize the global subscriber.
///
/// `RUST_LOG` takes precedence over `min_level` when set. With a log file the
/// events are written to both stderr and the file. Calling this more than
/// once is harmless; later calls are ignored.
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    let file = log_file.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", path, e);
                None
            }
        }
    });

    // try_init fails if a subscriber is already installed (tests, embedders)
    let _ = build_subscriber(min_level, file, console_timestamps).try_init();
}

fn build_subscriber(
    min_level: LogLevel,
    file: Option<File>,
    console_timestamps: bool,
) -> impl tracing::Subscriber + Send + Sync {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(min_level.directive()));

    let console_timed = console_timestamps
        .then(|| layer_fmt::layer().with_target(false).with_writer(std::io::stderr));
    let console_plain = (!console_timestamps).then(|| {
        layer_fmt::layer()
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
    });
    let file_layer = file.map(|file| {
        layer_fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_timed)
        .with(console_plain)
        .with(file_layer)
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Log a general informational message
pub fn info(component: Component, station_id: Option<&str>, message: &str) {
    tracing::info!(component = %component, station = station_id.unwrap_or("-"), "{}", message);
}

/// Log a warning message
pub fn warn(component: Component, station_id: Option<&str>, message: &str) {
    tracing::warn!(component = %component, station = station_id.unwrap_or("-"), "{}", message);
}

/// Log an error message
pub fn error(component: Component, station_id: Option<&str>, message: &str) {
    tracing::error!(component = %component, station = station_id.unwrap_or("-"), "{}", message);
}

/// Log a debug message
pub fn debug(component: Component, station_id: Option<&str>, message: &str) {
    tracing::debug!(component = %component, station = station_id.unwrap_or("-"), "{}", message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a remote sync failure
pub fn classify_sync_failure(err: &SyncError) -> FailureType {
    match err {
        SyncError::Http(404) => FailureType::Expected,
        // A misconfigured backend or a rejected request will not fix itself
        SyncError::Http(_) | SyncError::InvalidUserId(_) | SyncError::InvalidConfig(_) => {
            FailureType::Unexpected
        }
        // Network hiccups are common on mobile connections
        SyncError::Timeout(_) | SyncError::Transport(_) => FailureType::Unknown,
    }
}

/// Log a remote sync failure with automatic classification.
///
/// Sync failures never reach callers, so this is the only trace they leave.
/// Nothing is logged above warning level: local state is still correct.
pub fn log_sync_failure(user_id: &str, operation: &str, err: &SyncError) {
    let failure_type = classify_sync_failure(err);
    let message = format!(
        "{} for user {} failed [{}]: {}; kept local state",
        operation, user_id, failure_type, err
    );

    match failure_type {
        FailureType::Expected => debug(Component::Sync, None, &message),
        FailureType::Unexpected | FailureType::Unknown => warn(Component::Sync, None, &message),
    }
}

// ---------------------------------------------------------------------------
// Tick Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one decay tick
pub fn log_tick_summary(tick_seq: u64, stations: usize, decayed: usize, notifications: usize) {
    let message = format!(
        "Tick {} complete: {}/{} stations decayed, {} notifications",
        tick_seq, decayed, stations, notifications
    );

    if notifications == 0 {
        debug(Component::Simulation, None, &message);
    } else {
        info(Component::Simulation, None, &message);
    }
}
