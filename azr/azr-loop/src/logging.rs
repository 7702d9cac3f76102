//! Global `tracing` subscriber setup for the `grootzero` binary.
//!
//! Libraries only emit events; installing a subscriber is left to the
//! process entry point.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use azr_types::{AzrError, Result};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

/// Parses a log level name.
///
/// Accepts the `tracing` names case-insensitively, plus `warning` and
/// `critical` as aliases for `warn` and `error`.
///
/// # Errors
///
/// Returns [`AzrError::Configuration`] for an unknown level.
///
/// # Example
///
/// ```
/// use azr_loop::logging::parse_level;
/// use tracing_subscriber::filter::LevelFilter;
///
/// assert_eq!(parse_level("WARNING").ok(), Some(LevelFilter::WARN));
/// assert!(parse_level("loud").is_err());
/// ```
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "error" | "critical" => Ok(LevelFilter::ERROR),
        "off" => Ok(LevelFilter::OFF),
        other => Err(AzrError::configuration(format!("unknown log level '{other}'"))),
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set. With `json`, stdout
/// receives one JSON object per event. With `log_file`, events are also
/// appended to that file without ANSI colors.
///
/// # Errors
///
/// Returns [`AzrError::Configuration`] for an unknown level or when a
/// global subscriber is already installed, and [`AzrError::Io`] if the log
/// file cannot be opened.
pub fn init(level: &str, json: bool, log_file: Option<&Path>) -> Result<()> {
    let level = parse_level(level)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_ascii_lowercase()));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let subscriber = Registry::default()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_target(true)))
        .with((!json).then(|| fmt::layer().with_target(true)))
        .with(file_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AzrError::configuration(format!("cannot install log subscriber: {e}")))
}
