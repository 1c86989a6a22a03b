//! File logging for pipeattach.
//!
//! Stdout carries the generated commands, so diagnostics go to
//! timestamped files in ~/.pipeattach/logs/, cleaned up after the
//! retention period.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Default log retention in hours.
pub const DEFAULT_LOG_RETENTION_HOURS: u32 = 24;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log retention period in hours.
    pub retention_hours: u32,
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Whether logging is enabled.
    pub enabled: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            retention_hours: DEFAULT_LOG_RETENTION_HOURS,
            level: DEFAULT_LOG_LEVEL.to_string(),
            enabled: true,
        }
    }
}

impl LogConfig {
    /// Parses log level from string.
    #[must_use]
    pub fn parse_level(value: &str) -> String {
        match value.to_lowercase().as_str() {
            "trace" => "trace".to_string(),
            "debug" => "debug".to_string(),
            "info" => "info".to_string(),
            "warn" | "warning" => "warn".to_string(),
            "error" => "error".to_string(),
            "off" | "none" | "disabled" => "off".to_string(),
            _ => DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    /// Parses retention hours from string.
    #[must_use]
    pub fn parse_retention(value: &str) -> u32 {
        value.parse().unwrap_or(DEFAULT_LOG_RETENTION_HOURS)
    }
}

/// Returns the log directory path (~/.pipeattach/logs/).
#[must_use]
pub fn log_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pipeattach")
        .join("logs")
}

/// Returns a fresh log file path inside `dir`.
#[must_use]
pub fn log_file_path(dir: &Path) -> PathBuf {
    let now = chrono::Local::now();
    dir.join(format!("pipeattach_{}.log", now.format("%Y-%m-%d_%H-%M-%S")))
}

/// Deletes `.log` files in `dir` older than the retention period.
///
/// # Errors
/// Returns error if directory cannot be read.
pub fn cleanup_old_logs(dir: &Path, retention_hours: u32) -> io::Result<u32> {
    if !dir.exists() {
        return Ok(0);
    }

    let retention = Duration::from_secs(u64::from(retention_hours) * 3600);
    let now = SystemTime::now();
    let mut deleted_count = 0;

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().and_then(|e| e.to_str()) != Some("log") {
            continue;
        }

        let age = fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());

        if age.is_some_and(|age| age > retention) && fs::remove_file(&path).is_ok() {
            deleted_count += 1;
        }
    }

    Ok(deleted_count)
}

/// Initializes the logging system.
///
/// `RUST_LOG` takes precedence over the configured level.
///
/// # Errors
/// Returns error if the log directory or file cannot be created.
pub fn init(config: &LogConfig) -> io::Result<()> {
    if !config.enabled || config.level == "off" {
        return Ok(());
    }

    let log_dir = log_directory();
    fs::create_dir_all(&log_dir)?;

    let deleted = cleanup_old_logs(&log_dir, config.retention_hours)?;

    let log_path = log_file_path(&log_dir);
    let log_file = File::create(&log_path)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();

    tracing::info!("pipeattach logging initialized");
    tracing::info!("Log file: {}", log_path.display());
    tracing::info!("Log level: {}", config.level);
    if deleted > 0 {
        tracing::info!("Cleaned up {} old log file(s)", deleted);
    }

    Ok(())
}
