//! Configuration module for pipeattach.
//!
//! Handles loading and parsing the .pipeattachrc configuration file.

pub mod platform;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub use platform::Platform;

use crate::logging::LogConfig;
use crate::pipe::{DEFAULT_DEBUGGER_COMMAND, PipeCommandBuilder};

/// Default .pipeattachrc file content with all settings documented.
const DEFAULT_RC: &str = r#"# pipeattach Configuration File
# =============================
# This file is read on startup.
# Lines starting with '#' are comments.
#
# Pipe Commands
# -------------
# Command substituted for ${debuggerCommand} in pipeArgs, or appended
# when pipeArgs doesn't mention it.
# debugger_command = sh -s
#
# Quote pipe arguments that contain whitespace (true/false).
# A launch configuration's "quoteArgs" can still turn this off.
# quote_args = true

# .NET SDK
# --------
# Comma separated directories searched for the dotnet executable before
# falling back to PATH.
# dotnet_cli_paths = /usr/share/dotnet, /usr/local/share/dotnet

# Logging Configuration
# ---------------------
# Logs are stored in ~/.pipeattach/logs/ with automatic cleanup.
#
# log_enabled = true       # Enable/disable file logging (true/false)
# log_level = info         # Log level: trace, debug, info, warn, error, off
# log_retention = 24       # Hours to keep log files (default: 24)
"#;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to config file.
    pub config_path: PathBuf,
    /// Text substituted for the debugger command placeholder.
    pub debugger_command: String,
    /// Quote pipe arguments containing whitespace.
    pub quote_args: bool,
    /// Directories searched for the dotnet executable.
    pub dotnet_cli_paths: Vec<PathBuf>,
    /// Logging configuration.
    pub log_config: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: Self::default_config_path(),
            debugger_command: DEFAULT_DEBUGGER_COMMAND.to_string(),
            quote_args: true,
            dotnet_cli_paths: Vec::new(),
            log_config: LogConfig::default(),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "yes" | "1" | "on")
}

impl Config {
    /// Returns the default config file path (~/.pipeattachrc).
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pipeattachrc")
    }

    /// Loads configuration from the default path, creating it if it doesn't exist.
    ///
    /// # Errors
    /// Returns error if config cannot be read.
    pub fn load() -> io::Result<Self> {
        let path = Self::default_config_path();
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    ///
    /// # Errors
    /// Returns error if config cannot be read.
    pub fn load_from(path: &Path) -> io::Result<Self> {
        if !path.exists() {
            Self::create_default_config(path)?;
        }

        let content = fs::read_to_string(path)?;
        let mut config = Self {
            config_path: path.to_path_buf(),
            ..Self::default()
        };
        config.parse(&content);
        Ok(config)
    }

    /// Creates the default config file.
    fn create_default_config(path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        file.write_all(DEFAULT_RC.as_bytes())?;
        Ok(())
    }

    /// Parses the config file content.
    pub fn parse(&mut self, content: &str) {
        for line in content.lines() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();

                let value = strip_inline_comment(value);

                self.apply_setting(key, value);
            }
        }
    }

    /// Applies a single setting.
    fn apply_setting(&mut self, key: &str, value: &str) {
        match key {
            "debugger_command" => {
                if !value.is_empty() {
                    self.debugger_command = value.to_string();
                }
            }
            "quote_args" => {
                self.quote_args = parse_bool(value);
            }
            "dotnet_cli_paths" => {
                self.dotnet_cli_paths = value
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
                    .collect();
            }
            "log_level" => {
                self.log_config.level = LogConfig::parse_level(value);
            }
            "log_retention" | "log_retention_hours" => {
                self.log_config.retention_hours = LogConfig::parse_retention(value);
            }
            "log_enabled" | "logging" => {
                self.log_config.enabled = parse_bool(value);
            }
            _ => {
                tracing::debug!("Ignoring unknown setting '{}'", key);
            }
        }
    }

    /// Returns a pipe command builder for these settings.
    #[must_use]
    pub fn pipe_command_builder(&self) -> PipeCommandBuilder {
        PipeCommandBuilder::new(self.debugger_command.clone()).with_quote_args(self.quote_args)
    }
}

/// Removes a trailing `# comment` from a setting value.
///
/// `#` only starts a comment outside quotes and after whitespace.
fn strip_inline_comment(value: &str) -> &str {
    let mut quote = None;
    let mut prev = None;

    for (i, c) in value.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '#' && prev.is_some_and(char::is_whitespace) => {
                return value[..i].trim_end();
            }
            None => {}
        }
        prev = Some(c);
    }

    value
}
