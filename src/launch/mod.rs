//! Launch configuration module.
//!
//! Reads debug configurations from launch.json files and resolves attach
//! requests before they are handed to the debugger:
//! - Picking a process when an attach request names none
//! - Selecting the target architecture for translated macOS processes
//! - Deciding whether the HTTPS development certificate should be checked

mod json;
pub mod resolver;

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::pipe::PipeTransport;
use crate::process::{AttachItem, ProcessError};

pub use json::strip_json_comments;
pub use resolver::{DebugConfigurationResolver, HostInfo, ResolvedConfiguration};

/// Maximum launch.json size (1MB).
const MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Launch configuration errors.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON parsing error.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// File too large.
    #[error("File too large (max {MAX_FILE_SIZE} bytes)")]
    FileTooLarge,

    /// No configuration with the requested name.
    #[error("No launch configuration named '{0}'")]
    NotFound(String),

    /// The configuration has no pipe transport.
    #[error("Launch configuration '{0}' has no pipeTransport")]
    NoPipeTransport(String),

    /// The user did not choose a process to attach to.
    #[error("No process was selected")]
    NoProcessSelected,

    /// Listing processes failed.
    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// Debug request kind.
///
/// Unrecognized values are kept verbatim so they serialize back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Request {
    #[default]
    Launch,
    Attach,
    Other(String),
}

impl From<String> for Request {
    fn from(value: String) -> Self {
        match value.as_str() {
            "launch" => Self::Launch,
            "attach" => Self::Attach,
            _ => Self::Other(value),
        }
    }
}

impl From<Request> for String {
    fn from(request: Request) -> Self {
        match request {
            Request::Launch => "launch".to_string(),
            Request::Attach => "attach".to_string(),
            Request::Other(value) => value,
        }
    }
}

/// A single entry of `configurations` in launch.json.
///
/// Keys this crate doesn't interpret are kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfiguration {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub request: Request,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipe_transport: Option<PipeTransport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_for_dev_cert: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_ready_action: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_architecture: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Returns true for values a launch.json author would consider "unset".
fn is_unset(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(_) => false,
    }
}

impl LaunchConfiguration {
    /// Returns true if this is an attach request without a target process.
    #[must_use]
    pub fn needs_process_selection(&self) -> bool {
        self.request == Request::Attach
            && is_unset(self.process_id.as_ref())
            && self.process_name.as_deref().is_none_or(str::is_empty)
    }

    /// Records the chosen process.
    ///
    /// On Apple Silicon hosts, `coreclr` configurations also get a target
    /// architecture matching the process (`x86_64` under Rosetta).
    pub fn apply_selected_process(&mut self, item: &AttachItem, host: &HostInfo) {
        self.process_id = Some(Value::String(item.id.to_string()));

        if self.kind == "coreclr" && host.is_apple_silicon() {
            let arch = if item.is_translated() { "x86_64" } else { "arm64" };
            self.target_architecture = Some(arch.to_string());
        }
    }

    /// Returns the pipe transport or an error naming this configuration.
    pub fn require_pipe_transport(&self) -> Result<&PipeTransport, LaunchError> {
        self.pipe_transport
            .as_ref()
            .ok_or_else(|| LaunchError::NoPipeTransport(self.name.clone()))
    }
}

/// A parsed launch.json file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaunchFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub configurations: Vec<LaunchConfiguration>,
}

impl LaunchFile {
    /// Parses launch.json content, allowing comments.
    pub fn parse(content: &str) -> Result<Self, LaunchError> {
        let clean = strip_json_comments(content);
        Ok(serde_json::from_str(&clean)?)
    }

    /// Loads a launch.json file.
    pub fn load(path: &Path) -> Result<Self, LaunchError> {
        let metadata = fs::metadata(path)?;
        if metadata.len() > MAX_FILE_SIZE {
            return Err(LaunchError::FileTooLarge);
        }

        let content = fs::read_to_string(path)?;
        let file = Self::parse(&content)?;
        tracing::debug!(
            "Loaded {} launch configuration(s) from {}",
            file.configurations.len(),
            path.display()
        );
        Ok(file)
    }

    /// Finds a configuration by name.
    pub fn find(&self, name: &str) -> Result<&LaunchConfiguration, LaunchError> {
        self.configurations
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| LaunchError::NotFound(name.to_string()))
    }

    /// Returns the first configuration that has a pipe transport.
    #[must_use]
    pub fn first_with_pipe_transport(&self) -> Option<&LaunchConfiguration> {
        self.configurations
            .iter()
            .find(|c| c.pipe_transport.is_some())
    }
}
