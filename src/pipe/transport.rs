//! Pipe transport descriptors.
//!
//! A pipe transport describes how to reach a remote or alternate shell
//! (SSH, WSL, `docker exec`, ...) when attaching a debugger. It mirrors the
//! `pipeTransport` object of a launch configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::Platform;

/// Arguments passed to the pipe program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipeArgs {
    /// A single, already shell-formatted fragment. Never re-tokenized.
    Line(String),
    /// An already tokenized argument list.
    List(Vec<String>),
}

impl Default for PipeArgs {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

/// Per-OS override of the program and arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipeTransportOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipe_program: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipe_args: Option<PipeArgs>,
}

/// The `pipeTransport` section of a launch configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipeTransport {
    /// Shell or launcher to invoke.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipe_program: Option<String>,
    /// Arguments for the pipe program.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipe_args: Option<PipeArgs>,
    /// Working directory for the spawned pipe program.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipe_cwd: Option<String>,
    /// Extra environment for the spawned pipe program.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pipe_env: BTreeMap<String, String>,
    /// Whether arguments containing whitespace get quoted (default true).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_args: Option<bool>,
    /// Debugger location on the far side of the pipe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debugger_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows: Option<PipeTransportOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub osx: Option<PipeTransportOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linux: Option<PipeTransportOverride>,
}

/// Program and arguments after applying the OS override.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPipe {
    pub program: Option<String>,
    pub args: Option<PipeArgs>,
}

impl PipeTransport {
    /// Returns the override section for a platform, if one is configured.
    #[must_use]
    pub fn override_for(&self, platform: Option<Platform>) -> Option<&PipeTransportOverride> {
        match platform? {
            Platform::Windows => self.windows.as_ref(),
            Platform::Osx => self.osx.as_ref(),
            Platform::Linux => self.linux.as_ref(),
        }
    }

    /// Resolves program and arguments for the target platform.
    ///
    /// Fields missing from the override fall back to the top-level values.
    /// An explicit empty argument list in the override is kept as is.
    #[must_use]
    pub fn resolve_for_os(&self, platform: Option<Platform>) -> ResolvedPipe {
        let Some(section) = self.override_for(platform) else {
            return ResolvedPipe {
                program: self.pipe_program.clone(),
                args: self.pipe_args.clone(),
            };
        };

        ResolvedPipe {
            program: section
                .pipe_program
                .clone()
                .or_else(|| self.pipe_program.clone()),
            args: section.pipe_args.clone().or_else(|| self.pipe_args.clone()),
        }
    }

    /// Resolves program and arguments for an OS tag such as `darwin`.
    #[must_use]
    pub fn resolve_for_tag(&self, tag: &str) -> ResolvedPipe {
        self.resolve_for_os(Platform::from_tag(tag))
    }

    /// Returns the quoting flag, defaulting to true.
    #[must_use]
    pub fn quote_args(&self) -> bool {
        self.quote_args.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os_specific() -> PipeTransport {
        serde_json::from_str(
            r#"{
                "pipeCwd": "${workspaceRoot}",
                "pipeProgram": "pipeProgram",
                "pipeArgs": [],
                "windows": { "pipeProgram": "Windows pipeProgram", "pipeArgs": "windows" },
                "osx": { "pipeProgram": "OSX pipeProgram", "pipeArgs": ["osx"] },
                "linux": { "pipeProgram": "Linux pipeProgram" }
            }"#,
        )
        .expect("valid transport")
    }

    #[test]
    fn test_args_deserialize_as_line_or_list() {
        let line: PipeArgs = serde_json::from_str(r#""-c""#).expect("line");
        assert_eq!(line, PipeArgs::Line("-c".to_string()));

        let list: PipeArgs = serde_json::from_str(r#"["-c", "docker"]"#).expect("list");
        assert_eq!(
            list,
            PipeArgs::List(vec!["-c".to_string(), "docker".to_string()])
        );
    }

    #[test]
    fn test_resolve_windows_override() {
        let resolved = os_specific().resolve_for_tag("win32");
        assert_eq!(resolved.program.as_deref(), Some("Windows pipeProgram"));
        assert_eq!(resolved.args, Some(PipeArgs::Line("windows".to_string())));
    }

    #[test]
    fn test_resolve_osx_override() {
        let resolved = os_specific().resolve_for_tag("darwin");
        assert_eq!(resolved.program.as_deref(), Some("OSX pipeProgram"));
        assert_eq!(resolved.args, Some(PipeArgs::List(vec!["osx".to_string()])));
    }

    #[test]
    fn test_resolve_linux_override_keeps_top_level_args() {
        let resolved = os_specific().resolve_for_os(Some(Platform::Linux));
        assert_eq!(resolved.program.as_deref(), Some("Linux pipeProgram"));
        assert_eq!(resolved.args, Some(PipeArgs::List(Vec::new())));
    }

    #[test]
    fn test_resolve_unknown_tag_uses_top_level() {
        let resolved = os_specific().resolve_for_tag("plan9");
        assert_eq!(resolved.program.as_deref(), Some("pipeProgram"));
        assert_eq!(resolved.args, Some(PipeArgs::List(Vec::new())));
    }

    #[test]
    fn test_explicit_empty_override_args_win() {
        let transport = PipeTransport {
            pipe_program: Some("ssh".to_string()),
            pipe_args: Some(PipeArgs::List(vec!["host".to_string()])),
            linux: Some(PipeTransportOverride {
                pipe_program: None,
                pipe_args: Some(PipeArgs::List(Vec::new())),
            }),
            ..PipeTransport::default()
        };

        let resolved = transport.resolve_for_os(Some(Platform::Linux));
        assert_eq!(resolved.program.as_deref(), Some("ssh"));
        assert_eq!(resolved.args, Some(PipeArgs::List(Vec::new())));
    }

    #[test]
    fn test_missing_override_section() {
        let transport = PipeTransport {
            pipe_program: Some("bash".to_string()),
            ..PipeTransport::default()
        };
        let resolved = transport.resolve_for_os(Some(Platform::Osx));
        assert_eq!(resolved.program.as_deref(), Some("bash"));
        assert_eq!(resolved.args, None);
    }

    #[test]
    fn test_quote_args_defaults_to_true() {
        assert!(PipeTransport::default().quote_args());
        let transport: PipeTransport =
            serde_json::from_str(r#"{ "quoteArgs": false }"#).expect("valid");
        assert!(!transport.quote_args());
    }
}
