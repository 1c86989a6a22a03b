//! Process listing for the attach picker.
//!
//! Lists processes either locally (`ps` / `tasklist`) or on the far side of
//! a pipe transport. Remote listings run the pipe command with a shell as
//! the debugger bootstrap command and feed it a small listing script on
//! stdin.

use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::Platform;
use crate::pipe::{PipeCommandBuilder, PipeTransport};

/// Timeout for local listing commands in milliseconds.
const LOCAL_TIMEOUT_MS: u64 = 5000;

/// Timeout for remote listing commands in milliseconds (longer for SSH overhead).
const REMOTE_TIMEOUT_MS: u64 = 30_000;

/// Poll interval for checking if process completed.
const POLL_INTERVAL_MS: u64 = 50;

/// Maximum number of processes to parse from a listing.
const MAX_PARSE_ITEMS: usize = 10_000;

/// Bootstrap command for remote listings; reads the script from stdin.
pub const SCRIPT_SHELL_CMD: &str = "sh -s";

/// Width of the `comm` column requested from `ps`.
///
/// macOS reports the full executable path there, which may contain spaces,
/// so the column is sliced by position rather than split on whitespace.
pub const COMM_COLUMN_WIDTH: usize = 256;

/// macOS flag set on processes running under Rosetta translation.
pub const P_TRANSLATED: u64 = 0x20000;

/// Process listing errors.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The listing command could not be started.
    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The listing command exited unsuccessfully.
    #[error("Command '{command}' failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    /// The listing command did not finish in time.
    #[error("Command '{command}' timed out after {timeout_ms} ms")]
    Timeout { command: String, timeout_ms: u64 },

    /// The pipe transport has no program for this platform.
    #[error("pipeTransport has no pipeProgram for this platform")]
    MissingPipeProgram,
}

/// A process that can be attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachItem {
    /// Process id.
    pub id: u32,
    /// Short process name.
    pub name: String,
    /// Full command line.
    pub command_line: String,
    /// Raw process flags (only meaningful on macOS).
    pub flags: u64,
}

impl AttachItem {
    /// Returns true if the process runs under Rosetta translation.
    #[must_use]
    pub fn is_translated(&self) -> bool {
        self.flags & P_TRANSLATED != 0
    }
}

/// Operating system reported by a remote listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOs {
    Linux,
    Darwin,
    Other(String),
}

impl RemoteOs {
    /// Parses `uname` output.
    #[must_use]
    pub fn parse(uname: &str) -> Self {
        match uname.trim() {
            "Linux" => Self::Linux,
            "Darwin" => Self::Darwin,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Source of attachable processes.
pub trait AttachItemsProvider {
    /// Lists the processes available for attaching.
    fn attach_items(&self) -> Result<Vec<AttachItem>, ProcessError>;
}

/// Chooses one process out of a listing.
pub trait ProcessPicker {
    /// Returns the chosen process, or `None` if nothing was chosen.
    fn pick(&mut self, items: &[AttachItem]) -> Option<AttachItem>;
}

/// Picks the first process whose name matches.
#[derive(Debug, Clone)]
pub struct NamePicker {
    name: String,
}

impl NamePicker {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ProcessPicker for NamePicker {
    fn pick(&mut self, items: &[AttachItem]) -> Option<AttachItem> {
        items.iter().find(|item| item.name == self.name).cloned()
    }
}

/// Returns the `-o` format passed to `ps`.
///
/// Only the `comm` column has a title; its length fixes the column width
/// and its position in the header line tells the parser where it starts.
#[must_use]
pub fn ps_format() -> String {
    format!("pid=,flags=,comm={},args=", "c".repeat(COMM_COLUMN_WIDTH))
}

/// Returns the script run on the remote side: OS name first, then the
/// process table.
#[must_use]
pub fn remote_listing_script() -> String {
    format!("uname\nps -axww -o {}\n", ps_format())
}

/// Splits `s` after `n` characters.
fn split_at_char(s: &str, n: usize) -> (&str, &str) {
    match s.char_indices().nth(n) {
        Some((idx, _)) => s.split_at(idx),
        None => (s, ""),
    }
}

/// Returns the last path component of an executable path.
fn process_name(comm: &str) -> String {
    comm.rsplit('/').next().unwrap_or(comm).to_string()
}

/// Location of the `comm` column, in characters.
#[derive(Debug, Clone, Copy)]
struct CommColumn {
    start: usize,
    width: usize,
}

impl CommColumn {
    /// Reads the column position from the header line.
    fn from_header(header: &str) -> Option<Self> {
        let title = header.trim();
        if title.is_empty() || title.contains(char::is_whitespace) {
            return None;
        }
        let start = header.chars().take_while(|c| c.is_whitespace()).count();
        Some(Self {
            start,
            width: title.chars().count(),
        })
    }

    /// Parses a single `pid flags comm args...` row.
    fn parse_row(self, line: &str) -> Option<AttachItem> {
        let (head, rest) = split_at_char(line, self.start);
        let (comm, args) = split_at_char(rest, self.width);
        let comm = comm.trim();
        if comm.is_empty() {
            return None;
        }

        let mut head = head.split_whitespace();
        let pid = head.next()?.parse().ok()?;
        let flags = u64::from_str_radix(head.next()?, 16).ok()?;

        let args = args.trim();
        Some(AttachItem {
            id: pid,
            name: process_name(comm),
            command_line: if args.is_empty() { comm } else { args }.to_string(),
            flags,
        })
    }
}

/// Parses `ps -o` output produced with [`ps_format`].
///
/// The first non-empty line is the header locating the `comm` column.
/// Flags are read as hexadecimal. Lines that don't parse are skipped.
#[must_use]
pub fn parse_ps_output(output: &str) -> Vec<AttachItem> {
    let mut lines = output.lines().skip_while(|line| line.trim().is_empty());
    let Some(column) = lines.next().and_then(CommColumn::from_header) else {
        tracing::warn!("ps output has no comm column header");
        return Vec::new();
    };

    lines
        .filter_map(|line| column.parse_row(line))
        .take(MAX_PARSE_ITEMS)
        .collect()
}

/// Parses the output of [`remote_listing_script`].
#[must_use]
pub fn parse_remote_listing(output: &str) -> (RemoteOs, Vec<AttachItem>) {
    let (uname, table) = output.split_once('\n').unwrap_or((output, ""));
    (RemoteOs::parse(uname), parse_ps_output(table))
}

/// Parses `tasklist /fo csv /nh` output.
#[must_use]
pub fn parse_tasklist_csv(output: &str) -> Vec<AttachItem> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim().strip_prefix('"')?.strip_suffix('"')?;
            let mut fields = line.split("\",\"");
            let name = fields.next()?.to_string();
            let id = fields.next()?.parse().ok()?;
            Some(AttachItem {
                id,
                command_line: name.clone(),
                name,
                flags: 0,
            })
        })
        .take(MAX_PARSE_ITEMS)
        .collect()
}

/// Collects everything from a pipe on a background thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf).ok();
        }
        buf
    })
}

/// Waits for a child with a timeout, killing it if it runs too long.
fn wait_with_timeout(
    child: &mut Child,
    command: &str,
    timeout_ms: u64,
) -> Result<ExitStatus, ProcessError> {
    let start = Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ProcessError::Timeout {
                command: command.to_string(),
                timeout_ms,
            });
        }
        thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
    }
}

/// Runs a command, optionally feeding stdin, and returns its stdout.
fn run_command(
    cmd: &mut Command,
    display: &str,
    stdin: Option<&str>,
    timeout_ms: u64,
) -> Result<String, ProcessError> {
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
        command: display.to_string(),
        source,
    })?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    if let (Some(script), Some(mut pipe)) = (stdin, child.stdin.take()) {
        // A program that exits without reading closes the pipe early; its
        // exit status and stderr say why.
        if let Err(err) = pipe.write_all(script.as_bytes()) {
            if err.kind() != io::ErrorKind::BrokenPipe {
                let _ = child.kill();
                let _ = child.wait();
                return Err(err.into());
            }
            let command = display;
            tracing::debug!("'{}' closed stdin early", command);
        }
    }

    let status = wait_with_timeout(&mut child, display, timeout_ms)?;

    let stdout = stdout.join().unwrap_or_default();
    let stderr = stderr.join().unwrap_or_default();

    if !status.success() {
        return Err(ProcessError::CommandFailed {
            command: display.to_string(),
            status,
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&stdout).into_owned())
}

/// Wraps a command line so the host shell interprets it.
fn shell_command(command_line: &str) -> Command {
    if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", command_line]);
        c
    } else {
        let mut c = Command::new("sh");
        c.args(["-c", command_line]);
        c
    }
}

/// Lists processes on this machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalAttachItemsProvider;

impl AttachItemsProvider for LocalAttachItemsProvider {
    fn attach_items(&self) -> Result<Vec<AttachItem>, ProcessError> {
        if cfg!(target_os = "windows") {
            let mut cmd = Command::new("tasklist");
            cmd.args(["/fo", "csv", "/nh"]);
            let output = run_command(&mut cmd, "tasklist", None, LOCAL_TIMEOUT_MS)?;
            Ok(parse_tasklist_csv(&output))
        } else {
            let mut cmd = Command::new("ps");
            cmd.args(["-axww".to_string(), "-o".to_string(), ps_format()]);
            let output = run_command(&mut cmd, "ps", None, LOCAL_TIMEOUT_MS)?;
            Ok(parse_ps_output(&output))
        }
    }
}

/// Lists processes on the far side of a pipe transport.
#[derive(Debug, Clone)]
pub struct RemoteAttachItemsProvider {
    transport: PipeTransport,
    platform: Option<Platform>,
    builder: PipeCommandBuilder,
}

impl RemoteAttachItemsProvider {
    /// Creates a provider for a transport resolved for `platform`.
    #[must_use]
    pub fn new(transport: PipeTransport, platform: Option<Platform>) -> Self {
        Self {
            transport,
            platform,
            builder: PipeCommandBuilder::new(SCRIPT_SHELL_CMD),
        }
    }

    /// Returns the command line used to reach the remote shell.
    #[must_use]
    pub fn pipe_command(&self) -> Option<String> {
        self.builder.build_for(&self.transport, self.platform)
    }

    /// Lists remote processes together with the remote OS.
    pub fn list(&self) -> Result<(RemoteOs, Vec<AttachItem>), ProcessError> {
        let pipe_cmd = self.pipe_command().ok_or(ProcessError::MissingPipeProgram)?;
        tracing::info!("Listing remote processes via: {}", pipe_cmd);

        let mut cmd = shell_command(&pipe_cmd);
        if let Some(cwd) = &self.transport.pipe_cwd {
            cmd.current_dir(cwd);
        }
        cmd.envs(&self.transport.pipe_env);

        let script = remote_listing_script();
        let output = run_command(&mut cmd, &pipe_cmd, Some(&script), REMOTE_TIMEOUT_MS)?;
        let (os, items) = parse_remote_listing(&output);
        tracing::info!("Remote OS {:?}, {} processes", os, items.len());
        Ok((os, items))
    }
}

impl AttachItemsProvider for RemoteAttachItemsProvider {
    fn attach_items(&self) -> Result<Vec<AttachItem>, ProcessError> {
        self.list().map(|(_, items)| items)
    }
}
