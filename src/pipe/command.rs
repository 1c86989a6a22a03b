//! Pipe command construction.
//!
//! Turns a resolved pipe transport into the command line that starts the
//! remote shell and runs the debugger bootstrap command inside it.

use tracing::debug;

use super::transport::{PipeArgs, PipeTransport, ResolvedPipe};
use crate::config::Platform;

/// Placeholder replaced by the debugger bootstrap command.
pub const DEBUGGER_COMMAND_PLACEHOLDER: &str = "${debuggerCommand}";

/// Bootstrap command used when none is configured.
///
/// Starts a shell on the remote side that reads its script from stdin.
pub const DEFAULT_DEBUGGER_COMMAND: &str = "sh -s";

/// Returns true if the argument is wrapped start-to-end in double quotes.
fn is_quoted(arg: &str) -> bool {
    arg.len() >= 2 && arg.starts_with('"') && arg.ends_with('"')
}

/// Wraps an argument in double quotes if it contains whitespace.
///
/// Embedded quotes are not escaped. Arguments that are already quoted, or
/// any argument when `quote` is false, are returned unchanged.
#[must_use]
pub fn quote_arg(arg: &str, quote: bool) -> String {
    if !quote || !arg.chars().any(char::is_whitespace) || is_quoted(arg) {
        return arg.to_string();
    }
    format!("\"{}\"", arg)
}

/// Builds a pipe command from a single argument string.
///
/// The string is treated as an opaque shell fragment. Every placeholder is
/// replaced with `debugger_command`; without a placeholder the command is
/// appended. With `quote` the whole fragment is wrapped in one pair of
/// double quotes.
#[must_use]
pub fn create_pipe_cmd_from_string(
    program: &str,
    args: &str,
    quote: bool,
    debugger_command: &str,
) -> String {
    let fragment = if args.contains(DEBUGGER_COMMAND_PLACEHOLDER) {
        args.replace(DEBUGGER_COMMAND_PLACEHOLDER, debugger_command)
    } else {
        format!("{} {}", args, debugger_command)
    };

    if quote {
        format!("{} \"{}\"", program, fragment)
    } else {
        format!("{} {}", program, fragment)
    }
}

/// Builds a pipe command from a tokenized argument list.
///
/// Each token is quoted on its own. A token equal to the placeholder is
/// replaced with `debugger_command`, which is never quoted; without such a
/// token the command is appended as the last token.
#[must_use]
pub fn create_pipe_cmd_from_array(
    program: &str,
    args: &[String],
    quote: bool,
    debugger_command: &str,
) -> String {
    let has_placeholder = args.iter().any(|arg| arg == DEBUGGER_COMMAND_PLACEHOLDER);

    let mut tokens: Vec<String> = args
        .iter()
        .map(|arg| {
            if arg == DEBUGGER_COMMAND_PLACEHOLDER {
                debugger_command.to_string()
            } else {
                quote_arg(arg, quote)
            }
        })
        .collect();

    if !has_placeholder {
        tokens.push(debugger_command.to_string());
    }

    format!("{} {}", program, tokens.join(" "))
}

/// Builds a pipe command from either argument form.
#[must_use]
pub fn create_pipe_cmd(
    program: &str,
    args: &PipeArgs,
    quote: bool,
    debugger_command: &str,
) -> String {
    match args {
        PipeArgs::Line(line) => create_pipe_cmd_from_string(program, line, quote, debugger_command),
        PipeArgs::List(list) => create_pipe_cmd_from_array(program, list, quote, debugger_command),
    }
}

/// Pipe command builder bound to a debugger bootstrap command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeCommandBuilder {
    debugger_command: String,
    quote_args: bool,
}

impl Default for PipeCommandBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_DEBUGGER_COMMAND)
    }
}

impl PipeCommandBuilder {
    /// Creates a builder that substitutes `debugger_command`.
    #[must_use]
    pub fn new(debugger_command: impl Into<String>) -> Self {
        Self {
            debugger_command: debugger_command.into(),
            quote_args: true,
        }
    }

    /// Sets the quoting flag used by [`Self::build`].
    #[must_use]
    pub fn with_quote_args(mut self, quote_args: bool) -> Self {
        self.quote_args = quote_args;
        self
    }

    /// Returns the bootstrap command text.
    #[must_use]
    pub fn debugger_command(&self) -> &str {
        &self.debugger_command
    }

    /// Returns the quoting flag.
    #[must_use]
    pub fn quote_args(&self) -> bool {
        self.quote_args
    }

    /// Builds the command line for resolved program and arguments.
    ///
    /// Returns `None` when no program is configured. Missing arguments
    /// behave like an empty list.
    #[must_use]
    pub fn build(&self, resolved: &ResolvedPipe) -> Option<String> {
        let program = resolved.program.as_deref()?;
        let args = resolved.args.clone().unwrap_or_default();
        let cmd = create_pipe_cmd(program, &args, self.quote_args, &self.debugger_command);
        debug!("Built pipe command: {}", cmd);
        Some(cmd)
    }

    /// Resolves a transport for a platform and builds its command line.
    ///
    /// The transport's own `quoteArgs` setting is applied on top of the
    /// builder's flag: quoting happens only when both allow it.
    #[must_use]
    pub fn build_for(&self, transport: &PipeTransport, platform: Option<Platform>) -> Option<String> {
        let resolved = transport.resolve_for_os(platform);
        debug!(
            "Resolved pipe transport for {}: {:?}",
            platform.map_or("<none>", |p| p.config_key()),
            resolved
        );
        self.clone()
            .with_quote_args(self.quote_args && transport.quote_args())
            .build(&resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: &str = "C:\\System32\\bash.exe";

    fn list(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| (*a).to_string()).collect()
    }

    #[test]
    fn test_quote_arg() {
        assert_eq!(quote_arg("program.exe", true), "program.exe");
        assert_eq!(quote_arg("s p a c e", true), "\"s p a c e\"");
        assert_eq!(quote_arg("s p a c e", false), "s p a c e");
        assert_eq!(quote_arg("\"already quoted\"", true), "\"already quoted\"");
        assert_eq!(quote_arg("tab\there", true), "\"tab\there\"");
    }

    #[test]
    fn test_quote_arg_lone_quote_is_not_wrapped() {
        assert_eq!(quote_arg("\" x", true), "\"\" x\"");
        assert_eq!(quote_arg("", true), "");
    }

    #[test]
    fn test_string_args_appends_and_quotes_fragment() {
        let cmd = create_pipe_cmd_from_string(PROGRAM, "-c", true, "B");
        assert_eq!(cmd, format!("{} \"-c B\"", PROGRAM));
    }

    #[test]
    fn test_string_args_replaces_placeholder() {
        let cmd = create_pipe_cmd_from_string(
            PROGRAM,
            "-c ${debuggerCommand} -- ignored",
            false,
            "sh -s",
        );
        assert_eq!(cmd, format!("{} -c sh -s -- ignored", PROGRAM));
    }

    #[test]
    fn test_string_args_replaces_every_placeholder() {
        let cmd = create_pipe_cmd_from_string("p", "${debuggerCommand};${debuggerCommand}", false, "x");
        assert_eq!(cmd, "p x;x");
    }

    #[test]
    fn test_array_args_appends_command() {
        let cmd = create_pipe_cmd_from_array(PROGRAM, &list(&["-c"]), true, "B");
        assert_eq!(cmd, format!("{} -c B", PROGRAM));
    }

    #[test]
    fn test_array_args_does_not_quote_debugger_command() {
        let cmd = create_pipe_cmd_from_array(
            PROGRAM,
            &list(&["-c", "${debuggerCommand}", "--", "ignored"]),
            true,
            "sh -s",
        );
        assert_eq!(cmd, format!("{} -c sh -s -- ignored", PROGRAM));
    }

    #[test]
    fn test_array_args_quotes_tokens_with_spaces() {
        let cmd = create_pipe_cmd_from_array("ssh", &list(&["-i", "my key.pem", "host"]), true, "B");
        assert_eq!(cmd, "ssh -i \"my key.pem\" host B");
    }

    #[test]
    fn test_builder_without_program() {
        let builder = PipeCommandBuilder::default();
        assert_eq!(builder.build(&ResolvedPipe::default()), None);
    }

    #[test]
    fn test_builder_missing_args_behaves_like_empty_list() {
        let builder = PipeCommandBuilder::new("B");
        let resolved = ResolvedPipe {
            program: Some("bash".to_string()),
            args: None,
        };
        assert_eq!(builder.build(&resolved).as_deref(), Some("bash B"));
    }

    #[test]
    fn test_build_for_respects_transport_quote_args() {
        let transport = PipeTransport {
            pipe_program: Some("bash".to_string()),
            pipe_args: Some(PipeArgs::Line("-c".to_string())),
            quote_args: Some(false),
            ..PipeTransport::default()
        };
        let builder = PipeCommandBuilder::new("B");
        assert_eq!(
            builder.build_for(&transport, Some(Platform::Linux)).as_deref(),
            Some("bash -c B")
        );
    }
}
