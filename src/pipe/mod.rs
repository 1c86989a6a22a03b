//! Pipe transport module.
//!
//! Provides functionality for:
//! - Reading `pipeTransport` descriptors from launch configurations
//! - Resolving the per-OS `windows` / `osx` / `linux` overrides
//! - Building the command line that starts the remote shell with the
//!   debugger bootstrap command embedded

pub mod command;
pub mod transport;

pub use command::{
    DEBUGGER_COMMAND_PLACEHOLDER, DEFAULT_DEBUGGER_COMMAND, PipeCommandBuilder, create_pipe_cmd,
    create_pipe_cmd_from_array, create_pipe_cmd_from_string, quote_arg,
};
pub use transport::{PipeArgs, PipeTransport, PipeTransportOverride, ResolvedPipe};
