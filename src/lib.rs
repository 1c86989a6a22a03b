//! pipeattach
//!
//! Builds the command lines used to attach a debugger through a pipe
//! transport (SSH, WSL, `docker exec`, ...) described in a launch.json
//! debug configuration.
//!
//! # Architecture
//!
//! - **Pipe Module**: Transport descriptors, per-OS overrides and pipe command construction
//! - **Launch Module**: launch.json parsing and attach request resolution
//! - **Process Module**: Local and remote process listing for the attach picker
//! - **Dev Certs Module**: `dotnet dev-certs https` wrapper
//!
//! # Usage
//!
//! ```
//! use pipeattach::config::Platform;
//! use pipeattach::pipe::{PipeArgs, PipeCommandBuilder, PipeTransport};
//!
//! let transport = PipeTransport {
//!     pipe_program: Some("ssh".to_string()),
//!     pipe_args: Some(PipeArgs::List(vec!["user@host".to_string()])),
//!     ..PipeTransport::default()
//! };
//! let cmd = PipeCommandBuilder::new("/vsdbg/vsdbg").build_for(&transport, Some(Platform::Linux));
//! assert_eq!(cmd.as_deref(), Some("ssh user@host /vsdbg/vsdbg"));
//! ```

// Clippy configuration - allow common patterns
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

pub mod config;
pub mod devcerts;
pub mod launch;
pub mod logging;
pub mod pipe;
pub mod process;

// Re-export main types
pub use config::{Config, Platform};
pub use devcerts::DevCerts;
pub use launch::{DebugConfigurationResolver, LaunchConfiguration, LaunchError, LaunchFile};
pub use pipe::{PipeArgs, PipeCommandBuilder, PipeTransport};
pub use process::{AttachItem, ProcessError};
