//! HTTPS development certificate helpers.
//!
//! Wraps `dotnet dev-certs https`, which checks for (and optionally
//! creates) a trusted self-signed certificate for local web debugging.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::Platform;

/// Finds the first `dotnet` executable inside the given directories.
#[must_use]
pub fn find_dotnet_executable(cli_paths: &[PathBuf], platform: Option<Platform>) -> Option<PathBuf> {
    let exe_name = format!(
        "dotnet{}",
        platform.map_or("", |p| p.exe_extension())
    );

    cli_paths
        .iter()
        .map(|dir| dir.join(&exe_name))
        .find(|path| path.is_file())
}

/// Runs `dotnet dev-certs https` subcommands.
#[derive(Debug, Clone)]
pub struct DevCerts {
    dotnet: PathBuf,
}

impl DevCerts {
    /// Creates a helper using the first `dotnet` found in `cli_paths`,
    /// falling back to `dotnet` on `PATH`.
    #[must_use]
    pub fn new(cli_paths: &[PathBuf], platform: Option<Platform>) -> Self {
        let dotnet =
            find_dotnet_executable(cli_paths, platform).unwrap_or_else(|| PathBuf::from("dotnet"));
        Self { dotnet }
    }

    /// Returns the `dotnet` executable in use.
    #[must_use]
    pub fn dotnet(&self) -> &Path {
        &self.dotnet
    }

    /// Returns true if a development certificate is installed.
    #[must_use]
    pub fn has_dev_certs_https(&self) -> bool {
        self.run("--check")
    }

    /// Creates and trusts a self-signed development certificate.
    ///
    /// Returns true on success.
    #[must_use]
    pub fn create_self_signed_cert(&self) -> bool {
        self.run("--trust")
    }

    fn run(&self, flag: &str) -> bool {
        let result = Command::new(&self.dotnet)
            .args(["dev-certs", "https", flag])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match result {
            Ok(status) => {
                tracing::info!(
                    "{} dev-certs https {} exited with {}",
                    self.dotnet.display(),
                    flag,
                    status
                );
                status.success()
            }
            Err(e) => {
                tracing::warn!("Failed to run {}: {}", self.dotnet.display(), e);
                false
            }
        }
    }
}
