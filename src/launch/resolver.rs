//! Debug configuration resolution.

use super::{LaunchConfiguration, LaunchError};
use crate::config::Platform;
use crate::process::{
    AttachItemsProvider, LocalAttachItemsProvider, ProcessPicker, RemoteAttachItemsProvider,
};

/// Facts about the machine the debugger is started from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostInfo {
    /// Host operating system.
    pub platform: Option<Platform>,
    /// CPU architecture as reported by Rust (`x86_64`, `aarch64`, ...).
    pub arch: String,
    /// The UI runs on a different machine than the debugger.
    pub is_remote: bool,
    /// The UI is a web client.
    pub is_web: bool,
}

impl HostInfo {
    /// Describes the current machine as a local, non-web host.
    #[must_use]
    pub fn current() -> Self {
        Self {
            platform: Platform::current(),
            arch: std::env::consts::ARCH.to_string(),
            is_remote: false,
            is_web: false,
        }
    }

    /// Returns true on arm64 macOS.
    #[must_use]
    pub fn is_apple_silicon(&self) -> bool {
        self.platform == Some(Platform::Osx) && matches!(self.arch.as_str(), "aarch64" | "arm64")
    }
}

/// A configuration ready to be handed to the debugger.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfiguration {
    pub configuration: LaunchConfiguration,
    /// Whether the caller should verify the HTTPS development certificate.
    pub check_dev_cert: bool,
}

/// Resolves launch configurations for a host.
#[derive(Debug, Clone)]
pub struct DebugConfigurationResolver {
    host: HostInfo,
}

impl DebugConfigurationResolver {
    #[must_use]
    pub fn new(host: HostInfo) -> Self {
        Self { host }
    }

    #[must_use]
    pub fn host(&self) -> &HostInfo {
        &self.host
    }

    /// Returns the process source for a configuration: the remote side of
    /// its pipe transport if it has one, this machine otherwise.
    #[must_use]
    pub fn attach_items_provider(
        &self,
        config: &LaunchConfiguration,
    ) -> Box<dyn AttachItemsProvider> {
        match &config.pipe_transport {
            Some(transport) => Box::new(RemoteAttachItemsProvider::new(
                transport.clone(),
                self.host.platform,
            )),
            None => Box::new(LocalAttachItemsProvider),
        }
    }

    /// Resolves a configuration, listing processes with the default provider.
    pub fn resolve(
        &self,
        config: LaunchConfiguration,
        picker: &mut dyn ProcessPicker,
    ) -> Result<ResolvedConfiguration, LaunchError> {
        let provider = self.attach_items_provider(&config);
        self.resolve_with(config, provider.as_ref(), picker)
    }

    /// Resolves a configuration using the given process source and picker.
    pub fn resolve_with(
        &self,
        mut config: LaunchConfiguration,
        provider: &dyn AttachItemsProvider,
        picker: &mut dyn ProcessPicker,
    ) -> Result<ResolvedConfiguration, LaunchError> {
        if config.needs_process_selection() {
            let items = provider.attach_items()?;
            tracing::debug!("{} attachable process(es) for '{}'", items.len(), config.name);

            let item = picker.pick(&items).ok_or(LaunchError::NoProcessSelected)?;
            tracing::info!("Attaching '{}' to {} ({})", config.name, item.name, item.id);
            config.apply_selected_process(&item, &self.host);
        }

        let check_dev_cert = self.apply_dev_cert_policy(&mut config);
        Ok(ResolvedConfiguration {
            configuration: config,
            check_dev_cert,
        })
    }

    /// Returns true if a dev certificate check can be offered at all.
    ///
    /// Linux has no single root store, a remote or web UI can't trust the
    /// certificate on the client, and a pipe transport runs the app on a
    /// different machine.
    #[must_use]
    pub fn dev_cert_check_supported(&self, config: &LaunchConfiguration) -> bool {
        self.host.platform != Some(Platform::Linux)
            && !self.host.is_remote
            && !self.host.is_web
            && config.pipe_transport.is_none()
    }

    /// Defaults `checkForDevCert` for web apps and reports whether to check.
    fn apply_dev_cert_policy(&self, config: &mut LaunchConfiguration) -> bool {
        if !self.dev_cert_check_supported(config) {
            return false;
        }

        if config.check_for_dev_cert.is_none() && config.server_ready_action.is_some() {
            config.check_for_dev_cert = Some(true);
        }

        config.check_for_dev_cert == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::Request;
    use crate::pipe::PipeTransport;
    use crate::process::{AttachItem, NamePicker, ProcessError};
    use serde_json::json;

    struct FixedProvider(Vec<AttachItem>);

    impl AttachItemsProvider for FixedProvider {
        fn attach_items(&self) -> Result<Vec<AttachItem>, ProcessError> {
            Ok(self.0.clone())
        }
    }

    struct FailingProvider;

    impl AttachItemsProvider for FailingProvider {
        fn attach_items(&self) -> Result<Vec<AttachItem>, ProcessError> {
            Err(ProcessError::MissingPipeProgram)
        }
    }

    fn windows_host() -> HostInfo {
        HostInfo {
            platform: Some(Platform::Windows),
            arch: "x86_64".to_string(),
            is_remote: false,
            is_web: false,
        }
    }

    fn processes() -> FixedProvider {
        FixedProvider(vec![AttachItem {
            id: 77,
            name: "dotnet".to_string(),
            command_line: "dotnet web.dll".to_string(),
            flags: 0,
        }])
    }

    fn attach() -> LaunchConfiguration {
        LaunchConfiguration {
            name: "Attach".to_string(),
            kind: "coreclr".to_string(),
            request: Request::Attach,
            ..LaunchConfiguration::default()
        }
    }

    #[test]
    fn test_resolve_picks_process() {
        let resolver = DebugConfigurationResolver::new(windows_host());
        let resolved = resolver
            .resolve_with(attach(), &processes(), &mut NamePicker::new("dotnet"))
            .expect("resolved");
        assert_eq!(resolved.configuration.process_id, Some(json!("77")));
        assert!(!resolved.check_dev_cert);
    }

    #[test]
    fn test_resolve_without_selection_fails() {
        let resolver = DebugConfigurationResolver::new(windows_host());
        let result = resolver.resolve_with(attach(), &processes(), &mut NamePicker::new("node"));
        assert!(matches!(result, Err(LaunchError::NoProcessSelected)));
    }

    #[test]
    fn test_resolve_propagates_listing_errors() {
        let resolver = DebugConfigurationResolver::new(windows_host());
        let result = resolver.resolve_with(attach(), &FailingProvider, &mut NamePicker::new("x"));
        assert!(matches!(result, Err(LaunchError::Process(_))));
    }

    #[test]
    fn test_resolve_skips_listing_when_process_known() {
        let mut config = attach();
        config.process_id = Some(json!(5));
        let resolver = DebugConfigurationResolver::new(windows_host());
        let resolved = resolver
            .resolve_with(config, &FailingProvider, &mut NamePicker::new("x"))
            .expect("resolved");
        assert_eq!(resolved.configuration.process_id, Some(json!(5)));
    }

    #[test]
    fn test_server_ready_action_enables_dev_cert_check() {
        let config = LaunchConfiguration {
            server_ready_action: Some(json!({ "action": "openExternally" })),
            ..LaunchConfiguration::default()
        };
        let resolver = DebugConfigurationResolver::new(windows_host());
        let resolved = resolver
            .resolve_with(config, &processes(), &mut NamePicker::new("x"))
            .expect("resolved");
        assert!(resolved.check_dev_cert);
        assert_eq!(resolved.configuration.check_for_dev_cert, Some(true));
    }

    #[test]
    fn test_explicit_opt_out_is_respected() {
        let config = LaunchConfiguration {
            server_ready_action: Some(json!({ "action": "openExternally" })),
            check_for_dev_cert: Some(false),
            ..LaunchConfiguration::default()
        };
        let resolver = DebugConfigurationResolver::new(windows_host());
        let resolved = resolver
            .resolve_with(config, &processes(), &mut NamePicker::new("x"))
            .expect("resolved");
        assert!(!resolved.check_dev_cert);
    }

    #[test]
    fn test_dev_cert_not_supported() {
        let config = LaunchConfiguration {
            check_for_dev_cert: Some(true),
            ..LaunchConfiguration::default()
        };

        let linux = DebugConfigurationResolver::new(HostInfo {
            platform: Some(Platform::Linux),
            ..windows_host()
        });
        assert!(!linux.dev_cert_check_supported(&config));

        let web = DebugConfigurationResolver::new(HostInfo {
            is_web: true,
            ..windows_host()
        });
        assert!(!web.dev_cert_check_supported(&config));

        let piped = LaunchConfiguration {
            pipe_transport: Some(PipeTransport::default()),
            ..config.clone()
        };
        let windows = DebugConfigurationResolver::new(windows_host());
        assert!(windows.dev_cert_check_supported(&config));
        assert!(!windows.dev_cert_check_supported(&piped));

        let resolved = linux
            .resolve_with(config, &processes(), &mut NamePicker::new("x"))
            .expect("resolved");
        assert!(!resolved.check_dev_cert);
    }

    #[test]
    fn test_apple_silicon_detection() {
        let host = HostInfo {
            platform: Some(Platform::Osx),
            arch: "aarch64".to_string(),
            ..HostInfo::default()
        };
        assert!(host.is_apple_silicon());
        assert!(!windows_host().is_apple_silicon());
    }
}
