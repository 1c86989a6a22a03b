//! Platform detection utilities.
//!
//! Maps operating system tags onto the override sections of a pipe
//! transport.

/// Operating systems that can carry a pipe transport override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Windows (`windows` section)
    Windows,
    /// macOS (`osx` section)
    Osx,
    /// Linux (`linux` section)
    Linux,
}

impl Platform {
    /// Parses an OS tag.
    ///
    /// Accepts both launch.json keys (`windows`, `osx`, `linux`) and the
    /// names runtimes report (`win32`, `darwin`, `macos`). Unknown tags
    /// have no override section and return `None`.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_lowercase().as_str() {
            "windows" | "win32" => Some(Self::Windows),
            "osx" | "darwin" | "macos" => Some(Self::Osx),
            "linux" => Some(Self::Linux),
            _ => None,
        }
    }

    /// Returns the platform this binary was built for.
    #[must_use]
    pub fn current() -> Option<Self> {
        Self::from_tag(std::env::consts::OS)
    }

    /// Returns the launch.json key of this platform's override section.
    #[must_use]
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Osx => "osx",
            Self::Linux => "linux",
        }
    }

    /// Returns the executable file extension.
    #[must_use]
    pub fn exe_extension(&self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::Osx | Self::Linux => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag() {
        assert_eq!(Platform::from_tag("windows"), Some(Platform::Windows));
        assert_eq!(Platform::from_tag("win32"), Some(Platform::Windows));
        assert_eq!(Platform::from_tag("darwin"), Some(Platform::Osx));
        assert_eq!(Platform::from_tag("OSX"), Some(Platform::Osx));
        assert_eq!(Platform::from_tag("linux"), Some(Platform::Linux));
        assert_eq!(Platform::from_tag("freebsd"), None);
        assert_eq!(Platform::from_tag(""), None);
    }

    #[test]
    fn test_config_key_round_trips() {
        for platform in [Platform::Windows, Platform::Osx, Platform::Linux] {
            assert_eq!(Platform::from_tag(platform.config_key()), Some(platform));
        }
    }

    #[test]
    fn test_exe_extension() {
        assert_eq!(Platform::Windows.exe_extension(), ".exe");
        assert_eq!(Platform::Linux.exe_extension(), "");
    }
}
