// src/platform.rs

//! Target settings and the platform validator
//!
//! Settings describe the machine the package is built *for*: operating
//! system, architecture and build type. The validator is a pure predicate
//! over them and runs before anything touches the network or the disk.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Linux,
    Windows,
    Macos,
    FreeBsd,
    Android,
}

impl Platform {
    /// Platform of the running host, if it is one we know
    pub fn host() -> Option<Self> {
        std::env::consts::OS.parse().ok()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Linux => "Linux",
            Self::Windows => "Windows",
            Self::Macos => "Macos",
            Self::FreeBsd => "FreeBSD",
            Self::Android => "Android",
        }
    }

    /// Whether position-independent code is a meaningful choice here
    pub fn is_posix(&self) -> bool {
        !matches!(self, Self::Windows)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Platform {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "windows" => Ok(Self::Windows),
            "macos" | "darwin" => Ok(Self::Macos),
            "freebsd" => Ok(Self::FreeBsd),
            "android" => Ok(Self::Android),
            _ => Err(ConfigurationError::UnknownPlatform(s.to_string())),
        }
    }
}

/// Target architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arch {
    X86_64,
    X86,
    Aarch64,
    Armv7,
    Riscv64,
    Ppc64le,
    S390x,
}

impl Arch {
    pub fn host() -> Option<Self> {
        std::env::consts::ARCH.parse().ok()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::X86 => "x86",
            Self::Aarch64 => "armv8",
            Self::Armv7 => "armv7",
            Self::Riscv64 => "riscv64",
            Self::Ppc64le => "ppc64le",
            Self::S390x => "s390x",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Arch {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Ok(Self::X86_64),
            "x86" | "i686" | "i386" => Ok(Self::X86),
            "aarch64" | "arm64" | "armv8" => Ok(Self::Aarch64),
            "armv7" | "arm" | "armv7hf" => Ok(Self::Armv7),
            "riscv64" => Ok(Self::Riscv64),
            "ppc64le" | "powerpc64le" => Ok(Self::Ppc64le),
            "s390x" => Ok(Self::S390x),
            _ => Err(ConfigurationError::UnknownArch(s.to_string())),
        }
    }
}

/// Optimisation profile passed to the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BuildType {
    #[default]
    Release,
    Debug,
    RelWithDebInfo,
    MinSizeRel,
}

impl BuildType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Release => "Release",
            Self::Debug => "Debug",
            Self::RelWithDebInfo => "RelWithDebInfo",
            Self::MinSizeRel => "MinSizeRel",
        }
    }

    /// Compiler flags contributed by this build type
    pub fn cflags(&self) -> &'static [&'static str] {
        match self {
            Self::Release => &["-O3"],
            Self::Debug => &["-g"],
            Self::RelWithDebInfo => &["-O2", "-g"],
            Self::MinSizeRel => &["-Os"],
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for BuildType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "release" => Ok(Self::Release),
            "debug" => Ok(Self::Debug),
            "relwithdebinfo" => Ok(Self::RelWithDebInfo),
            "minsizerel" => Ok(Self::MinSizeRel),
            _ => Err(ConfigurationError::UnknownBuildType(s.to_string())),
        }
    }
}

/// Settings of one build invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Settings {
    pub os: Platform,
    pub arch: Arch,
    pub build_type: BuildType,
}

impl Settings {
    /// Settings describing the running host
    ///
    /// Unknown hosts fall back to Linux/x86_64 so that the validator, not
    /// this constructor, is what reports the mismatch.
    pub fn host() -> Self {
        Self {
            os: Platform::host().unwrap_or(Platform::Linux),
            arch: Arch::host().unwrap_or(Arch::X86_64),
            build_type: BuildType::default(),
        }
    }

    /// Whether these settings target a machine other than `build`
    pub fn is_cross_from(&self, build: &Settings) -> bool {
        self.os != build.os || self.arch != build.arch
    }
}

/// Reject any target other than `supported`
///
/// Pure: performs no I/O, so it is safe to run before acquisition.
pub fn validate(
    package: &str,
    supported: Platform,
    target: Platform,
) -> Result<(), ConfigurationError> {
    if target == supported {
        Ok(())
    } else {
        Err(ConfigurationError::UnsupportedPlatform {
            package: package.to_string(),
            supported: supported.to_string(),
            requested: target.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Platform; 5] = [
        Platform::Linux,
        Platform::Windows,
        Platform::Macos,
        Platform::FreeBsd,
        Platform::Android,
    ];

    #[test]
    fn test_validate_accepts_only_supported() {
        for platform in ALL {
            let result = validate("liburing", Platform::Linux, platform);
            if platform == Platform::Linux {
                assert!(result.is_ok());
            } else {
                let err = result.unwrap_err();
                assert!(err.to_string().contains("supported only on Linux"));
            }
        }
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!("linux".parse::<Platform>().unwrap(), Platform::Linux);
        assert_eq!("Windows".parse::<Platform>().unwrap(), Platform::Windows);
        assert_eq!("darwin".parse::<Platform>().unwrap(), Platform::Macos);
        assert!("plan9".parse::<Platform>().is_err());
    }

    #[test]
    fn test_only_windows_is_non_posix() {
        for platform in ALL {
            assert_eq!(platform.is_posix(), platform != Platform::Windows);
        }
    }

    #[test]
    fn test_arch_aliases() {
        assert_eq!("amd64".parse::<Arch>().unwrap(), Arch::X86_64);
        assert_eq!("aarch64".parse::<Arch>().unwrap(), Arch::Aarch64);
        assert_eq!(Arch::Aarch64.to_string(), "armv8");
    }

    #[test]
    fn test_build_type_flags() {
        assert_eq!(BuildType::default(), BuildType::Release);
        assert_eq!(BuildType::Debug.cflags(), &["-g"]);
        assert_eq!("relwithdebinfo".parse::<BuildType>().unwrap(), BuildType::RelWithDebInfo);
    }

    #[test]
    fn test_cross_detection() {
        let host = Settings {
            os: Platform::Linux,
            arch: Arch::X86_64,
            build_type: BuildType::Release,
        };
        let same = Settings {
            build_type: BuildType::Debug,
            ..host
        };
        let arm = Settings {
            arch: Arch::Aarch64,
            ..host
        };
        assert!(!same.is_cross_from(&host));
        assert!(arm.is_cross_from(&host));
    }
}
