// src/recipe/options.rs

//! Build options and the build environment derived from them
//!
//! Option availability is decided once per invocation by
//! [`OptionCapabilities::evaluate`]: `fPIC` only exists on POSIX targets and
//! `with_libc` only exists from the version that introduced it. The result
//! is an explicit [`OptionSet`] whose absent options are `None`, never a
//! bag of keys that later code deletes from.

use crate::error::ConfigurationError;
use crate::platform::{BuildType, Platform};
use crate::recipe::format::OptionsSection;
use crate::version::PackageVersion;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Option names as users type them
pub const OPT_FPIC: &str = "fPIC";
pub const OPT_SHARED: &str = "shared";
pub const OPT_WITH_LIBC: &str = "with_libc";

/// C dialect every build compiles with, whatever the recipe says
pub const C_DIALECT: &str = "-std=gnu99";

/// Raw `NAME=VALUE` assignments supplied by the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionRequest {
    values: BTreeMap<String, bool>,
}

impl OptionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one option by canonical name
    pub fn set(mut self, name: &str, value: bool) -> Result<Self, ConfigurationError> {
        let name = canonical_name(name)?;
        self.values.insert(name.to_string(), value);
        Ok(self)
    }

    /// Parse `shared=True`, `fPIC=false`, `with_libc=0` style assignments
    pub fn parse_assignments<S: AsRef<str>>(items: &[S]) -> Result<Self, ConfigurationError> {
        let mut request = Self::new();
        for item in items {
            let item = item.as_ref();
            let (name, value) = item
                .split_once('=')
                .ok_or_else(|| ConfigurationError::MalformedAssignment(item.to_string()))?;
            let name = name.trim();
            // Allow `liburing/*:shared=True` style scoping; only the option name matters.
            let name = name.rsplit(':').next().unwrap_or(name);
            let value = parse_bool(name, value.trim())?;
            request = request.set(name, value)?;
        }
        Ok(request)
    }

    fn get(&self, name: &str) -> Option<bool> {
        self.values.get(name).copied()
    }
}

fn canonical_name(name: &str) -> Result<&'static str, ConfigurationError> {
    match name {
        "fPIC" | "fpic" => Ok(OPT_FPIC),
        "shared" => Ok(OPT_SHARED),
        "with_libc" => Ok(OPT_WITH_LIBC),
        other => Err(ConfigurationError::UnknownOption(other.to_string())),
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigurationError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigurationError::InvalidOptionValue {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Which options exist for a (platform, version) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionCapabilities {
    pub fpic: bool,
    pub with_libc: bool,
}

impl OptionCapabilities {
    /// Evaluate the availability gates once
    pub fn evaluate(
        platform: Platform,
        version: &PackageVersion,
        decl: &OptionsSection,
    ) -> Result<Self, ConfigurationError> {
        let with_libc = match &decl.with_libc_since {
            Some(since) => *version >= PackageVersion::parse(since)?,
            None => true,
        };

        Ok(Self {
            fpic: platform.is_posix(),
            with_libc,
        })
    }
}

/// The resolved, normalized option set of one build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct OptionSet {
    /// Absent on non-POSIX targets and whenever `shared` is true
    #[serde(rename = "fPIC", skip_serializing_if = "Option::is_none")]
    pub fpic: Option<bool>,

    pub shared: bool,

    /// Absent for versions that predate the option
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_libc: Option<bool>,
}

impl OptionSet {
    /// Apply defaults, drop unavailable options, apply the request, normalize
    pub fn resolve(
        decl: &OptionsSection,
        caps: OptionCapabilities,
        request: &OptionRequest,
    ) -> Self {
        let pick = |name: &str, available: bool, default: bool| -> Option<bool> {
            if !available {
                if request.get(name).is_some() {
                    debug!("Ignoring option {}: not available for this platform/version", name);
                }
                return None;
            }
            Some(request.get(name).unwrap_or(default))
        };

        let set = Self {
            fpic: pick(OPT_FPIC, caps.fpic, decl.fpic),
            shared: request.get(OPT_SHARED).unwrap_or(decl.shared),
            with_libc: pick(OPT_WITH_LIBC, caps.with_libc, decl.with_libc),
        };
        set.normalized()
    }

    /// Shared libraries are always position independent; drop `fPIC`
    pub fn normalized(mut self) -> Self {
        if self.shared {
            self.fpic = None;
        }
        self
    }

    /// Value passed to the install step as `ENABLE_SHARED`
    pub fn enable_shared(&self) -> &'static str {
        if self.shared { "1" } else { "0" }
    }

    /// Canonical `name=value` lines, in fixed order
    pub fn canonical(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(v) = self.fpic {
            lines.push(format!("{}={}", OPT_FPIC, v));
        }
        lines.push(format!("{}={}", OPT_SHARED, self.shared));
        if let Some(v) = self.with_libc {
            lines.push(format!("{}={}", OPT_WITH_LIBC, v));
        }
        lines
    }
}

impl fmt::Display for OptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical().join(" "))
    }
}

/// Positional configure arguments for an option set
///
/// Pure: the same option set always yields the same sequence.
pub fn derive_configure_args(options: &OptionSet) -> Vec<String> {
    let mut args = Vec::new();
    if options.with_libc == Some(false) {
        args.push("--nolibc".to_string());
    }
    args
}

/// Compiler flags and configure arguments for one build
///
/// Never stored: the configurator and the packager both derive it from the
/// option set when they need it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BuildEnvironment {
    pub cflags: Vec<String>,
    pub configure_args: Vec<String>,
}

impl BuildEnvironment {
    pub fn derive(options: &OptionSet, build_type: BuildType, recipe_cflags: &[String]) -> Self {
        let mut cflags = vec![C_DIALECT.to_string()];
        cflags.extend(recipe_cflags.iter().filter(|f| *f != C_DIALECT).cloned());
        if options.fpic == Some(true) {
            cflags.push("-fPIC".to_string());
        }
        cflags.extend(build_type.cflags().iter().map(|s| s.to_string()));

        Self {
            cflags,
            configure_args: derive_configure_args(options),
        }
    }

    /// CFLAGS as a single environment value
    pub fn cflags_value(&self) -> String {
        self.cflags.join(" ")
    }
}
