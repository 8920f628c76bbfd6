// src/version/mod.rs

//! Dotted version handling for recipe versions and kernel releases
//!
//! Upstream tags like `2.4`, `2.10` or `0.7` are not semver, so they are
//! normalized to `major.minor.patch` before comparing. Comparison is numeric
//! per component: `2.10 > 2.2`.

use crate::error::ConfigurationError;
use regex::Regex;
use semver::Version;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static KERNEL_RELEASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+(?:\.[0-9]+)*)").expect("static regex"));

/// A package or kernel version as written upstream
#[derive(Debug, Clone)]
pub struct PackageVersion {
    raw: String,
    normalized: Version,
}

impl PackageVersion {
    /// Parse a dotted numeric version such as `2.4` or `5.15.0`
    ///
    /// Anything after the first three components is ignored for ordering
    /// but kept in the display form.
    pub fn parse(s: &str) -> Result<Self, ConfigurationError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ConfigurationError::InvalidVersion(s.to_string()));
        }

        if let Ok(v) = Version::parse(trimmed) {
            return Ok(Self {
                raw: trimmed.to_string(),
                normalized: v,
            });
        }

        let mut parts = [0u64; 3];
        for (slot, part) in parts.iter_mut().zip(trimmed.split('.')) {
            *slot = part
                .parse::<u64>()
                .map_err(|_| ConfigurationError::InvalidVersion(s.to_string()))?;
        }

        Ok(Self {
            raw: trimmed.to_string(),
            normalized: Version::new(parts[0], parts[1], parts[2]),
        })
    }

    /// Extract the leading `[0-9.]+` of a kernel release string
    ///
    /// `5.15.0-91-generic` becomes `5.15.0`, `6.1.0-rc3` becomes `6.1.0`.
    pub fn from_kernel_release(release: &str) -> Result<Self, ConfigurationError> {
        let numeric = KERNEL_RELEASE
            .captures(release.trim())
            .and_then(|c| c.get(1))
            .ok_or_else(|| ConfigurationError::InvalidVersion(release.to_string()))?;
        Self::parse(numeric.as_str())
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for PackageVersion {}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized.cmp(&other.normalized)
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for PackageVersion {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Check a running kernel release against a minimum version
pub fn kernel_meets_minimum(
    release: &str,
    minimum: &PackageVersion,
) -> Result<bool, ConfigurationError> {
    Ok(PackageVersion::from_kernel_release(release)? >= *minimum)
}
