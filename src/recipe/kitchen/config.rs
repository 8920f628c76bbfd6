// src/recipe/kitchen/config.rs

//! Configuration types for the Kitchen

use crate::error::{Error, Result};
use crate::recipe::format::PackageSpec;
use crate::recipe::kitchen::artifact::{InstalledArtifactTree, LinkageInfo};
use crate::recipe::options::OptionSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the Kitchen
///
/// Loaded from TOML; every key is optional and falls back to [`Default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KitchenConfig {
    /// Root under which each package id gets its own build directory
    pub build_root: PathBuf,
    /// Directory for downloaded sources, keyed by checksum
    pub source_cache: PathBuf,
    /// Number of parallel make jobs
    pub jobs: u32,
    /// C compiler override (exported as `CC`, also used for tasting)
    pub cc: Option<String>,
    /// make executable
    pub make: String,
    /// Keep the extracted source tree after a successful cook
    pub keep_sources: bool,
    /// Show a download progress bar
    pub show_progress: bool,
    /// Timeout for a single HTTP request
    pub http_timeout_secs: u64,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        let jobs = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(4);
        let base = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("uring-kitchen");

        Self {
            build_root: base.join("builds"),
            source_cache: base.join("sources"),
            jobs,
            cc: None,
            make: "make".to_string(),
            keep_sources: true,
            show_progress: true,
            http_timeout_secs: 300,
        }
    }
}

impl KitchenConfig {
    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid config {}: {}", path.display(), e)))
    }

    /// Load `path` if given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Build configuration rooted in one directory (handy for tests and CI)
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            build_root: root.join("builds"),
            source_cache: root.join("sources"),
            show_progress: false,
            ..Self::default()
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Compiler to use: config, then `$CC`, then `cc`
    pub fn compiler(&self) -> String {
        self.cc
            .clone()
            .or_else(|| std::env::var("CC").ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "cc".to_string())
    }
}

/// Result of cooking a recipe
#[derive(Debug, Serialize)]
pub struct CookResult {
    /// Package identity
    pub spec: PackageSpec,
    /// Short hash of settings and options naming the build directory
    pub package_id: String,
    /// Normalized options the package was built with
    pub options: OptionSet,
    /// The installed package directory
    pub package_dir: PathBuf,
    /// What ended up in the package directory
    pub tree: InstalledArtifactTree,
    /// What consumers link against
    pub linkage: LinkageInfo,
    /// Build log
    #[serde(skip)]
    pub log: String,
    /// Warnings generated during the cook
    pub warnings: Vec<String>,
}
