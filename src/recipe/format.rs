// src/recipe/format.rs

//! Recipe file format definitions
//!
//! A recipe is a TOML file describing one upstream library: its identity,
//! the versioned source and patch tables, option defaults and their gates,
//! what to prune from the installed tree, and what consumers link against.

use crate::error::ConfigurationError;
use crate::platform::Platform;
use crate::version::PackageVersion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A complete recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Package metadata
    pub package: PackageSection,

    /// Which target operating system the package builds for
    pub platform: PlatformSection,

    /// Option defaults and availability gates
    #[serde(default)]
    pub options: OptionsSection,

    /// Compiler flags and packaging rules
    #[serde(default)]
    pub build: BuildSection,

    /// Linkage metadata exposed to consumers
    pub package_info: PackageInfoSection,

    /// Tasting (smoke test) settings
    #[serde(default)]
    pub test: Option<TestSection>,

    /// Source archives keyed by version
    #[serde(default)]
    pub sources: BTreeMap<String, SourceEntry>,

    /// Ordered patch lists keyed by version
    #[serde(default)]
    pub patches: BTreeMap<String, Vec<PatchEntry>>,

    /// Directory the recipe was loaded from; patch paths resolve against it
    #[serde(skip)]
    pub recipe_dir: Option<PathBuf>,
}

impl Recipe {
    /// Look up the source descriptor for a version
    pub fn source_for(&self, version: &str) -> Result<&SourceEntry, ConfigurationError> {
        self.sources
            .get(version)
            .ok_or_else(|| ConfigurationError::UnknownVersion {
                package: self.package.name.clone(),
                version: version.to_string(),
                known: self.versions().join(", "),
            })
    }

    /// Patches for a version, in application order (empty if none)
    pub fn patches_for(&self, version: &str) -> &[PatchEntry] {
        self.patches.get(version).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Declared versions, oldest first
    pub fn versions(&self) -> Vec<String> {
        let mut versions: Vec<(Option<PackageVersion>, &String)> = self
            .sources
            .keys()
            .map(|k| (PackageVersion::parse(k).ok(), k))
            .collect();
        versions.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
        versions.into_iter().map(|(_, k)| k.clone()).collect()
    }

    /// Immutable package identity for one version
    pub fn package_spec(&self, version: &str) -> PackageSpec {
        PackageSpec {
            name: self.package.name.clone(),
            version: version.to_string(),
            license: self.package.license.clone(),
            homepage: self.package.homepage.clone(),
            url: self.package.url.clone(),
            description: self.package.description.clone(),
            topics: self.package.topics.clone(),
        }
    }

    /// Resolve a patch file against the recipe directory
    pub fn patch_path(&self, patch: &PatchEntry) -> PathBuf {
        match &self.recipe_dir {
            Some(dir) => dir.join(&patch.file),
            None => PathBuf::from(&patch.file),
        }
    }

    /// Name of the library consumers link against (first of `libs`)
    pub fn primary_lib(&self) -> &str {
        self.package_info
            .libs
            .first()
            .map(String::as_str)
            .unwrap_or(&self.package.name)
    }

    /// File name of the static archive the install step produces
    pub fn static_archive_name(&self) -> String {
        format!("lib{}.a", self.primary_lib())
    }

    /// Resolve the tasting source file against the recipe directory
    pub fn test_source(&self) -> Option<PathBuf> {
        let source = self.test.as_ref()?.source.as_ref()?;
        Some(match &self.recipe_dir {
            Some(dir) => dir.join(source),
            None => PathBuf::from(source),
        })
    }
}

/// Package metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    /// Package name
    pub name: String,

    /// Version built when none is requested
    pub version: String,

    /// License identifier (SPDX)
    #[serde(default)]
    pub license: Option<String>,

    /// Upstream homepage
    #[serde(default)]
    pub homepage: Option<String>,

    /// Where the recipe itself is maintained
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub topics: Vec<String>,
}

/// Supported target platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSection {
    pub supported: Platform,
}

/// Option defaults and version gates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsSection {
    #[serde(rename = "fPIC", default = "default_true")]
    pub fpic: bool,

    #[serde(default)]
    pub shared: bool,

    #[serde(default = "default_true")]
    pub with_libc: bool,

    /// First version that understands `with_libc`; absent means always
    #[serde(default)]
    pub with_libc_since: Option<String>,
}

impl Default for OptionsSection {
    fn default() -> Self {
        Self {
            fpic: true,
            shared: false,
            with_libc: true,
            with_libc_since: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Compiler flags and packaging rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSection {
    /// Extra CFLAGS; the C dialect flag is always added by the build
    #[serde(default)]
    pub cflags: Vec<String>,

    /// Glob patterns (relative to the source root) copied to `licenses/`
    #[serde(default = "default_license_files")]
    pub license_files: Vec<String>,

    /// Paths (relative to the package dir) removed after install
    #[serde(default = "default_prune")]
    pub prune: Vec<String>,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            cflags: Vec::new(),
            license_files: default_license_files(),
            prune: default_prune(),
        }
    }
}

fn default_license_files() -> Vec<String> {
    vec!["COPYING*".to_string(), "LICENSE".to_string()]
}

fn default_prune() -> Vec<String> {
    vec!["lib/pkgconfig".to_string(), "man".to_string()]
}

/// Linkage metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfoSection {
    /// Library names for the linker (`uring` for `-luring`)
    pub libs: Vec<String>,

    /// pkg-config module name
    #[serde(default)]
    pub pkg_config: Option<String>,
}

/// Tasting settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSection {
    /// Minimum running kernel for the smoke test to execute
    #[serde(default)]
    pub min_kernel: Option<String>,

    /// C source of the consumer binary, relative to the recipe
    #[serde(default)]
    pub source: Option<String>,
}

/// Source descriptor for one version
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceEntry {
    /// Archive URL (`https://`, `file://` or a local path)
    pub url: String,

    /// `algorithm:hex` checksum of the archive
    pub checksum: String,
}

impl SourceEntry {
    /// Archive file name taken from the URL
    pub fn archive_filename(&self) -> &str {
        self.url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("source.tar.gz")
    }
}

/// One patch in a version's ordered list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatchEntry {
    /// Patch file, relative to the recipe directory
    pub file: String,

    /// Leading path components stripped from diff paths
    #[serde(default = "default_strip")]
    pub strip: u32,

    /// Subdirectory of the source tree the patch applies to
    #[serde(default)]
    pub base_path: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

fn default_strip() -> u32 {
    1
}

/// Immutable identity of the package being cooked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSpec {
    pub name: String,
    pub version: String,
    pub license: Option<String>,
    pub homepage: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub topics: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe_with_versions(versions: &[&str]) -> Recipe {
        let mut sources = BTreeMap::new();
        for v in versions {
            sources.insert(
                v.to_string(),
                SourceEntry {
                    url: format!("https://example.com/liburing-{v}.tar.gz"),
                    checksum: format!("sha256:{}", "0".repeat(64)),
                },
            );
        }
        Recipe {
            package: PackageSection {
                name: "liburing".to_string(),
                version: "2.4".to_string(),
                license: None,
                homepage: None,
                url: None,
                description: None,
                topics: Vec::new(),
            },
            platform: PlatformSection {
                supported: Platform::Linux,
            },
            options: OptionsSection::default(),
            build: BuildSection::default(),
            package_info: PackageInfoSection {
                libs: vec!["uring".to_string()],
                pkg_config: None,
            },
            test: None,
            sources,
            patches: BTreeMap::new(),
            recipe_dir: None,
        }
    }

    #[test]
    fn test_versions_sorted_numerically() {
        let recipe = recipe_with_versions(&["2.10", "2.2", "0.7", "2.4"]);
        assert_eq!(recipe.versions(), vec!["0.7", "2.2", "2.4", "2.10"]);
    }

    #[test]
    fn test_unknown_version_lists_known() {
        let recipe = recipe_with_versions(&["2.3", "2.4"]);
        let err = recipe.source_for("9.9").unwrap_err();
        assert!(err.to_string().contains("2.3, 2.4"));
    }

    #[test]
    fn test_patches_default_empty() {
        let recipe = recipe_with_versions(&["2.4"]);
        assert!(recipe.patches_for("2.4").is_empty());
    }

    #[test]
    fn test_archive_filename() {
        let entry = SourceEntry {
            url: "https://github.com/axboe/liburing/archive/liburing-2.4.tar.gz".to_string(),
            checksum: String::new(),
        };
        assert_eq!(entry.archive_filename(), "liburing-2.4.tar.gz");
    }

    #[test]
    fn test_static_archive_name() {
        let recipe = recipe_with_versions(&["2.4"]);
        assert_eq!(recipe.static_archive_name(), "liburing.a");
    }

    #[test]
    fn test_patch_path_resolves_against_recipe_dir() {
        let mut recipe = recipe_with_versions(&["2.4"]);
        recipe.recipe_dir = Some(PathBuf::from("/srv/recipes/liburing"));
        let patch = PatchEntry {
            file: "patches/0001-fix.patch".to_string(),
            strip: 1,
            base_path: None,
            description: None,
        };
        assert_eq!(
            recipe.patch_path(&patch),
            PathBuf::from("/srv/recipes/liburing/patches/0001-fix.patch")
        );
    }
}
