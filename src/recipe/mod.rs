// src/recipe/mod.rs

//! Recipe system for building liburing from source
//!
//! A recipe declares one upstream library:
//! - Source archives and their checksums, per version
//! - Patches to apply, per version and in order
//! - Option defaults and the gates that decide whether an option exists
//! - Packaging rules (license files, paths to prune)
//! - Linkage metadata for consumers
//!
//! # Culinary Terminology
//!
//! - **Recipe**: The build specification (like a recipe card)
//! - **Kitchen**: Owns configuration, the fetcher and the toolchain
//! - **Cook**: One build of one plan
//! - **Prep**: Acquire and patch the source
//! - **Simmer**: Configure and compile
//! - **Plate**: Install, prune and trim the package tree
//!
//! # Example Recipe
//!
//! ```toml
//! [package]
//! name = "liburing"
//! version = "2.4"
//!
//! [platform]
//! supported = "Linux"
//!
//! [options]
//! with_libc_since = "2.2"
//!
//! [build]
//! cflags = ["-std=gnu99"]
//!
//! [package_info]
//! libs = ["uring"]
//! pkg_config = "liburing"
//!
//! [sources."2.4"]
//! url = "https://github.com/axboe/liburing/archive/liburing-2.4.tar.gz"
//! checksum = "sha256:2398ec82..."
//! ```

mod format;
mod kitchen;
pub mod options;
pub mod parser;

pub use format::{
    BuildSection, OptionsSection, PackageInfoSection, PackageSection, PackageSpec, PatchEntry,
    PlatformSection, Recipe, SourceEntry, TestSection,
};
pub use kitchen::{
    ArchiveKind, Autotools, BuildContext, BuildToolchain, ConfiguredBuild, Cook, CookPlan,
    CookResult, HttpFetcher, InstalledArtifactTree, Kitchen, KitchenConfig, LinkageInfo,
    ResolvedPatch, SourceFetcher, apply_patch, extract_archive, package_id,
};
pub use options::{
    BuildEnvironment, OptionCapabilities, OptionRequest, OptionSet, derive_configure_args,
};
pub use parser::{
    bundled_recipe, load_recipe, parse_recipe, parse_recipe_file, patch_file_warnings,
    validate_recipe,
};
