// src/recipe/kitchen/mod.rs

//! Kitchen: where recipes are cooked
//!
//! The Kitchen turns a recipe, a version, target settings and requested
//! options into an installed package tree. Work happens in two steps:
//!
//! - [`Kitchen::plan`] is pure. It validates the target platform, resolves
//!   and normalizes the options, computes the package id and looks up the
//!   source and patch list. An unsupported platform stops here, before any
//!   network or disk access.
//! - [`Kitchen::cook`] runs the plan: acquire, patch, simmer (configure and
//!   make), plate (install, prune, trim). Every phase fails fast.
//!
//! Each (version, settings, options) combination builds in its own
//! directory under the build root, named after the package id.

mod archive;
mod artifact;
mod config;
mod context;
mod cook;
mod fetcher;
mod toolchain;

pub use archive::{ArchiveKind, apply_patch, extract_archive};
pub use artifact::{InstalledArtifactTree, LinkageInfo};
pub use config::{CookResult, KitchenConfig};
pub use context::BuildContext;
pub use cook::Cook;
pub use fetcher::{HttpFetcher, SourceFetcher};
pub use toolchain::{Autotools, BuildToolchain, ConfiguredBuild};

use crate::error::Result;
use crate::hash::sha256;
use crate::platform::{self, Settings};
use crate::recipe::format::{PackageSpec, Recipe, SourceEntry};
use crate::recipe::options::{BuildEnvironment, OptionCapabilities, OptionRequest, OptionSet};
use crate::version::PackageVersion;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// A patch ready to apply: position, label and resolved path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPatch {
    /// 1-based position in the version's patch list
    pub index: usize,
    /// Patch file as written in the recipe
    pub label: String,
    pub path: PathBuf,
    pub strip: u32,
    pub base_path: Option<String>,
}

/// Everything one cook needs, decided up front without I/O
#[derive(Debug, Clone)]
pub struct CookPlan {
    pub spec: PackageSpec,
    pub settings: Settings,
    pub options: OptionSet,
    pub package_id: String,
    pub source: SourceEntry,
    pub patches: Vec<ResolvedPatch>,
    /// Flags the recipe adds regardless of options
    pub recipe_cflags: Vec<String>,
    pub license_files: Vec<String>,
    pub prune: Vec<String>,
    /// Library name token (`uring`)
    pub lib: String,
    /// Static archive removed from `lib/` for shared builds
    pub static_archive: String,
    pub linkage: LinkageInfo,
    /// `<build_root>/<name>-<version>-<package_id>`
    pub build_dir: PathBuf,
}

impl CookPlan {
    /// Derive the build environment; never cached
    pub fn environment(&self) -> BuildEnvironment {
        BuildEnvironment::derive(&self.options, self.settings.build_type, &self.recipe_cflags)
    }

    /// Patches whose files are not on disk
    ///
    /// Checked only after planning succeeded, so a rejected target never
    /// causes filesystem probes.
    pub fn missing_patches(&self) -> Vec<&ResolvedPatch> {
        self.patches.iter().filter(|p| !p.path.exists()).collect()
    }

    pub fn source_dir(&self) -> PathBuf {
        self.build_dir.join("src")
    }

    pub fn package_dir(&self) -> PathBuf {
        self.build_dir.join("package")
    }
}

/// Short, stable identifier for a (package, settings, options) combination
pub fn package_id(spec: &PackageSpec, settings: &Settings, options: &OptionSet) -> String {
    let mut canonical = vec![
        format!("name={}", spec.name),
        format!("version={}", spec.version),
        format!("os={}", settings.os),
        format!("arch={}", settings.arch),
        format!("build_type={}", settings.build_type),
    ];
    canonical.extend(options.canonical());

    let mut id = sha256(canonical.join("\n").as_bytes());
    id.truncate(16);
    id
}

/// The Kitchen: where recipes are cooked
pub struct Kitchen {
    pub(crate) config: KitchenConfig,
    pub(crate) fetcher: Arc<dyn SourceFetcher>,
    pub(crate) toolchain: Arc<dyn BuildToolchain>,
}

impl Kitchen {
    /// Create a Kitchen that downloads over HTTP and builds with autotools
    pub fn new(config: KitchenConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config)?);
        let toolchain = Arc::new(Autotools::new(&config));
        Ok(Self::with_parts(config, fetcher, toolchain))
    }

    /// Create a Kitchen with a custom fetcher and toolchain
    pub fn with_parts(
        config: KitchenConfig,
        fetcher: Arc<dyn SourceFetcher>,
        toolchain: Arc<dyn BuildToolchain>,
    ) -> Self {
        Self {
            config,
            fetcher,
            toolchain,
        }
    }

    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    /// Decide everything about a cook without touching the network or disk
    ///
    /// `version` defaults to the recipe's own version.
    pub fn plan(
        &self,
        recipe: &Recipe,
        version: Option<&str>,
        settings: Settings,
        request: &OptionRequest,
    ) -> Result<CookPlan> {
        platform::validate(&recipe.package.name, recipe.platform.supported, settings.os)?;

        let version = version.unwrap_or(&recipe.package.version);
        let source = recipe.source_for(version)?.clone();
        let parsed = PackageVersion::parse(version)?;

        let caps = OptionCapabilities::evaluate(settings.os, &parsed, &recipe.options)?;
        let options = OptionSet::resolve(&recipe.options, caps, request);

        let spec = recipe.package_spec(version);
        let package_id = package_id(&spec, &settings, &options);
        debug!("Package id for {} {} [{}]: {}", spec.name, version, options, package_id);

        let patches = recipe
            .patches_for(version)
            .iter()
            .enumerate()
            .map(|(i, entry)| ResolvedPatch {
                index: i + 1,
                label: entry.file.clone(),
                path: recipe.patch_path(entry),
                strip: entry.strip,
                base_path: entry.base_path.clone(),
            })
            .collect();

        let build_dir = self
            .config
            .build_root
            .join(format!("{}-{}-{}", spec.name, spec.version, package_id));

        Ok(CookPlan {
            spec,
            settings,
            options,
            package_id,
            source,
            patches,
            recipe_cflags: recipe.build.cflags.clone(),
            license_files: recipe.build.license_files.clone(),
            prune: recipe.build.prune.clone(),
            lib: recipe.primary_lib().to_string(),
            static_archive: recipe.static_archive_name(),
            linkage: LinkageInfo::from_recipe(recipe),
            build_dir,
        })
    }

    /// Cook a plan into an installed package tree
    pub fn cook(&self, plan: &CookPlan) -> Result<CookResult> {
        info!(
            "Cooking {} version {} [{}]",
            plan.spec.name, plan.spec.version, plan.options
        );

        let mut cook = Cook::new(self, plan, plan.source_dir());

        info!("Prep: acquiring source...");
        cook.acquire()?;

        if !plan.patches.is_empty() {
            info!("Applying {} patch(es)...", plan.patches.len());
        }
        cook.patch()?;

        info!("Simmering: configuring and building...");
        cook.simmer()?;

        info!("Plating: installing and trimming...");
        let tree = cook.plate()?;
        debug!("Configure ran {} time(s)", cook.configure_runs());

        if !self.config.keep_sources {
            fs::remove_dir_all(&cook.source_dir)?;
        }

        Ok(CookResult {
            spec: plan.spec.clone(),
            package_id: plan.package_id.clone(),
            options: plan.options,
            package_dir: cook.package_dir.clone(),
            tree,
            linkage: plan.linkage.clone(),
            log: cook.log,
            warnings: cook.warnings,
        })
    }

    /// Acquire and patch a plan's sources into `dest` without building
    ///
    /// Returns the number of patches applied.
    pub fn fetch(&self, plan: &CookPlan, dest: &Path) -> Result<usize> {
        info!(
            "Fetching sources for {} version {}",
            plan.spec.name, plan.spec.version
        );

        let mut cook = Cook::new(self, plan, dest.to_path_buf());
        cook.acquire()?;
        cook.patch()?;

        info!(
            "Fetched {} into {} ({} patch(es))",
            plan.spec.name,
            dest.display(),
            plan.patches.len()
        );
        Ok(plan.patches.len())
    }
}
