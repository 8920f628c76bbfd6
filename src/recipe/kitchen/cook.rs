// src/recipe/kitchen/cook.rs

//! Cook: the build execution for a single plan

use crate::error::{PackageError, Result};
use crate::recipe::kitchen::archive::apply_patch;
use crate::recipe::kitchen::artifact::InstalledArtifactTree;
use crate::recipe::kitchen::context::BuildContext;
use crate::recipe::kitchen::{CookPlan, Kitchen};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A single cook operation
///
/// Phases run in order and each one stops the cook on failure:
/// acquire, patch, simmer (configure + make), plate (install + trim).
pub struct Cook<'a> {
    kitchen: &'a Kitchen,
    plan: &'a CookPlan,
    ctx: BuildContext,
    /// Extracted, patched source tree
    pub(super) source_dir: PathBuf,
    /// Whether `source_dir` belongs to the kitchen and may be cleared
    owns_source: bool,
    /// Installed package tree
    pub(super) package_dir: PathBuf,
    /// Build log accumulator
    pub(super) log: String,
    pub(super) warnings: Vec<String>,
}

impl<'a> Cook<'a> {
    pub(super) fn new(kitchen: &'a Kitchen, plan: &'a CookPlan, source_dir: PathBuf) -> Self {
        let owns_source = source_dir == plan.source_dir();
        Self {
            kitchen,
            plan,
            ctx: BuildContext::new(),
            source_dir,
            owns_source,
            package_dir: plan.build_dir.join("package"),
            log: String::new(),
            warnings: Vec::new(),
        }
    }

    /// Fetch, verify and extract the source archive
    ///
    /// A previous tree in the kitchen's own source directory is cleared
    /// first; any other destination must be empty or missing.
    pub(super) fn acquire(&mut self) -> Result<()> {
        if self.owns_source && self.source_dir.exists() {
            debug!("Clearing previous source tree {}", self.source_dir.display());
            fs::remove_dir_all(&self.source_dir)?;
        }
        self.kitchen
            .fetcher
            .fetch(&self.plan.source, &self.source_dir, true)?;
        self.log_line(&format!(
            "Fetched {} into {}",
            self.plan.source.url,
            self.source_dir.display()
        ));
        Ok(())
    }

    /// Apply the version's patches in order, stopping at the first failure
    pub(super) fn patch(&mut self) -> Result<()> {
        let plan = self.plan;
        for patch in &plan.patches {
            let dir = match &patch.base_path {
                Some(base) => self.source_dir.join(base),
                None => self.source_dir.clone(),
            };
            let touched = apply_patch(patch.index, &patch.label, &patch.path, &dir, patch.strip)?;
            self.log_line(&format!(
                "Applied patch #{} {} ({} file(s))",
                patch.index, patch.label, touched
            ));
        }
        Ok(())
    }

    /// Configure and compile
    pub(super) fn simmer(&mut self) -> Result<()> {
        let env = self.plan.environment();
        let kitchen = self.kitchen;
        let toolchain = kitchen.toolchain.as_ref();
        let build = self
            .ctx
            .configure(toolchain, &self.source_dir, &env, &mut self.log)?;
        toolchain.make(&build, &mut self.log)?;
        Ok(())
    }

    /// Install into the package directory and trim it
    pub(super) fn plate(&mut self) -> Result<InstalledArtifactTree> {
        if self.package_dir.exists() {
            fs::remove_dir_all(&self.package_dir)
                .map_err(|e| PackageError::io(&self.package_dir, e))?;
        }
        fs::create_dir_all(&self.package_dir).map_err(|e| PackageError::io(&self.package_dir, e))?;

        self.copy_licenses()?;

        let env = self.plan.environment();
        let kitchen = self.kitchen;
        let toolchain = kitchen.toolchain.as_ref();
        let build = self
            .ctx
            .configure(toolchain, &self.source_dir, &env, &mut self.log)
            .map_err(PackageError::Configure)?;
        let install_args = vec![format!("ENABLE_SHARED={}", self.plan.options.enable_shared())];
        toolchain
            .install(&build, &self.package_dir, &install_args, &mut self.log)
            .map_err(PackageError::Install)?;

        for rel in &self.plan.prune {
            let path = self.package_dir.join(rel);
            remove_path(&path)?;
            debug!("Pruned {}", path.display());
        }

        if self.plan.options.shared {
            let archive = self.package_dir.join("lib").join(&self.plan.static_archive);
            if archive.exists() {
                fs::remove_file(&archive).map_err(|e| PackageError::io(&archive, e))?;
                self.log_line(&format!("Removed static archive {}", archive.display()));
            } else {
                let msg = format!("Static archive {} was not installed", archive.display());
                warn!("{}", msg);
                self.warnings.push(msg);
            }
        }

        Ok(InstalledArtifactTree::scan(&self.package_dir, &self.plan.lib)?)
    }

    fn copy_licenses(&mut self) -> Result<()> {
        let licenses_dir = self.package_dir.join("licenses");
        let mut copied = 0;

        let plan = self.plan;
        // Only the recipe's pattern is glob syntax; the build root is literal
        let root = glob::Pattern::escape(&self.source_dir.to_string_lossy());
        for pattern in &plan.license_files {
            let full = format!("{}/{}", root.trim_end_matches('/'), pattern);
            let matches = glob::glob(&full)
                .map_err(|e| PackageError::LicensePattern(format!("{pattern}: {e}")))?;

            for path in matches.flatten().filter(|p| p.is_file()) {
                let Some(name) = path.file_name() else {
                    continue;
                };
                fs::create_dir_all(&licenses_dir).map_err(|e| PackageError::io(&licenses_dir, e))?;
                let dest = licenses_dir.join(name);
                fs::copy(&path, &dest).map_err(|e| PackageError::io(&dest, e))?;
                copied += 1;
            }
        }

        if copied == 0 {
            debug!("No license files matched {:?}", plan.license_files);
        } else {
            self.log_line(&format!("Copied {copied} license file(s)"));
        }
        Ok(())
    }

    /// Number of configure runs this cook performed
    pub(super) fn configure_runs(&self) -> usize {
        self.ctx.configure_runs()
    }

    pub(super) fn log_line(&mut self, line: &str) {
        info!("{}", line);
        self.log.push_str(line);
        self.log.push('\n');
    }
}

/// Remove a file or directory tree; absence is fine
fn remove_path(path: &Path) -> std::result::Result<(), PackageError> {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => Err(e),
    };
    result.map_err(|e| PackageError::io(path, e))
}
