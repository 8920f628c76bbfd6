// src/recipe/kitchen/context.rs

//! Per-invocation build context

use crate::error::BuildError;
use crate::recipe::kitchen::toolchain::{BuildToolchain, ConfiguredBuild};
use crate::recipe::options::BuildEnvironment;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Remembers configured trees for the lifetime of one cook
///
/// At most one configure runs per `(work_dir, configure args)`; the builder
/// and the packager both go through [`BuildContext::configure`] and share
/// the handle.
#[derive(Debug, Default)]
pub struct BuildContext {
    configured: HashMap<(PathBuf, Vec<String>), ConfiguredBuild>,
    configure_runs: usize,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure `work_dir`, or return the handle from an earlier call
    pub fn configure(
        &mut self,
        toolchain: &dyn BuildToolchain,
        work_dir: &Path,
        env: &BuildEnvironment,
        log: &mut String,
    ) -> Result<ConfiguredBuild, BuildError> {
        let key = (work_dir.to_path_buf(), env.configure_args.clone());
        if let Some(build) = self.configured.get(&key) {
            debug!("Reusing configured tree {}", work_dir.display());
            return Ok(build.clone());
        }

        let build = toolchain.configure(work_dir, env, log)?;
        self.configure_runs += 1;
        self.configured.insert(key, build.clone());
        Ok(build)
    }

    /// How many times configure actually ran
    pub fn configure_runs(&self) -> usize {
        self.configure_runs
    }
}
