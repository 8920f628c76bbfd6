// src/recipe/kitchen/toolchain.rs

//! The external build toolchain

use crate::error::BuildError;
use crate::recipe::kitchen::config::KitchenConfig;
use crate::recipe::options::BuildEnvironment;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Handle to a configured source tree
///
/// Produced once by [`BuildToolchain::configure`] and handed to `make` and
/// `install`; the packager reuses it instead of configuring again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfiguredBuild {
    pub work_dir: PathBuf,
    pub env: BuildEnvironment,
}

/// configure / make / install
///
/// Output of every phase is appended to `log`.
pub trait BuildToolchain: Send + Sync {
    fn configure(
        &self,
        work_dir: &Path,
        env: &BuildEnvironment,
        log: &mut String,
    ) -> Result<ConfiguredBuild, BuildError>;

    fn make(&self, build: &ConfiguredBuild, log: &mut String) -> Result<(), BuildError>;

    fn install(
        &self,
        build: &ConfiguredBuild,
        dest: &Path,
        args: &[String],
        log: &mut String,
    ) -> Result<(), BuildError>;
}

/// `./configure && make && make install`
#[derive(Debug, Clone)]
pub struct Autotools {
    make: String,
    jobs: u32,
    cc: Option<String>,
}

impl Autotools {
    pub fn new(config: &KitchenConfig) -> Self {
        Self {
            make: config.make.clone(),
            jobs: config.jobs.max(1),
            cc: config.cc.clone(),
        }
    }

    fn locate(tool: &str) -> Result<PathBuf, BuildError> {
        which::which(tool).map_err(|_| BuildError::ToolNotFound {
            tool: tool.to_string(),
        })
    }

    fn command(&self, program: &Path, build_env: &BuildEnvironment, work_dir: &Path) -> Command {
        let mut cmd = Command::new(program);
        cmd.current_dir(work_dir)
            .env("CFLAGS", build_env.cflags_value());
        if let Some(cc) = &self.cc {
            cmd.env("CC", cc);
        }
        cmd
    }

    fn run(phase: &str, mut cmd: Command, log: &mut String) -> Result<(), BuildError> {
        debug!("Running {} phase: {:?}", phase, cmd);
        let _ = writeln!(log, "==> {phase}: {cmd:?}");

        let output = cmd.output().map_err(|source| BuildError::Spawn {
            phase: phase.to_string(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        log.push_str(&stdout);
        log.push_str(&stderr);

        if !output.status.success() {
            return Err(BuildError::Failed {
                phase: phase.to_string(),
                code: output.status.code(),
                stderr: stderr.into_owned(),
            });
        }
        Ok(())
    }
}

impl BuildToolchain for Autotools {
    fn configure(
        &self,
        work_dir: &Path,
        env: &BuildEnvironment,
        log: &mut String,
    ) -> Result<ConfiguredBuild, BuildError> {
        if !work_dir.is_dir() {
            return Err(BuildError::MissingWorkDir(work_dir.to_path_buf()));
        }
        let sh = Self::locate("sh")?;

        info!("Configuring in {}", work_dir.display());
        let mut cmd = self.command(&sh, env, work_dir);
        cmd.arg("./configure")
            .arg("--prefix=/")
            .args(&env.configure_args);
        Self::run("configure", cmd, log)?;

        Ok(ConfiguredBuild {
            work_dir: work_dir.to_path_buf(),
            env: env.clone(),
        })
    }

    fn make(&self, build: &ConfiguredBuild, log: &mut String) -> Result<(), BuildError> {
        let make = Self::locate(&self.make)?;

        info!("Building with {} jobs", self.jobs);
        let mut cmd = self.command(&make, &build.env, &build.work_dir);
        cmd.arg(format!("-j{}", self.jobs));
        Self::run("make", cmd, log)
    }

    fn install(
        &self,
        build: &ConfiguredBuild,
        dest: &Path,
        args: &[String],
        log: &mut String,
    ) -> Result<(), BuildError> {
        let make = Self::locate(&self.make)?;

        info!("Installing into {}", dest.display());
        let mut cmd = self.command(&make, &build.env, &build.work_dir);
        cmd.arg("install")
            .arg(format!("DESTDIR={}", dest.display()))
            .args(args);
        Self::run("install", cmd, log)
    }
}
