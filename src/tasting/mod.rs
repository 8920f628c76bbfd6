// src/tasting/mod.rs

//! Tasting: a smoke test against a cooked package
//!
//! A small C consumer is compiled against the package's `include/` and
//! `lib/` directories and run. Running is gated twice: cross builds are
//! never run, and the running kernel must be at least the recipe's minimum
//! (io_uring needs 5.1). Everything host-specific sits behind
//! [`TastingHost`].

use crate::error::{BuildError, TasteError};
use crate::platform::Settings;
use crate::recipe::LinkageInfo;
use crate::version::{PackageVersion, kernel_meets_minimum};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Consumer source used when the recipe's test source is not on disk
pub const EMBEDDED_TEST_SOURCE: &str = include_str!("../../test_package/test_package.c");

/// Host capabilities the harness depends on
pub trait TastingHost {
    /// Whether binaries built for `target` cannot run here
    fn detect_cross_build(&self, target: &Settings) -> bool;

    /// Where the compiled consumer lives inside `build_dir`
    fn locate_test_binary(&self, build_dir: &Path) -> PathBuf;

    /// `uname -r` of the running kernel
    fn kernel_release(&self) -> Result<String, TasteError>;
}

/// The machine we are running on
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeHost;

impl TastingHost for NativeHost {
    fn detect_cross_build(&self, target: &Settings) -> bool {
        target.is_cross_from(&Settings::host())
    }

    fn locate_test_binary(&self, build_dir: &Path) -> PathBuf {
        build_dir.join(format!("test_package{}", std::env::consts::EXE_SUFFIX))
    }

    fn kernel_release(&self) -> Result<String, TasteError> {
        let uts = nix::sys::utsname::uname().map_err(|e| TasteError::KernelRelease(e.to_string()))?;
        Ok(uts.release().to_string_lossy().into_owned())
    }
}

/// Why the consumer was not run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    CrossBuild,
    KernelTooOld { running: String, required: String },
}

/// Result of a tasting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TasteOutcome {
    /// Compiled and ran successfully
    Passed { binary: PathBuf, stdout: String },
    Skipped(SkipReason),
}

/// Compiles and runs the consumer
pub struct Taster<'a, H: TastingHost> {
    host: &'a H,
    cc: String,
}

impl<'a, H: TastingHost> Taster<'a, H> {
    pub fn new(host: &'a H, cc: impl Into<String>) -> Self {
        Self {
            host,
            cc: cc.into(),
        }
    }

    /// Taste the package in `package_dir`
    ///
    /// `source` is the consumer's C file; when it is `None` or missing the
    /// embedded copy is written into `work_dir` and used instead.
    pub fn taste(
        &self,
        package_dir: &Path,
        linkage: &LinkageInfo,
        target: &Settings,
        source: Option<&Path>,
        work_dir: &Path,
    ) -> Result<TasteOutcome, TasteError> {
        let include_dir = package_dir.join("include");
        let lib_dir = package_dir.join("lib");
        if !include_dir.is_dir() || !lib_dir.is_dir() {
            return Err(TasteError::NotAPackage(package_dir.to_path_buf()));
        }

        if self.host.detect_cross_build(target) {
            info!("Cross build, not tasting");
            return Ok(TasteOutcome::Skipped(SkipReason::CrossBuild));
        }

        fs::create_dir_all(work_dir).map_err(|source| TasteError::Launch {
            path: work_dir.to_path_buf(),
            source,
        })?;
        let source = self.prepare_source(source, work_dir)?;
        let binary = self.host.locate_test_binary(work_dir);
        self.compile(&source, &binary, &include_dir, &lib_dir, linkage)?;

        if let Some(required) = &linkage.min_kernel {
            let release = self.host.kernel_release()?;
            if let Some(skip) = kernel_gate(&release, required)? {
                info!("Kernel {} is older than {}, not running the consumer", release, required);
                return Ok(TasteOutcome::Skipped(skip));
            }
        }

        let stdout = Self::run(&binary, &lib_dir)?;
        Ok(TasteOutcome::Passed { binary, stdout })
    }

    fn prepare_source(&self, source: Option<&Path>, work_dir: &Path) -> Result<PathBuf, TasteError> {
        if let Some(path) = source.filter(|p| p.is_file()) {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = source {
            debug!("{} not found, using the embedded consumer", path.display());
        }
        let path = work_dir.join("test_package.c");
        fs::write(&path, EMBEDDED_TEST_SOURCE).map_err(|_| TasteError::MissingSource(path.clone()))?;
        Ok(path)
    }

    fn compile(
        &self,
        source: &Path,
        binary: &Path,
        include_dir: &Path,
        lib_dir: &Path,
        linkage: &LinkageInfo,
    ) -> Result<(), TasteError> {
        let cc = which::which(&self.cc).map_err(|_| {
            TasteError::Compile(BuildError::ToolNotFound {
                tool: self.cc.clone(),
            })
        })?;

        let mut cmd = Command::new(cc);
        cmd.arg(source)
            .arg("-o")
            .arg(binary)
            .arg(format!("-I{}", include_dir.display()))
            .arg(format!("-L{}", lib_dir.display()))
            .args(linkage.link_flags());
        debug!("Compiling consumer: {:?}", cmd);

        let output = cmd.output().map_err(|source| {
            TasteError::Compile(BuildError::Spawn {
                phase: "compile".to_string(),
                source,
            })
        })?;
        if !output.status.success() {
            return Err(TasteError::Compile(BuildError::Failed {
                phase: "compile".to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }));
        }
        Ok(())
    }

    fn run(binary: &Path, lib_dir: &Path) -> Result<String, TasteError> {
        info!("Running {}", binary.display());
        let output = Command::new(binary)
            .env("LD_LIBRARY_PATH", lib_dir)
            .output()
            .map_err(|source| TasteError::Launch {
                path: binary.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            return Err(TasteError::Run {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// `None` when `release` satisfies `required`
pub fn kernel_gate(release: &str, required: &str) -> Result<Option<SkipReason>, TasteError> {
    let minimum =
        PackageVersion::parse(required).map_err(|e| TasteError::KernelRelease(e.to_string()))?;
    let satisfied = kernel_meets_minimum(release, &minimum)
        .map_err(|e| TasteError::KernelRelease(e.to_string()))?;

    if !satisfied {
        Ok(Some(SkipReason::KernelTooOld {
            running: release.to_string(),
            required: required.to_string(),
        }))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, BuildType, Platform};

    struct FakeHost {
        cross: bool,
        release: &'static str,
    }

    impl TastingHost for FakeHost {
        fn detect_cross_build(&self, _target: &Settings) -> bool {
            self.cross
        }

        fn locate_test_binary(&self, build_dir: &Path) -> PathBuf {
            build_dir.join("test_package")
        }

        fn kernel_release(&self) -> Result<String, TasteError> {
            Ok(self.release.to_string())
        }
    }

    fn settings() -> Settings {
        Settings {
            os: Platform::Linux,
            arch: Arch::X86_64,
            build_type: BuildType::Release,
        }
    }

    fn linkage() -> LinkageInfo {
        LinkageInfo {
            libs: vec!["uring".to_string()],
            pkg_config: Some("liburing".to_string()),
            min_kernel: Some("5.1".to_string()),
        }
    }

    fn package_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("include")).unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        dir
    }

    #[test]
    fn test_cross_build_is_skipped_before_compiling() {
        let pkg = package_tree();
        let work = tempfile::tempdir().unwrap();
        let host = FakeHost {
            cross: true,
            release: "6.1.0",
        };
        // A compiler that does not exist proves nothing was compiled
        let taster = Taster::new(&host, "no-such-cc");
        let outcome = taster
            .taste(pkg.path(), &linkage(), &settings(), None, work.path())
            .unwrap();
        assert_eq!(outcome, TasteOutcome::Skipped(SkipReason::CrossBuild));
    }

    #[test]
    fn test_not_a_package() {
        let empty = tempfile::tempdir().unwrap();
        let host = FakeHost {
            cross: false,
            release: "6.1.0",
        };
        let err = Taster::new(&host, "cc")
            .taste(empty.path(), &linkage(), &settings(), None, empty.path())
            .unwrap_err();
        assert!(matches!(err, TasteError::NotAPackage(_)));
    }

    #[test]
    fn test_missing_compiler_is_a_compile_error() {
        let pkg = package_tree();
        let work = tempfile::tempdir().unwrap();
        let host = FakeHost {
            cross: false,
            release: "6.1.0",
        };
        let err = Taster::new(&host, "no-such-cc")
            .taste(pkg.path(), &linkage(), &settings(), None, work.path())
            .unwrap_err();
        assert!(matches!(
            err,
            TasteError::Compile(BuildError::ToolNotFound { .. })
        ));
        // The embedded consumer was written out
        assert!(work.path().join("test_package.c").exists());
    }

    #[test]
    fn test_kernel_gate() {
        assert_eq!(kernel_gate("5.15.0-91-generic", "5.1").unwrap(), None);
        assert_eq!(kernel_gate("5.1.0", "5.1").unwrap(), None);
        assert_eq!(
            kernel_gate("4.19.0-25-amd64", "5.1").unwrap(),
            Some(SkipReason::KernelTooOld {
                running: "4.19.0-25-amd64".to_string(),
                required: "5.1".to_string(),
            })
        );
        assert!(kernel_gate("unknown", "5.1").is_err());
    }

    #[test]
    fn test_native_host_binary_location() {
        let path = NativeHost.locate_test_binary(Path::new("/tmp/taste"));
        assert!(path.starts_with("/tmp/taste"));
        assert!(path.to_string_lossy().contains("test_package"));
    }

    #[test]
    fn test_native_host_reports_kernel_release() {
        let release = NativeHost.kernel_release().unwrap();
        assert!(PackageVersion::from_kernel_release(&release).is_ok());
    }
}
