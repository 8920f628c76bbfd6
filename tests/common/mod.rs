// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use uring_kitchen::hash::{HashAlgorithm, hash_bytes};
use uring_kitchen::recipe::{
    BuildEnvironment, BuildToolchain, ConfiguredBuild, HttpFetcher, SourceEntry, SourceFetcher,
    parse_recipe_file,
};
use uring_kitchen::{AcquisitionError, BuildError, Kitchen, KitchenConfig, Recipe};

/// Top-level directory inside the fixture tarball, as GitHub names it
pub const WRAPPER: &str = "liburing-liburing-2.4";

pub const SETUP_C: &str = "int io_uring_setup_flags(void)\n{\n\treturn 0;\n}\n";

/// Files in the fixture source tree
pub fn fixture_files() -> Vec<(&'static str, &'static str)> {
    vec![
        ("COPYING", "GNU LESSER GENERAL PUBLIC LICENSE\n"),
        ("COPYING.GPL", "GNU GENERAL PUBLIC LICENSE\n"),
        ("LICENSE", "Dual licensed\n"),
        ("README", "liburing\n"),
        ("configure", "#!/bin/sh\nexit 0\n"),
        ("src/setup.c", SETUP_C),
        ("src/include/liburing.h", "#define IO_URING_VERSION_MAJOR 2\n"),
    ]
}

/// Write a gzip tarball with every file under [`WRAPPER`]; returns its checksum
pub fn write_fixture_tarball(path: &Path, files: &[(&str, &str)]) -> String {
    let file = File::create(path).unwrap();
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{WRAPPER}/{name}"), content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();

    let bytes = fs::read(path).unwrap();
    hash_bytes(HashAlgorithm::Sha256, &bytes).to_string()
}

/// A patch turning `return 0` into `return <value>` in src/setup.c
pub fn setup_patch(from: u32, to: u32) -> String {
    format!(
        "--- a/src/setup.c\n+++ b/src/setup.c\n@@ -1,4 +1,4 @@\n int io_uring_setup_flags(void)\n {{\n-\treturn {from};\n+\treturn {to};\n }}\n"
    )
}

/// A scratch directory holding a fixture tarball, patches and a recipe
pub struct Fixture {
    pub dir: TempDir,
    pub archive: PathBuf,
    pub checksum: String,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("liburing-2.4.tar.gz");
        let checksum = write_fixture_tarball(&archive, &fixture_files());
        Self {
            dir,
            archive,
            checksum,
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> KitchenConfig {
        KitchenConfig::rooted_at(&self.path().join("kitchen"))
    }

    /// Write a patch file under `patches/` and return its recipe-relative path
    pub fn add_patch(&self, name: &str, content: &str) -> String {
        let dir = self.path().join("patches");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
        format!("patches/{name}")
    }

    /// Recipe with versions 2.1 and 2.4 (both pointing at the fixture) and
    /// the given patch files for 2.4
    pub fn recipe(&self, checksum: &str, url: &str, patches: &[String]) -> Recipe {
        let mut toml = format!(
            r#"
[package]
name = "liburing"
version = "2.4"
license = "GPL-2.0-or-later"
description = "io_uring helpers"

[platform]
supported = "Linux"

[options]
with_libc_since = "2.2"

[build]
cflags = ["-std=gnu99"]

[package_info]
libs = ["uring"]
pkg_config = "liburing"

[test]
min_kernel = "5.1"

[sources."2.1"]
url = "{url}"
checksum = "{checksum}"

[sources."2.4"]
url = "{url}"
checksum = "{checksum}"
"#
        );
        for patch in patches {
            toml.push_str(&format!("\n[[patches.\"2.4\"]]\nfile = \"{patch}\"\n"));
        }

        let path = self.path().join("liburing.toml");
        fs::write(&path, toml).unwrap();
        parse_recipe_file(&path).unwrap()
    }

    /// Recipe pointing at the fixture tarball with its real checksum
    pub fn default_recipe(&self) -> Recipe {
        self.recipe(&self.checksum, &self.archive.display().to_string(), &[])
    }

    pub fn kitchen(&self, toolchain: Arc<FakeToolchain>) -> Kitchen {
        let config = self.config();
        let fetcher = Arc::new(HttpFetcher::new(&config).unwrap());
        Kitchen::with_parts(config, fetcher, toolchain)
    }
}

/// One recorded toolchain call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    Configure {
        work_dir: PathBuf,
        args: Vec<String>,
        cflags: Vec<String>,
    },
    Make,
    Install {
        dest: PathBuf,
        args: Vec<String>,
    },
}

/// Toolchain that records calls and installs a liburing-shaped tree
#[derive(Debug, Default)]
pub struct FakeToolchain {
    pub calls: Mutex<Vec<ToolCall>>,
    pub fail_make: bool,
}

impl FakeToolchain {
    pub fn failing_make() -> Self {
        Self {
            fail_make: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn configure_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ToolCall::Configure { .. }))
            .count()
    }
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

impl BuildToolchain for FakeToolchain {
    fn configure(
        &self,
        work_dir: &Path,
        env: &BuildEnvironment,
        log: &mut String,
    ) -> Result<ConfiguredBuild, BuildError> {
        if !work_dir.is_dir() {
            return Err(BuildError::MissingWorkDir(work_dir.to_path_buf()));
        }
        self.calls.lock().unwrap().push(ToolCall::Configure {
            work_dir: work_dir.to_path_buf(),
            args: env.configure_args.clone(),
            cflags: env.cflags.clone(),
        });
        log.push_str("fake configure\n");
        Ok(ConfiguredBuild {
            work_dir: work_dir.to_path_buf(),
            env: env.clone(),
        })
    }

    fn make(&self, _build: &ConfiguredBuild, log: &mut String) -> Result<(), BuildError> {
        self.calls.lock().unwrap().push(ToolCall::Make);
        if self.fail_make {
            return Err(BuildError::Failed {
                phase: "make".to_string(),
                code: Some(2),
                stderr: "setup.c:3: error: expected ';'".to_string(),
            });
        }
        log.push_str("fake make\n");
        Ok(())
    }

    fn install(
        &self,
        _build: &ConfiguredBuild,
        dest: &Path,
        args: &[String],
        _log: &mut String,
    ) -> Result<(), BuildError> {
        self.calls.lock().unwrap().push(ToolCall::Install {
            dest: dest.to_path_buf(),
            args: args.to_vec(),
        });

        write(dest, "include/liburing.h", "/* liburing */\n");
        write(dest, "include/liburing/io_uring.h", "/* uapi */\n");
        write(dest, "lib/liburing.a", "!<arch>\n");
        write(dest, "lib/pkgconfig/liburing.pc", "Name: liburing\n");
        write(dest, "man/man3/io_uring_setup.3", ".TH io_uring_setup\n");
        if args.iter().any(|a| a == "ENABLE_SHARED=1") {
            write(dest, "lib/liburing.so.2.4", "\x7fELF");
        }
        Ok(())
    }
}

/// Fetcher that only counts calls
#[derive(Debug, Default)]
pub struct CountingFetcher {
    pub calls: AtomicUsize,
}

impl CountingFetcher {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SourceFetcher for CountingFetcher {
    fn fetch(
        &self,
        _source: &SourceEntry,
        dest: &Path,
        _strip_root: bool,
    ) -> Result<(), AcquisitionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        fs::create_dir_all(dest)?;
        Ok(())
    }
}
