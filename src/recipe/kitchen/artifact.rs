// src/recipe/kitchen/artifact.rs

//! The installed package tree and the linkage metadata consumers need

use crate::error::PackageError;
use crate::recipe::format::Recipe;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What the packager left in the package directory
///
/// All paths are relative to `root`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledArtifactTree {
    pub root: PathBuf,
    pub headers: Vec<PathBuf>,
    pub static_library: Option<PathBuf>,
    pub shared_libraries: Vec<PathBuf>,
    pub licenses: Vec<PathBuf>,
}

impl InstalledArtifactTree {
    /// Scan `root` for the artifacts of library `lib` (`uring` for `liburing`)
    ///
    /// A tree without any library for `lib` is an error.
    pub fn scan(root: &Path, lib: &str) -> Result<Self, PackageError> {
        let static_name = format!("lib{lib}.a");
        let shared_prefix = format!("lib{lib}.so");

        let mut tree = Self {
            root: root.to_path_buf(),
            headers: Vec::new(),
            static_library: None,
            shared_libraries: Vec::new(),
            licenses: Vec::new(),
        };

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                PackageError::io(path, e.into())
            })?;
            if entry.file_type().is_dir() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let name = entry.file_name().to_string_lossy();

            if relative.starts_with("include") {
                if name.ends_with(".h") {
                    tree.headers.push(relative.to_path_buf());
                }
            } else if relative.starts_with("licenses") {
                tree.licenses.push(relative.to_path_buf());
            } else if relative.starts_with("lib") {
                if name == static_name {
                    tree.static_library = Some(relative.to_path_buf());
                } else if name.starts_with(&shared_prefix) {
                    tree.shared_libraries.push(relative.to_path_buf());
                }
            }
        }

        if tree.static_library.is_none() && tree.shared_libraries.is_empty() {
            return Err(PackageError::MissingArtifact {
                lib: lib.to_string(),
                dir: root.to_path_buf(),
            });
        }
        Ok(tree)
    }

    pub fn include_dir(&self) -> PathBuf {
        self.root.join("include")
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.root.join("lib")
    }
}

/// Linkage metadata exposed to downstream consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkageInfo {
    /// Names for `-l`
    pub libs: Vec<String>,
    /// pkg-config module name
    pub pkg_config: Option<String>,
    /// Minimum running kernel for the tasting harness
    pub min_kernel: Option<String>,
}

impl LinkageInfo {
    pub fn from_recipe(recipe: &Recipe) -> Self {
        Self {
            libs: recipe.package_info.libs.clone(),
            pkg_config: recipe.package_info.pkg_config.clone(),
            min_kernel: recipe.test.as_ref().and_then(|t| t.min_kernel.clone()),
        }
    }

    /// `-luring` style linker flags
    pub fn link_flags(&self) -> Vec<String> {
        self.libs.iter().map(|l| format!("-l{l}")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_scan_static_tree() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "include/liburing.h");
        touch(dir.path(), "include/liburing/io_uring.h");
        touch(dir.path(), "lib/liburing.a");
        touch(dir.path(), "licenses/COPYING");

        let tree = InstalledArtifactTree::scan(dir.path(), "uring").unwrap();
        assert_eq!(tree.headers.len(), 2);
        assert_eq!(tree.static_library, Some(PathBuf::from("lib/liburing.a")));
        assert!(tree.shared_libraries.is_empty());
        assert_eq!(tree.licenses, vec![PathBuf::from("licenses/COPYING")]);
    }

    #[test]
    fn test_scan_shared_tree() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "include/liburing.h");
        touch(dir.path(), "lib/liburing.so.2.4");
        touch(dir.path(), "lib/liburing-ffi.a");

        let tree = InstalledArtifactTree::scan(dir.path(), "uring").unwrap();
        assert_eq!(tree.static_library, None);
        assert_eq!(tree.shared_libraries, vec![PathBuf::from("lib/liburing.so.2.4")]);
    }

    #[test]
    fn test_scan_without_library_fails() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "include/liburing.h");
        assert!(matches!(
            InstalledArtifactTree::scan(dir.path(), "uring"),
            Err(PackageError::MissingArtifact { .. })
        ));
    }

    #[test]
    fn test_link_flags() {
        let linkage = LinkageInfo {
            libs: vec!["uring".to_string()],
            pkg_config: Some("liburing".to_string()),
            min_kernel: Some("5.1".to_string()),
        };
        assert_eq!(linkage.link_flags(), vec!["-luring"]);
    }
}
