// src/recipe/kitchen/archive.rs

//! Archive extraction and patch application for the Kitchen

use crate::error::{AcquisitionError, PatchError};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use xz2::read::XzDecoder;

/// Compression wrapped around a tarball
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    TarXz,
    TarZst,
    Tar,
}

impl ArchiveKind {
    /// Detect the format from a file name
    pub fn detect(filename: &str) -> Result<Self, AcquisitionError> {
        if filename.ends_with(".tar.gz") || filename.ends_with(".tgz") {
            Ok(Self::TarGz)
        } else if filename.ends_with(".tar.xz") || filename.ends_with(".txz") {
            Ok(Self::TarXz)
        } else if filename.ends_with(".tar.zst") {
            Ok(Self::TarZst)
        } else if filename.ends_with(".tar") {
            Ok(Self::Tar)
        } else {
            Err(AcquisitionError::UnsupportedArchive(filename.to_string()))
        }
    }
}

/// Extract `archive` into `dest`
///
/// `name` is the file name used for format detection; downloaded archives
/// sit in the cache under their checksum, not their upstream name.
///
/// With `strip_root`, an archive whose only top-level entry is a directory
/// has that directory's contents hoisted into `dest`, so paths do not depend
/// on how upstream named the wrapper (`liburing-liburing-2.4/`).
pub fn extract_archive(
    archive: &Path,
    name: &str,
    dest: &Path,
    strip_root: bool,
) -> Result<(), AcquisitionError> {
    let kind = ArchiveKind::detect(name)?;
    let file = File::open(archive)?;

    let reader: Box<dyn Read> = match kind {
        ArchiveKind::TarGz => Box::new(GzDecoder::new(file)),
        ArchiveKind::TarXz => Box::new(XzDecoder::new(file)),
        ArchiveKind::TarZst => Box::new(zstd::Decoder::new(file)?),
        ArchiveKind::Tar => Box::new(file),
    };

    fs::create_dir_all(dest)?;
    let staging = tempfile::Builder::new()
        .prefix(".extract-")
        .tempdir_in(dest)?;

    tar::Archive::new(reader)
        .unpack(staging.path())
        .map_err(|e| AcquisitionError::Extraction {
            archive: archive.to_path_buf(),
            reason: e.to_string(),
        })?;

    let root = if strip_root {
        single_root_dir(staging.path())?.unwrap_or_else(|| {
            debug!("Archive has no single wrapper directory, extracting as-is");
            staging.path().to_path_buf()
        })
    } else {
        staging.path().to_path_buf()
    };

    for entry in fs::read_dir(&root)? {
        let entry = entry?;
        fs::rename(entry.path(), dest.join(entry.file_name()))?;
    }

    debug!("Extracted {} into {}", archive.display(), dest.display());
    Ok(())
}

/// The only entry of `dir`, if there is exactly one and it is a directory
fn single_root_dir(dir: &Path) -> std::io::Result<Option<PathBuf>> {
    let entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    if entries.len() == 1 && entries[0].file_type()?.is_dir() {
        Ok(Some(entries[0].path()))
    } else {
        Ok(None)
    }
}

/// One file's worth of a unified diff
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileDiff {
    /// `None` for `/dev/null` (file creation)
    old_path: Option<String>,
    /// `None` for `/dev/null` (file deletion)
    new_path: Option<String>,
    /// Hunks only, starting at the first `@@` line
    hunks: String,
}

fn header_path(line: &str, prefix: &str) -> Option<String> {
    let rest = line.strip_prefix(prefix)?;
    let path = rest.split('\t').next().unwrap_or(rest).trim();
    if path == "/dev/null" {
        None
    } else {
        Some(path.to_string())
    }
}

/// Line counts from `@@ -a,b +c,d @@`
fn hunk_counts(line: &str) -> Option<(usize, usize)> {
    let mut parts = line.split_whitespace();
    if parts.next()? != "@@" {
        return None;
    }
    let count = |range: &str| -> Option<usize> {
        let range = range.strip_prefix(['-', '+'])?;
        match range.split_once(',') {
            Some((_, n)) => n.parse().ok(),
            None => Some(1),
        }
    };
    let old = count(parts.next()?)?;
    let new = count(parts.next()?)?;
    Some((old, new))
}

/// Split a (possibly multi-file, git-style) unified diff into per-file diffs
///
/// Hunk line counts are tracked so that a removed line beginning with `--`
/// is never mistaken for a new file header, and trailing text such as a
/// `format-patch` signature is ignored.
fn split_patch(text: &str) -> Result<Vec<FileDiff>, String> {
    let lines: Vec<&str> = text.lines().collect();
    let mut diffs = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let is_header = lines[i].starts_with("--- ")
            && lines.get(i + 1).is_some_and(|l| l.starts_with("+++ "));
        if !is_header {
            i += 1;
            continue;
        }

        let old_path = header_path(lines[i], "--- ");
        let new_path = header_path(lines[i + 1], "+++ ");
        if old_path.is_none() && new_path.is_none() {
            return Err(format!("line {}: both sides are /dev/null", i + 1));
        }
        i += 2;

        let mut hunks = String::new();
        while i < lines.len() {
            let Some((mut old_left, mut new_left)) = hunk_counts(lines[i]) else {
                break;
            };
            hunks.push_str(lines[i]);
            hunks.push('\n');
            i += 1;

            while (old_left > 0 || new_left > 0) && i < lines.len() {
                let line = lines[i];
                match line.chars().next() {
                    Some('-') => old_left = old_left.saturating_sub(1),
                    Some('+') => new_left = new_left.saturating_sub(1),
                    Some('\\') => {}
                    _ => {
                        old_left = old_left.saturating_sub(1);
                        new_left = new_left.saturating_sub(1);
                    }
                }
                hunks.push_str(line);
                hunks.push('\n');
                i += 1;
            }
            if lines.get(i).is_some_and(|l| l.starts_with('\\')) {
                hunks.push_str(lines[i]);
                hunks.push('\n');
                i += 1;
            }
        }

        if hunks.is_empty() {
            return Err(format!(
                "no hunks for {}",
                new_path.as_deref().or(old_path.as_deref()).unwrap_or("?")
            ));
        }
        diffs.push(FileDiff {
            old_path,
            new_path,
            hunks,
        });
    }

    if diffs.is_empty() {
        return Err("no file headers found".to_string());
    }
    Ok(diffs)
}

fn strip_components(path: &str, strip: u32) -> Option<PathBuf> {
    let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
    let rest = components.get(strip as usize..)?;
    if rest.is_empty() || rest.iter().any(|c| *c == "..") {
        return None;
    }
    Some(rest.iter().collect())
}

/// Apply one patch file to `dir`
///
/// `index` and `label` identify the patch in errors. Files are rewritten one
/// at a time, so a failure part-way through leaves earlier files patched.
pub fn apply_patch(
    index: usize,
    label: &str,
    patch_path: &Path,
    dir: &Path,
    strip: u32,
) -> Result<usize, PatchError> {
    let io_err = |source| PatchError::Io {
        index,
        file: label.to_string(),
        source,
    };
    let malformed = |reason: String| PatchError::Malformed {
        index,
        file: label.to_string(),
        reason,
    };

    if !patch_path.exists() {
        return Err(PatchError::Missing {
            index,
            file: label.to_string(),
        });
    }
    let text = fs::read_to_string(patch_path).map_err(io_err)?;
    let diffs = split_patch(&text).map_err(malformed)?;

    for diff in &diffs {
        let raw = diff
            .new_path
            .as_deref()
            .or(diff.old_path.as_deref())
            .unwrap_or_default();
        let relative = strip_components(raw, strip)
            .ok_or_else(|| malformed(format!("cannot strip {strip} components from {raw}")))?;
        let target = dir.join(&relative);
        let rejected = |reason: String| PatchError::Rejected {
            index,
            file: label.to_string(),
            target: relative.display().to_string(),
            reason,
        };

        let normalized = format!("--- original\n+++ modified\n{}", diff.hunks);
        let parsed = diffy::Patch::from_str(&normalized).map_err(|e| malformed(e.to_string()))?;

        let original = match &diff.old_path {
            None => String::new(),
            Some(old) => {
                let old_rel = strip_components(old, strip)
                    .ok_or_else(|| malformed(format!("cannot strip {strip} components from {old}")))?;
                fs::read_to_string(dir.join(old_rel))
                    .map_err(|e| rejected(format!("cannot read original: {e}")))?
            }
        };

        let patched = diffy::apply(&original, &parsed).map_err(|e| rejected(e.to_string()))?;

        if diff.new_path.is_none() {
            if !patched.is_empty() {
                return Err(rejected("deletion leaves content behind".to_string()));
            }
            fs::remove_file(&target).map_err(io_err)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(&target, patched).map_err(io_err)?;

        if let Some(old) = &diff.old_path
            && let Some(old_rel) = strip_components(old, strip)
            && old_rel != relative
        {
            fs::remove_file(dir.join(old_rel)).map_err(io_err)?;
        }
    }

    Ok(diffs.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_FILE_PATCH: &str = "\
From 1234 Mon Sep 17 00:00:00 2001
Subject: [PATCH] fix build

diff --git a/src/setup.c b/src/setup.c
--- a/src/setup.c
+++ b/src/setup.c
@@ -1,3 +1,3 @@
 int setup(void)
-{ return 0; }
+{ return 1; }
 /* end */
diff --git a/src/new.h b/src/new.h
new file mode 100644
--- /dev/null
+++ b/src/new.h
@@ -0,0 +1 @@
+#define NEW 1
--
2.39.0
";

    #[test]
    fn test_archive_kind_detection() {
        assert_eq!(ArchiveKind::detect("x-2.4.tar.gz").unwrap(), ArchiveKind::TarGz);
        assert_eq!(ArchiveKind::detect("x.tgz").unwrap(), ArchiveKind::TarGz);
        assert_eq!(ArchiveKind::detect("x.tar.xz").unwrap(), ArchiveKind::TarXz);
        assert_eq!(ArchiveKind::detect("x.tar.zst").unwrap(), ArchiveKind::TarZst);
        assert_eq!(ArchiveKind::detect("x.tar").unwrap(), ArchiveKind::Tar);
        assert!(matches!(
            ArchiveKind::detect("x.zip"),
            Err(AcquisitionError::UnsupportedArchive(_))
        ));
    }

    #[test]
    fn test_split_patch_ignores_preamble_and_signature() {
        let diffs = split_patch(TWO_FILE_PATCH).unwrap();
        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0].old_path.as_deref(), Some("a/src/setup.c"));
        assert_eq!(diffs[1].old_path, None);
        assert_eq!(diffs[1].new_path.as_deref(), Some("b/src/new.h"));
        assert!(!diffs[1].hunks.contains("2.39.0"));
    }

    #[test]
    fn test_split_patch_rejects_garbage() {
        assert!(split_patch("not a patch\n").is_err());
    }

    #[test]
    fn test_hunk_counts() {
        assert_eq!(hunk_counts("@@ -1,3 +1,4 @@ fn"), Some((3, 4)));
        assert_eq!(hunk_counts("@@ -0,0 +1 @@"), Some((0, 1)));
        assert_eq!(hunk_counts(" context"), None);
        assert_eq!(hunk_counts("@@ é1,1 +1,1 @@"), None);
        assert_eq!(hunk_counts("@@ 1,1 +1,1 @@"), None);
    }

    #[test]
    fn test_non_ascii_hunk_header_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("setup.c"), "int x;\n").unwrap();
        let patch = dir.path().join("0001-bad.patch");
        fs::write(
            &patch,
            "--- a/setup.c\n+++ b/setup.c\n@@ é1,1 +1,1 @@\n-int x;\n+int y;\n",
        )
        .unwrap();

        let err = apply_patch(1, "0001-bad.patch", &patch, dir.path(), 1).unwrap_err();
        assert!(matches!(err, PatchError::Malformed { index: 1, .. }));
        assert_eq!(fs::read_to_string(dir.path().join("setup.c")).unwrap(), "int x;\n");
    }

    #[test]
    fn test_strip_components() {
        assert_eq!(strip_components("a/src/x.c", 1), Some(PathBuf::from("src/x.c")));
        assert_eq!(strip_components("src/x.c", 0), Some(PathBuf::from("src/x.c")));
        assert_eq!(strip_components("a/x.c", 2), None);
        assert_eq!(strip_components("a/../x.c", 1), None);
    }

    #[test]
    fn test_apply_multi_file_patch() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("src/setup.c"),
            "int setup(void)\n{ return 0; }\n/* end */\n",
        )
        .unwrap();
        let patch = dir.path().join("0001.patch");
        fs::write(&patch, TWO_FILE_PATCH).unwrap();

        let touched = apply_patch(1, "0001.patch", &patch, dir.path(), 1).unwrap();
        assert_eq!(touched, 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("src/setup.c")).unwrap(),
            "int setup(void)\n{ return 1; }\n/* end */\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("src/new.h")).unwrap(),
            "#define NEW 1\n"
        );
    }

    #[test]
    fn test_apply_rejects_mismatched_context() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/setup.c"), "something else entirely\n").unwrap();
        let patch = dir.path().join("0001.patch");
        fs::write(&patch, TWO_FILE_PATCH).unwrap();

        let err = apply_patch(3, "0001.patch", &patch, dir.path(), 1).unwrap_err();
        assert!(matches!(err, PatchError::Rejected { index: 3, .. }));
    }

    #[test]
    fn test_apply_missing_patch_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = apply_patch(1, "gone.patch", &dir.path().join("gone.patch"), dir.path(), 1)
            .unwrap_err();
        assert!(matches!(err, PatchError::Missing { .. }));
    }
}
