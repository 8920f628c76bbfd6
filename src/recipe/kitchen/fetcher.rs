// src/recipe/kitchen/fetcher.rs

//! Source acquisition: download, verify, cache and extract

use crate::error::AcquisitionError;
use crate::hash::Checksum;
use crate::recipe::format::SourceEntry;
use crate::recipe::kitchen::archive::extract_archive;
use crate::recipe::kitchen::config::KitchenConfig;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Fetches a source descriptor into a directory
///
/// `dest` must be missing or empty; a non-empty directory is refused with
/// [`AcquisitionError::DestinationNotEmpty`] and left untouched.
pub trait SourceFetcher: Send + Sync {
    fn fetch(&self, source: &SourceEntry, dest: &Path, strip_root: bool)
    -> Result<(), AcquisitionError>;
}

/// Fetcher for `http(s)://`, `file://` and local-path sources
pub struct HttpFetcher {
    client: Client,
    cache_dir: PathBuf,
    show_progress: bool,
}

impl HttpFetcher {
    pub fn new(config: &KitchenConfig) -> Result<Self, AcquisitionError> {
        let client = Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| io::Error::other(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            cache_dir: config.source_cache.clone(),
            show_progress: config.show_progress,
        })
    }

    /// Return the cached archive for `source`, downloading it if needed
    pub fn cached_archive(&self, source: &SourceEntry) -> Result<PathBuf, AcquisitionError> {
        let checksum = Checksum::parse(&source.checksum)
            .map_err(|e| AcquisitionError::InvalidChecksum(format!("{}: {}", source.checksum, e)))?;

        fs::create_dir_all(&self.cache_dir)?;
        let cached_path = self.cache_dir.join(checksum.cache_key());

        if cached_path.exists() {
            match checksum.verify_file(&cached_path)? {
                Ok(()) => {
                    debug!("Using cached source: {}", cached_path.display());
                    return Ok(cached_path);
                }
                Err(actual) => {
                    warn!(
                        "Cached source {} has digest {}, re-downloading",
                        cached_path.display(),
                        actual
                    );
                    fs::remove_file(&cached_path)?;
                }
            }
        }

        let temp_path = self.cache_dir.join(format!("{}.tmp", checksum.cache_key()));
        self.retrieve(&source.url, &temp_path)?;

        if let Err(actual) = checksum.verify_file(&temp_path)? {
            fs::remove_file(&temp_path)?;
            return Err(AcquisitionError::ChecksumMismatch {
                url: source.url.clone(),
                expected: checksum.to_string(),
                actual: actual.to_string(),
            });
        }

        fs::rename(&temp_path, &cached_path)?;
        Ok(cached_path)
    }

    fn retrieve(&self, url: &str, dest: &Path) -> Result<(), AcquisitionError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return self.download(url, dest);
        }

        let local = Path::new(url.strip_prefix("file://").unwrap_or(url));
        if !local.is_file() {
            return Err(AcquisitionError::Unreachable {
                url: url.to_string(),
                reason: "no such file".to_string(),
            });
        }
        debug!("Copying local source {}", local.display());
        fs::copy(local, dest)?;
        Ok(())
    }

    fn download(&self, url: &str, dest: &Path) -> Result<(), AcquisitionError> {
        info!("Downloading: {}", url);

        let unreachable = |e: &dyn std::fmt::Display| AcquisitionError::Unreachable {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self.client.get(url).send().map_err(|e| unreachable(&e))?;
        if !response.status().is_success() {
            return Err(AcquisitionError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let total_size = response.content_length().unwrap_or(0);
        let mut file = File::create(dest)?;

        let copied = if self.show_progress {
            let pb = create_progress_bar(total_size, url);
            let copied = io::copy(&mut pb.wrap_read(response), &mut file);
            pb.finish_and_clear();
            copied
        } else {
            let mut response = response;
            io::copy(&mut response, &mut file)
        };
        let downloaded = copied.map_err(|e| unreachable(&e))?;

        info!("Downloaded {} bytes", downloaded);
        Ok(())
    }
}

impl SourceFetcher for HttpFetcher {
    fn fetch(
        &self,
        source: &SourceEntry,
        dest: &Path,
        strip_root: bool,
    ) -> Result<(), AcquisitionError> {
        if dest.exists() && fs::read_dir(dest)?.next().is_some() {
            return Err(AcquisitionError::DestinationNotEmpty(dest.to_path_buf()));
        }
        let archive = self.cached_archive(source)?;
        fs::create_dir_all(dest)?;

        extract_archive(&archive, source.archive_filename(), dest, strip_root)
    }
}

/// Create a styled progress bar for source downloads
fn create_progress_bar(size: u64, url: &str) -> ProgressBar {
    let name = url.rsplit('/').next().unwrap_or(url);
    let pb = if size > 0 {
        ProgressBar::new(size)
    } else {
        ProgressBar::new_spinner()
    };
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}",
    ) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(name.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{HashAlgorithm, hash_bytes};

    fn fetcher(root: &Path) -> HttpFetcher {
        HttpFetcher::new(&KitchenConfig::rooted_at(root)).unwrap()
    }

    fn tarball(path: &Path) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        let data = b"int main(void) { return 0; }\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "liburing-liburing-2.4/src/setup.c", &data[..])
            .unwrap();
        let bytes = builder.into_inner().unwrap();
        fs::write(path, &bytes).unwrap();
        bytes
    }

    #[test]
    fn test_fetch_local_tar_strips_root() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("liburing-2.4.tar");
        let bytes = tarball(&archive);
        let source = SourceEntry {
            url: format!("file://{}", archive.display()),
            checksum: hash_bytes(HashAlgorithm::Sha256, &bytes).to_string(),
        };

        let dest = dir.path().join("src");
        fetcher(dir.path()).fetch(&source, &dest, true).unwrap();
        assert!(dest.join("src/setup.c").exists());
        assert!(!dest.join("liburing-liburing-2.4").exists());
    }

    #[test]
    fn test_fetch_refuses_non_empty_destination() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("liburing-2.4.tar");
        let bytes = tarball(&archive);
        let source = SourceEntry {
            url: format!("file://{}", archive.display()),
            checksum: hash_bytes(HashAlgorithm::Sha256, &bytes).to_string(),
        };

        let dest = dir.path().join("project");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("notes.txt"), b"keep me").unwrap();

        let err = fetcher(dir.path()).fetch(&source, &dest, true).unwrap_err();
        assert!(matches!(err, AcquisitionError::DestinationNotEmpty(_)));
        assert_eq!(fs::read(dest.join("notes.txt")).unwrap(), b"keep me");
        assert!(!dest.join("src").exists());
    }

    #[test]
    fn test_fetch_checksum_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("liburing-2.4.tar");
        tarball(&archive);
        let source = SourceEntry {
            url: archive.display().to_string(),
            checksum: format!("sha256:{}", "0".repeat(64)),
        };

        let err = fetcher(dir.path())
            .fetch(&source, &dir.path().join("src"), true)
            .unwrap_err();
        assert!(matches!(err, AcquisitionError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_fetch_missing_local_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = SourceEntry {
            url: "file:///nonexistent/liburing-2.4.tar.gz".to_string(),
            checksum: format!("sha256:{}", "0".repeat(64)),
        };
        let err = fetcher(dir.path())
            .fetch(&source, &dir.path().join("src"), true)
            .unwrap_err();
        assert!(matches!(err, AcquisitionError::Unreachable { .. }));
    }

    #[test]
    fn test_corrupt_cache_entry_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("liburing-2.4.tar");
        let bytes = tarball(&archive);
        let checksum = hash_bytes(HashAlgorithm::Sha256, &bytes);
        let source = SourceEntry {
            url: archive.display().to_string(),
            checksum: checksum.to_string(),
        };

        let f = fetcher(dir.path());
        let cache_dir = dir.path().join("sources");
        fs::create_dir_all(&cache_dir).unwrap();
        fs::write(cache_dir.join(checksum.cache_key()), b"garbage").unwrap();

        let cached = f.cached_archive(&source).unwrap();
        assert_eq!(fs::read(cached).unwrap(), bytes);
    }
}
