// src/error.rs

//! Error types for the cooking pipeline
//!
//! Every pipeline stage owns its error enum so callers can tell a rejected
//! platform from a bad checksum from a failing `make`. The crate-level
//! [`Error`] wraps them and reports which stage failed through [`Error::kind`].
//! None of these errors are retried; every stage stops the pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Invalid platform, version or option combination (raised before any I/O)
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("{package} is supported only on {supported} (requested: {requested})")]
    UnsupportedPlatform {
        package: String,
        supported: String,
        requested: String,
    },

    #[error("unknown platform '{0}'")]
    UnknownPlatform(String),

    #[error("unknown architecture '{0}'")]
    UnknownArch(String),

    #[error("unknown build type '{0}'")]
    UnknownBuildType(String),

    #[error("unknown option '{0}' (available: fPIC, shared, with_libc)")]
    UnknownOption(String),

    #[error("invalid value '{value}' for option '{name}' (expected true or false)")]
    InvalidOptionValue { name: String, value: String },

    #[error("malformed option assignment '{0}' (expected NAME=VALUE)")]
    MalformedAssignment(String),

    #[error("no source declared for {package} version {version} (known: {known})")]
    UnknownVersion {
        package: String,
        version: String,
        known: String,
    },

    #[error("invalid version '{0}'")]
    InvalidVersion(String),
}

/// Failure while downloading, verifying or extracting the source archive
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("source unreachable: {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("HTTP {status} while fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("invalid checksum '{0}'")]
    InvalidChecksum(String),

    #[error("unsupported archive format: {0}")]
    UnsupportedArchive(String),

    #[error("failed to extract {archive}: {reason}")]
    Extraction { archive: PathBuf, reason: String },

    #[error("destination {0} is not empty")]
    DestinationNotEmpty(PathBuf),

    #[error("I/O error during acquisition: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while applying the versioned patch list
///
/// Every variant carries the 1-based position and file of the patch that
/// stopped the sequence.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("patch #{index} ({file}) not found")]
    Missing { index: usize, file: String },

    #[error("patch #{index} ({file}) is malformed: {reason}")]
    Malformed {
        index: usize,
        file: String,
        reason: String,
    },

    #[error("patch #{index} ({file}) does not apply to {target}: {reason}")]
    Rejected {
        index: usize,
        file: String,
        target: String,
        reason: String,
    },

    #[error("patch #{index} ({file}): I/O error: {source}")]
    Io {
        index: usize,
        file: String,
        #[source]
        source: std::io::Error,
    },
}

impl PatchError {
    /// Position (1-based) of the failing patch in the version's patch list
    pub fn index(&self) -> usize {
        match self {
            Self::Missing { index, .. }
            | Self::Malformed { index, .. }
            | Self::Rejected { index, .. }
            | Self::Io { index, .. } => *index,
        }
    }
}

/// Failure of the external build toolchain
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{tool} not found in PATH")]
    ToolNotFound { tool: String },

    #[error("failed to run {phase} phase: {source}")]
    Spawn {
        phase: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{phase} phase failed with exit code {code:?}\nstderr: {stderr}")]
    Failed {
        phase: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("work directory {0} does not exist")]
    MissingWorkDir(PathBuf),
}

/// Failure while installing into or trimming the package directory
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("install step failed: {0}")]
    Install(#[source] BuildError),

    #[error("configure step failed while packaging: {0}")]
    Configure(#[source] BuildError),

    #[error("no library named lib{lib} was installed under {dir}")]
    MissingArtifact { lib: String, dir: PathBuf },

    #[error("invalid license pattern '{0}'")]
    LicensePattern(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PackageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Recipe file could not be read or is inconsistent
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("failed to read recipe {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid recipe: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("recipe is invalid: {0}")]
    Invalid(String),
}

/// Failure of the tasting (smoke test) harness
#[derive(Debug, Error)]
pub enum TasteError {
    #[error("test source not found: {0}")]
    MissingSource(PathBuf),

    #[error("package tree {0} has no include/ or lib/ directory")]
    NotAPackage(PathBuf),

    #[error("failed to read running kernel release: {0}")]
    KernelRelease(String),

    #[error("compiling the test consumer failed: {0}")]
    Compile(#[source] BuildError),

    #[error("test binary exited with {code:?}\nstderr: {stderr}")]
    Run { code: Option<i32>, stderr: String },

    #[error("failed to launch test binary {path}: {source}")]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level error for a cook invocation
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("acquisition error: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error("patch error: {0}")]
    Patch(#[from] PatchError),

    #[error("build error: {0}")]
    Build(#[from] BuildError),

    #[error("package error: {0}")]
    Package(#[from] PackageError),

    #[error("recipe error: {0}")]
    Recipe(#[from] RecipeError),

    #[error("taste error: {0}")]
    Taste(#[from] TasteError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Short name of the failing stage, as shown to the user
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "ConfigurationError",
            Self::Acquisition(_) => "AcquisitionError",
            Self::Patch(_) => "PatchError",
            Self::Build(_) => "BuildError",
            Self::Package(_) => "PackageError",
            Self::Recipe(_) => "RecipeError",
            Self::Taste(_) => "TasteError",
            Self::Io(_) => "IoError",
            Self::Config(_) => "ConfigError",
        }
    }
}
