// src/lib.rs

//! uring-kitchen: a build orchestrator for liburing
//!
//! Turns a declared package version, option set and target platform into a
//! validated, installed artifact tree.
//!
//! # Architecture
//!
//! - Fail-fast pipeline: validate platform, acquire source, patch,
//!   configure and build, install and trim
//! - Pure planning: platform validation and option resolution happen
//!   before any network or disk access
//! - Explicit option set: unavailable options are absent, not deleted later
//! - One build directory per (version, settings, options) package id
//! - Tasting: a kernel-gated smoke test against the packaged tree

mod error;
pub mod hash;
pub mod platform;
pub mod recipe;
pub mod tasting;
pub mod version;

pub use error::{
    AcquisitionError, BuildError, ConfigurationError, Error, PackageError, PatchError,
    RecipeError, Result, TasteError,
};
pub use hash::{Checksum, HashAlgorithm, Hasher};
pub use platform::{Arch, BuildType, Platform, Settings};
pub use recipe::{
    CookPlan, CookResult, InstalledArtifactTree, Kitchen, KitchenConfig, LinkageInfo,
    OptionRequest, OptionSet, Recipe,
};
pub use tasting::{NativeHost, TasteOutcome, Taster, TastingHost};
pub use version::PackageVersion;
