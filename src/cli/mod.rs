// src/cli/mod.rs
//! CLI definitions for uring-kitchen
//!
//! This module contains the command-line interface definitions using clap.
//! The command implementations are in the `commands` module.
//!
//! - `cook` - Full pipeline: validate, acquire, patch, build, package
//! - `fetch` - Acquire and patch sources only
//! - `options` - Show the resolved option set without doing any work
//! - `validate` - Lint a recipe and check a target platform
//! - `info` - Package identity and linkage metadata
//! - `taste` - Smoke-test a packaged tree

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "uring-kitchen")]
#[command(version)]
#[command(about = "Build and package liburing from source", long_about = None)]
pub struct Cli {
    /// Kitchen configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which recipe and which version of it
#[derive(Args, Debug, Clone, Default)]
pub struct RecipeArgs {
    /// Recipe file (default: the bundled liburing recipe)
    #[arg(long, value_name = "FILE")]
    pub recipe: Option<PathBuf>,

    /// Version to build (default: the recipe's version)
    #[arg(long = "pkg-version", value_name = "VERSION")]
    pub version: Option<String>,
}

/// Target settings and option assignments
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Target operating system (default: host)
    #[arg(long)]
    pub os: Option<String>,

    /// Target architecture (default: host)
    #[arg(long)]
    pub arch: Option<String>,

    /// Build type: Release, Debug, RelWithDebInfo, MinSizeRel
    #[arg(long, default_value = "Release")]
    pub build_type: String,

    /// Option assignment, e.g. `-o shared=True` (repeatable)
    #[arg(short = 'o', long = "option", value_name = "NAME=VALUE")]
    pub options: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Cook a package: validate, fetch, patch, build and package
    Cook {
        #[command(flatten)]
        recipe: RecipeArgs,

        #[command(flatten)]
        target: TargetArgs,

        /// Build root (overrides the config file)
        #[arg(long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Run the tasting harness after packaging
        #[arg(long)]
        taste: bool,
    },

    /// Fetch and patch sources without building
    Fetch {
        #[command(flatten)]
        recipe: RecipeArgs,

        #[command(flatten)]
        target: TargetArgs,

        /// Directory to extract into (default: the plan's source directory)
        #[arg(long, value_name = "DIR")]
        dest: Option<PathBuf>,
    },

    /// Show resolved options, configure arguments and package id
    Options {
        #[command(flatten)]
        recipe: RecipeArgs,

        #[command(flatten)]
        target: TargetArgs,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a recipe and a target platform
    Validate {
        #[command(flatten)]
        recipe: RecipeArgs,

        /// Target operating system to check (default: host)
        #[arg(long)]
        os: Option<String>,
    },

    /// Show package identity and linkage metadata
    Info {
        #[command(flatten)]
        recipe: RecipeArgs,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build and run the smoke test against a packaged tree
    Taste {
        /// Package directory produced by `cook`
        #[arg(long, value_name = "DIR")]
        package: PathBuf,

        #[command(flatten)]
        recipe: RecipeArgs,

        #[command(flatten)]
        target: TargetArgs,

        /// Scratch directory for the test binary (default: a temp dir)
        #[arg(long, value_name = "DIR")]
        work_dir: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_cook_with_options() {
        let cli = Cli::try_parse_from([
            "uring-kitchen",
            "cook",
            "-o",
            "shared=True",
            "--option",
            "with_libc=False",
            "--build-type",
            "Debug",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Cook { target, json, .. } => {
                assert_eq!(target.options, vec!["shared=True", "with_libc=False"]);
                assert_eq!(target.build_type, "Debug");
                assert!(json);
            }
            _ => panic!("expected cook"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["uring-kitchen", "info", "--config", "k.toml", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("k.toml")));
    }
}
