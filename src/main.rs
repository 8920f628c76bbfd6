// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use uring_kitchen::KitchenConfig;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber for logging; keep stdout for results
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli) {
        eprintln!("[{}] {:#}", error_kind(&err), err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = KitchenConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load kitchen configuration")?;

    match cli.command {
        Commands::Cook {
            recipe,
            target,
            output,
            json,
            taste,
        } => commands::cmd_cook(config, &recipe, &target, output.as_deref(), json, taste),
        Commands::Fetch {
            recipe,
            target,
            dest,
        } => commands::cmd_fetch(config, &recipe, &target, dest.as_deref()),
        Commands::Options {
            recipe,
            target,
            json,
        } => commands::cmd_options(config, &recipe, &target, json),
        Commands::Validate { recipe, os } => commands::cmd_validate(&recipe, os.as_deref()),
        Commands::Info { recipe, json } => commands::cmd_info(&recipe, json),
        Commands::Taste {
            package,
            recipe,
            target,
            work_dir,
        } => commands::cmd_taste(&config, &package, &recipe, &target, work_dir.as_deref()),
    }
}

/// Name of the pipeline stage that failed, for the error banner
fn error_kind(err: &anyhow::Error) -> &'static str {
    use uring_kitchen::{
        AcquisitionError, BuildError, ConfigurationError, Error, PackageError, PatchError,
        RecipeError, TasteError,
    };

    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<Error>() {
            return e.kind();
        }
        if cause.is::<ConfigurationError>() {
            return "ConfigurationError";
        }
        if cause.is::<AcquisitionError>() {
            return "AcquisitionError";
        }
        if cause.is::<PatchError>() {
            return "PatchError";
        }
        if cause.is::<BuildError>() {
            return "BuildError";
        }
        if cause.is::<PackageError>() {
            return "PackageError";
        }
        if cause.is::<RecipeError>() {
            return "RecipeError";
        }
        if cause.is::<TasteError>() {
            return "TasteError";
        }
    }
    "Error"
}
