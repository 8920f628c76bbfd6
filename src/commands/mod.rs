// src/commands/mod.rs
//! Command handlers for the uring-kitchen CLI

mod cook;
mod fetch;
mod info;
mod options;
mod taste;
mod validate;

pub use cook::cmd_cook;
pub use fetch::cmd_fetch;
pub use info::cmd_info;
pub use options::cmd_options;
pub use taste::cmd_taste;
pub use validate::cmd_validate;

use crate::cli::{RecipeArgs, TargetArgs};
use anyhow::{Context, Result};
use tracing::warn;
use uring_kitchen::recipe::{load_recipe, validate_recipe};
use uring_kitchen::{Arch, BuildType, CookPlan, OptionRequest, Platform, Recipe, Settings};

/// Load the requested recipe and log its lint warnings
///
/// Only in-memory checks run here; patch files are looked for once a plan
/// exists (see [`warn_missing_patches`]).
fn open_recipe(args: &RecipeArgs) -> Result<Recipe> {
    let recipe = load_recipe(args.recipe.as_deref()).with_context(|| match &args.recipe {
        Some(path) => format!("Failed to load recipe: {}", path.display()),
        None => "Failed to load the bundled recipe".to_string(),
    })?;

    let warnings = validate_recipe(&recipe).context("Recipe validation failed")?;
    for warning in &warnings {
        warn!("Recipe: {}", warning);
    }
    Ok(recipe)
}

/// Target settings from the command line, host values where omitted
fn target_settings(args: &TargetArgs) -> Result<Settings> {
    let host = Settings::host();
    let os = match &args.os {
        Some(os) => os.parse::<Platform>()?,
        None => host.os,
    };
    let arch = match &args.arch {
        Some(arch) => arch.parse::<Arch>()?,
        None => host.arch,
    };
    let build_type = args.build_type.parse::<BuildType>()?;
    Ok(Settings {
        os,
        arch,
        build_type,
    })
}

fn option_request(args: &TargetArgs) -> Result<OptionRequest> {
    Ok(OptionRequest::parse_assignments(&args.options)?)
}

/// Log patches of the planned version that are missing on disk
fn warn_missing_patches(plan: &CookPlan) {
    for patch in plan.missing_patches() {
        warn!("Patch #{} not found: {}", patch.index, patch.path.display());
    }
}
