// src/commands/validate.rs

//! Validate command - lint a recipe and check a target platform

use super::open_recipe;
use crate::cli::RecipeArgs;
use anyhow::{Context, Result};
use tracing::warn;
use uring_kitchen::platform::{self, Platform};
use uring_kitchen::recipe::patch_file_warnings;

pub fn cmd_validate(recipe_args: &RecipeArgs, os: Option<&str>) -> Result<()> {
    let recipe = open_recipe(recipe_args)?;

    if let Some(version) = &recipe_args.version {
        recipe.source_for(version)?;
    }

    let target = match os {
        Some(os) => os.parse::<Platform>()?,
        None => Platform::host().unwrap_or(Platform::Linux),
    };
    platform::validate(&recipe.package.name, recipe.platform.supported, target)
        .with_context(|| format!("Target {} rejected", target))?;

    for warning in patch_file_warnings(&recipe) {
        warn!("Recipe: {}", warning);
    }

    println!("Recipe validation passed");
    println!(
        "[OK] {} {} can be cooked for {}",
        recipe.package.name, recipe.package.version, target
    );
    println!("  Versions: {}", recipe.versions().join(", "));
    Ok(())
}
