// src/commands/fetch.rs

//! Fetch command - acquire and patch sources without building

use super::{open_recipe, option_request, target_settings, warn_missing_patches};
use crate::cli::{RecipeArgs, TargetArgs};
use anyhow::{Context, Result};
use std::path::Path;
use uring_kitchen::{Kitchen, KitchenConfig};

pub fn cmd_fetch(
    config: KitchenConfig,
    recipe_args: &RecipeArgs,
    target: &TargetArgs,
    dest: Option<&Path>,
) -> Result<()> {
    let recipe = open_recipe(recipe_args)?;
    let settings = target_settings(target)?;
    let request = option_request(target)?;

    let kitchen = Kitchen::new(config).context("Failed to set up the kitchen")?;
    let plan = kitchen
        .plan(&recipe, recipe_args.version.as_deref(), settings, &request)
        .with_context(|| format!("Cannot fetch {}", recipe.package.name))?;
    warn_missing_patches(&plan);

    let dest = dest.map(Path::to_path_buf).unwrap_or_else(|| plan.source_dir());
    println!("Fetching {} {} into {}...", plan.spec.name, plan.spec.version, dest.display());

    let applied = kitchen
        .fetch(&plan, &dest)
        .with_context(|| format!("Failed to fetch sources for {}", plan.spec.name))?;

    println!("\n[COMPLETE] Source tree ready: {}", dest.display());
    if applied > 0 {
        println!("  Applied {} patch(es)", applied);
    }
    Ok(())
}
