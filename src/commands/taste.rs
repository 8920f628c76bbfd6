// src/commands/taste.rs

//! Taste command - smoke-test a packaged tree

use super::cook::print_outcome;
use super::{open_recipe, target_settings};
use crate::cli::{RecipeArgs, TargetArgs};
use anyhow::{Context, Result};
use std::path::Path;
use uring_kitchen::tasting::{NativeHost, Taster};
use uring_kitchen::{KitchenConfig, LinkageInfo};

pub fn cmd_taste(
    config: &KitchenConfig,
    package: &Path,
    recipe_args: &RecipeArgs,
    target: &TargetArgs,
    work_dir: Option<&Path>,
) -> Result<()> {
    let recipe = open_recipe(recipe_args)?;
    let settings = target_settings(target)?;
    let linkage = LinkageInfo::from_recipe(&recipe);

    // Keep the scratch dir alive until tasting is done
    let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;
    let work_dir = work_dir.unwrap_or(scratch.path());

    println!("Tasting {} in {}...", recipe.package.name, package.display());
    let host = NativeHost;
    let outcome = Taster::new(&host, config.compiler())
        .taste(
            package,
            &linkage,
            &settings,
            recipe.test_source().as_deref(),
            work_dir,
        )
        .with_context(|| format!("Tasting {} failed", package.display()))?;

    print_outcome(&outcome);
    Ok(())
}
