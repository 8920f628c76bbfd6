// src/commands/cook.rs

//! Cook command - build liburing from its recipe

use super::{open_recipe, option_request, target_settings, warn_missing_patches};
use crate::cli::{RecipeArgs, TargetArgs};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;
use uring_kitchen::tasting::{NativeHost, SkipReason, TasteOutcome, Taster};
use uring_kitchen::{Kitchen, KitchenConfig};

/// Cook a package from a recipe
///
/// # Arguments
/// * `config` - Kitchen configuration
/// * `recipe_args` - Recipe file and version
/// * `target` - Target settings and option assignments
/// * `output` - Build root override
/// * `json` - Print the result as JSON instead of text
/// * `taste` - Run the tasting harness on the result
pub fn cmd_cook(
    config: KitchenConfig,
    recipe_args: &RecipeArgs,
    target: &TargetArgs,
    output: Option<&Path>,
    json: bool,
    taste: bool,
) -> Result<()> {
    let recipe = open_recipe(recipe_args)?;
    let settings = target_settings(target)?;
    let request = option_request(target)?;

    let mut config = config;
    if let Some(dir) = output {
        config.build_root = dir.to_path_buf();
    }

    let kitchen = Kitchen::new(config).context("Failed to set up the kitchen")?;
    let plan = kitchen
        .plan(&recipe, recipe_args.version.as_deref(), settings, &request)
        .with_context(|| format!("Cannot cook {}", recipe.package.name))?;
    warn_missing_patches(&plan);

    if !json {
        println!(
            "Recipe: {} version {} ({} {} {})",
            plan.spec.name, plan.spec.version, settings.os, settings.arch, settings.build_type
        );
        println!("Options: {}", plan.options);
        println!(
            "Cooking with {} parallel jobs in {}...",
            kitchen.config().jobs,
            plan.build_dir.display()
        );
    }

    let result = kitchen
        .cook(&plan)
        .with_context(|| format!("Failed to cook {}", plan.spec.name))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("\n[COMPLETE] Cooked: {}", result.package_dir.display());
        println!("  Package id: {}", result.package_id);
        if let Some(lib) = &result.tree.static_library {
            println!("  Static library: {}", lib.display());
        }
        for lib in &result.tree.shared_libraries {
            println!("  Shared library: {}", lib.display());
        }
        println!("  Headers: {}", result.tree.headers.len());
        println!("  Link with: {}", result.linkage.link_flags().join(" "));

        if !result.warnings.is_empty() {
            println!("\nBuild warnings:");
            for warning in &result.warnings {
                println!("  - {}", warning);
            }
        }
    }

    if taste {
        let work_dir = plan.build_dir.join("taste");
        let host = NativeHost;
        let outcome = Taster::new(&host, kitchen.config().compiler())
            .taste(
                &result.package_dir,
                &result.linkage,
                &settings,
                recipe.test_source().as_deref(),
                &work_dir,
            )
            .context("Tasting failed")?;
        print_outcome(&outcome);
    }

    info!(
        "Successfully cooked {} to {}",
        result.spec.name,
        result.package_dir.display()
    );
    Ok(())
}

pub(super) fn print_outcome(outcome: &TasteOutcome) {
    match outcome {
        TasteOutcome::Passed { stdout, .. } => {
            println!("[OK] Tasting passed");
            for line in stdout.lines() {
                println!("  {}", line);
            }
        }
        TasteOutcome::Skipped(SkipReason::CrossBuild) => {
            println!("[SKIPPED] Cross build, test binary not run");
        }
        TasteOutcome::Skipped(SkipReason::KernelTooOld { running, required }) => {
            println!(
                "[SKIPPED] Running kernel {} is older than required {}",
                running, required
            );
        }
    }
}
