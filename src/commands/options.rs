// src/commands/options.rs

//! Options command - show what a cook would use, without doing it

use super::{open_recipe, option_request, target_settings};
use crate::cli::{RecipeArgs, TargetArgs};
use anyhow::Result;
use serde_json::json;
use uring_kitchen::{Kitchen, KitchenConfig};

pub fn cmd_options(
    config: KitchenConfig,
    recipe_args: &RecipeArgs,
    target: &TargetArgs,
    json_output: bool,
) -> Result<()> {
    let recipe = open_recipe(recipe_args)?;
    let settings = target_settings(target)?;
    let request = option_request(target)?;

    let kitchen = Kitchen::new(config)?;
    let plan = kitchen.plan(&recipe, recipe_args.version.as_deref(), settings, &request)?;
    let env = plan.environment();

    if json_output {
        let value = json!({
            "package": plan.spec.name,
            "version": plan.spec.version,
            "settings": plan.settings,
            "options": plan.options,
            "cflags": env.cflags,
            "configure_args": env.configure_args,
            "package_id": plan.package_id,
            "build_dir": plan.build_dir,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{} {}", plan.spec.name, plan.spec.version);
    println!(
        "  Settings: os={} arch={} build_type={}",
        settings.os, settings.arch, settings.build_type
    );
    println!("  Options:");
    for line in plan.options.canonical() {
        println!("    {}", line);
    }
    println!("  CFLAGS: {}", env.cflags_value());
    if env.configure_args.is_empty() {
        println!("  Configure args: (none)");
    } else {
        println!("  Configure args: {}", env.configure_args.join(" "));
    }
    println!("  Package id: {}", plan.package_id);
    println!("  Build dir: {}", plan.build_dir.display());
    Ok(())
}
