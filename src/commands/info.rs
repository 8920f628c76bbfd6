// src/commands/info.rs

//! Info command - package identity and linkage metadata

use super::open_recipe;
use crate::cli::RecipeArgs;
use anyhow::Result;
use serde_json::json;
use uring_kitchen::LinkageInfo;

pub fn cmd_info(recipe_args: &RecipeArgs, json_output: bool) -> Result<()> {
    let recipe = open_recipe(recipe_args)?;
    let version = recipe_args
        .version
        .clone()
        .unwrap_or_else(|| recipe.package.version.clone());
    let source = recipe.source_for(&version)?;
    let spec = recipe.package_spec(&version);
    let linkage = LinkageInfo::from_recipe(&recipe);

    if json_output {
        let value = json!({
            "package": spec,
            "linkage": linkage,
            "supported_platform": recipe.platform.supported,
            "versions": recipe.versions(),
            "source": source,
            "patches": recipe.patches_for(&version),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{} {}", spec.name, spec.version);
    if let Some(description) = &spec.description {
        println!("  {}", description);
    }
    if let Some(license) = &spec.license {
        println!("  License: {}", license);
    }
    if let Some(homepage) = &spec.homepage {
        println!("  Homepage: {}", homepage);
    }
    if !spec.topics.is_empty() {
        println!("  Topics: {}", spec.topics.join(", "));
    }
    println!("  Supported platform: {}", recipe.platform.supported);
    println!("  Versions: {}", recipe.versions().join(", "));
    println!("  Source: {}", source.url);
    println!("  Patches: {}", recipe.patches_for(&version).len());
    println!("  Link with: {}", linkage.link_flags().join(" "));
    if let Some(pc) = &linkage.pkg_config {
        println!("  pkg-config name: {}", pc);
    }
    if let Some(kernel) = &linkage.min_kernel {
        println!("  Tasting needs kernel >= {}", kernel);
    }
    Ok(())
}
