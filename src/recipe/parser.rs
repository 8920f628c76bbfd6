// src/recipe/parser.rs

//! Recipe file parsing

use crate::error::RecipeError;
use crate::hash::Checksum;
use crate::recipe::format::Recipe;
use crate::version::PackageVersion;
use std::path::Path;

/// The liburing recipe shipped with the binary
const BUNDLED_RECIPE: &str = include_str!("../../recipes/liburing.toml");

/// Parse a recipe from a TOML string
pub fn parse_recipe(content: &str) -> Result<Recipe, RecipeError> {
    Ok(toml::from_str(content)?)
}

/// Parse a recipe from a file, remembering its directory for patch lookup
pub fn parse_recipe_file(path: &Path) -> Result<Recipe, RecipeError> {
    let content = std::fs::read_to_string(path).map_err(|source| RecipeError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut recipe = parse_recipe(&content)?;
    recipe.recipe_dir = path.parent().map(Path::to_path_buf);
    Ok(recipe)
}

/// The bundled liburing recipe
///
/// Its patch and test-source paths resolve against the crate root, where
/// `recipes/` and `test_package/` live.
pub fn bundled_recipe() -> Result<Recipe, RecipeError> {
    let mut recipe = parse_recipe(BUNDLED_RECIPE)?;
    recipe.recipe_dir = Some(Path::new(env!("CARGO_MANIFEST_DIR")).to_path_buf());
    Ok(recipe)
}

/// Load a recipe from `path`, or the bundled one when no path is given
pub fn load_recipe(path: Option<&Path>) -> Result<Recipe, RecipeError> {
    match path {
        Some(p) => parse_recipe_file(p),
        None => bundled_recipe(),
    }
}

/// Validate a recipe for completeness and correctness
///
/// Hard errors come back as `Err`; things worth a look come back as warnings.
pub fn validate_recipe(recipe: &Recipe) -> Result<Vec<String>, RecipeError> {
    let mut warnings = Vec::new();

    if recipe.package.name.is_empty() {
        return Err(RecipeError::Invalid("package name cannot be empty".to_string()));
    }
    if recipe.package_info.libs.is_empty() {
        return Err(RecipeError::Invalid(
            "package_info.libs must name at least one library".to_string(),
        ));
    }
    if recipe.sources.is_empty() {
        return Err(RecipeError::Invalid("no [sources] declared".to_string()));
    }
    if !recipe.sources.contains_key(&recipe.package.version) {
        return Err(RecipeError::Invalid(format!(
            "default version {} has no source entry",
            recipe.package.version
        )));
    }

    for (version, source) in &recipe.sources {
        PackageVersion::parse(version)
            .map_err(|e| RecipeError::Invalid(format!("source key: {e}")))?;
        Checksum::parse(&source.checksum).map_err(|e| {
            RecipeError::Invalid(format!("checksum for version {version}: {e}"))
        })?;
        if source.url.starts_with("http://") {
            warnings.push(format!("Source for {} uses plain http: {}", version, source.url));
        }
    }

    for version in recipe.patches.keys() {
        if !recipe.sources.contains_key(version) {
            return Err(RecipeError::Invalid(format!(
                "patches declared for version {version} which has no source"
            )));
        }
    }

    if let Some(since) = &recipe.options.with_libc_since {
        PackageVersion::parse(since)
            .map_err(|e| RecipeError::Invalid(format!("options.with_libc_since: {e}")))?;
    }

    if let Some(min) = recipe.test.as_ref().and_then(|t| t.min_kernel.as_ref()) {
        PackageVersion::parse(min)
            .map_err(|e| RecipeError::Invalid(format!("test.min_kernel: {e}")))?;
    }

    if recipe.package.license.is_none() {
        warnings.push("Missing package license".to_string());
    }
    if recipe.package.description.is_none() {
        warnings.push("Missing package description".to_string());
    }

    Ok(warnings)
}

/// Warnings for declared patch files that are not on disk
///
/// Kept apart from [`validate_recipe`], which never touches the filesystem.
pub fn patch_file_warnings(recipe: &Recipe) -> Vec<String> {
    let mut warnings = Vec::new();
    for (version, patches) in &recipe.patches {
        for patch in patches {
            if !recipe.patch_path(patch).exists() {
                warnings.push(format!("Patch for {} not found: {}", version, patch.file));
            }
        }
    }
    warnings
}
