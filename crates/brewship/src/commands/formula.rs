//! `brewship formula`: render a formula for assets that are already released.

use brewship_homebrew::ProjectConfig;
use brewship_release::error::{Error, Result};
use brewship_release::formula::{AssetRef, FormulaAssets, FormulaGenerator};
use brewship_release::version;
use std::path::{Path, PathBuf};

/// Renders the formula for the project at `path`.
///
/// `arm` and `intel` are `(url, sha256)` pairs.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, the version is
/// invalid, or no complete pair was given.
pub fn execute(
    path: &Path,
    tag: &str,
    arm: Option<(String, String)>,
    intel: Option<(String, String)>,
) -> Result<String> {
    if !version::is_valid(tag) {
        return Err(Error::invalid_version_number(tag));
    }

    let config = ProjectConfig::load(path)?;
    let descriptor = config.descriptor();

    let arm = arm.map(|(url, sha)| AssetRef::new(url, sha));
    let intel = intel.map(|(url, sha)| AssetRef::new(url, sha));
    let assets = FormulaAssets::select(arm.as_ref(), intel.as_ref());
    if !assets.is_complete() {
        return Err(Error::missing_sha256(PathBuf::from(descriptor.file_name())));
    }

    Ok(FormulaGenerator::generate(
        &descriptor,
        version::strip_prefix(tag),
        &assets,
    ))
}
