//! `brewship next-version`

use brewship_release::error::Result;
use brewship_release::version::{self, VersionPart};

/// Increments `from` by `part`, keeping any `v` prefix.
///
/// # Errors
///
/// Returns an error if `from` is not a three-component version.
pub fn execute(part: VersionPart, from: &str) -> Result<String> {
    version::increment(part, from)
}
