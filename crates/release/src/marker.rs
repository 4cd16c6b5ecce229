//! In-source version marker.
//!
//! Command-line projects often embed their version in the entry point, e.g.
//! `CommandConfiguration(commandName: "app", version: "1.2.0")`. The marker
//! file is the first source file containing both the entry-point attribute
//! and the configuration literal; only its first `version: "<value>"` is
//! rewritten.

use crate::error::{Error, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;
use walkdir::WalkDir;

static VERSION_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r#"version:\s*"([^"]*)""#).expect("static marker pattern is valid")
});

/// What identifies the marker file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPattern {
    /// Source file extension, without the dot.
    pub extension: String,
    /// Entry-point attribute the file must contain.
    pub entry_marker: String,
    /// Configuration literal the file must contain.
    pub config_literal: String,
}

impl Default for MarkerPattern {
    fn default() -> Self {
        Self {
            extension: "swift".to_string(),
            entry_marker: "@main".to_string(),
            config_literal: "CommandConfiguration(".to_string(),
        }
    }
}

/// A located version marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMarker {
    /// File containing the marker.
    pub path: PathBuf,
    /// Version currently written there.
    pub current: String,
}

impl VersionMarker {
    /// Searches `root` (skipping hidden and build directories) for the marker.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionMarker`] if a candidate file cannot be read.
    pub fn find(root: &Path, pattern: &MarkerPattern) -> Result<Option<Self>> {
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
            });

        for entry in walker {
            let entry = entry.map_err(|e| Error::version_marker(e.to_string(), None))?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(pattern.extension.as_str())
            {
                continue;
            }

            let content = std::fs::read_to_string(path)
                .map_err(|e| Error::version_marker(e.to_string(), Some(path.to_path_buf())))?;
            if !content.contains(&pattern.entry_marker) || !content.contains(&pattern.config_literal)
            {
                continue;
            }

            if let Some(current) = VERSION_FIELD
                .captures(&content)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
            {
                debug!(path = %path.display(), current, "Found version marker");
                return Ok(Some(Self {
                    path: path.to_path_buf(),
                    current,
                }));
            }
        }

        Ok(None)
    }

    /// Whether the marker already holds `version`.
    #[must_use]
    pub fn is_current(&self, version: &str) -> bool {
        self.current == version
    }

    /// Rewrites the first version field to `version`, leaving the rest of the
    /// file untouched. Returns the previous file content for [`Self::restore`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionMarker`] if the file cannot be read or written,
    /// or no longer contains a version field.
    pub fn rewrite(&self, version: &str) -> Result<String> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::version_marker(e.to_string(), Some(self.path.clone())))?;
        let updated = rewrite_version_field(&content, version).ok_or_else(|| {
            Error::version_marker("version field disappeared", Some(self.path.clone()))
        })?;
        std::fs::write(&self.path, updated)
            .map_err(|e| Error::version_marker(e.to_string(), Some(self.path.clone())))?;
        Ok(content)
    }

    /// Writes back content returned by [`Self::rewrite`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionMarker`] if the file cannot be written.
    pub fn restore(&self, original: &str) -> Result<()> {
        std::fs::write(&self.path, original)
            .map_err(|e| Error::version_marker(e.to_string(), Some(self.path.clone())))
    }
}

/// Replaces the value of the first `version: "<value>"` in `content`.
#[must_use]
pub fn rewrite_version_field(content: &str, version: &str) -> Option<String> {
    let value = VERSION_FIELD.captures(content)?.get(1)?;
    let mut updated = String::with_capacity(content.len() + version.len());
    updated.push_str(&content[..value.start()]);
    updated.push_str(version);
    updated.push_str(&content[value.end()..]);
    Some(updated)
}
