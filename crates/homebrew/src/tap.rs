//! Local Homebrew tap target.
//!
//! Reads the previously published formula from a tap checkout to recover
//! the last released version, and replaces it with freshly rendered text.

use crate::config::ProjectConfig;
use brewship_release::backends::{FormulaRecord, FormulaTarget};
use brewship_release::error::{Error, Result};
use brewship_release::git::Git;
use brewship_release::runner::CommandRunner;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

static URL_TAG: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r#"(?m)^\s*url\s+"[^"]*/download/([^/"]+)/"#).expect("static url pattern is valid")
});

static VERSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r#"(?m)^\s*version\s+"([^"]+)""#).expect("static version pattern is valid")
});

/// Extracts the last released version from formula text.
///
/// The release tag in the first download URL wins because it keeps the
/// tag's exact form (`v1.2.3`); the bare `version` line is the fallback.
#[must_use]
pub fn previous_version(formula: &str) -> Option<String> {
    URL_TAG
        .captures(formula)
        .or_else(|| VERSION_LINE.captures(formula))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// A tap checkout on the local filesystem.
pub struct TapTarget<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    config: ProjectConfig,
    tap_path: PathBuf,
}

impl<'a, R: CommandRunner + ?Sized> TapTarget<'a, R> {
    /// Creates a target for the tap configured for `project_path`.
    #[must_use]
    pub fn new(runner: &'a R, config: ProjectConfig, project_path: &Path) -> Self {
        let tap_path = config.tap_path(project_path);
        Self {
            runner,
            config,
            tap_path,
        }
    }

    /// The tap checkout.
    #[must_use]
    pub fn tap_path(&self) -> &Path {
        &self.tap_path
    }

    /// Where the formula for `name` lives.
    #[must_use]
    pub fn formula_path(&self, file_name: &str) -> PathBuf {
        self.tap_path
            .join(&self.config.tap.formula_dir)
            .join(file_name)
    }

    fn tap_error(&self, message: String) -> Error {
        Error::backend(
            "Homebrew tap",
            message,
            Some(format!(
                "Check that {} is a writable tap checkout",
                self.tap_path.display()
            )),
        )
    }
}

impl<R: CommandRunner + ?Sized> FormulaTarget for TapTarget<'_, R> {
    fn record(&self) -> Result<FormulaRecord> {
        let descriptor = self.config.descriptor();
        let path = self.formula_path(&descriptor.file_name());

        let previous = match std::fs::read_to_string(&path) {
            Ok(content) => previous_version(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No published formula yet");
                None
            }
            Err(e) => {
                return Err(self.tap_error(format!("failed to read {}: {e}", path.display())));
            }
        };
        debug!(formula = %descriptor.name, previous = ?previous, "Loaded formula record");

        let record = FormulaRecord::new(descriptor)
            .with_extra_build_args(self.config.formula.extra_build_args.clone())
            .with_test(self.config.test_directive());
        Ok(match previous {
            Some(version) => record.with_previous_version(version),
            None => record,
        })
    }

    fn publish(
        &self,
        record: &FormulaRecord,
        content: &str,
        commit_message: Option<&str>,
    ) -> Result<PathBuf> {
        let path = self.formula_path(&record.descriptor.file_name());
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| self.tap_error(format!("failed to create {}: {e}", dir.display())))?;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "Removed previous formula"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(self.tap_error(format!("failed to remove {}: {e}", path.display())));
            }
        }
        std::fs::write(&path, content)
            .map_err(|e| self.tap_error(format!("failed to write {}: {e}", path.display())))?;
        info!(path = %path.display(), "Wrote formula");

        if let Some(message) = commit_message.filter(|_| self.config.tap.commit) {
            let git = Git::new(self.runner, &self.tap_path);
            git.commit_file(&path, message)?;
            if self.config.tap.push {
                git.push()?;
                info!(tap = %self.tap_path.display(), "Pushed tap");
            }
        }

        Ok(path)
    }
}
