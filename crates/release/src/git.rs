//! Minimal git client over [`CommandRunner`].

use crate::error::{Error, Result};
use crate::runner::{CommandRunner, CommandSpec, path_arg, run_checked};
use std::path::Path;
use tracing::debug;

/// Runs git commands inside one repository.
pub struct Git<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    repo: &'a Path,
}

impl<'a, R: CommandRunner + ?Sized> Git<'a, R> {
    /// Creates a client for the repository at `repo`.
    #[must_use]
    pub const fn new(runner: &'a R, repo: &'a Path) -> Self {
        Self { runner, repo }
    }

    fn git(&self) -> CommandSpec {
        CommandSpec::new("git").current_dir(self.repo)
    }

    fn checked(&self, spec: &CommandSpec) -> Result<String> {
        run_checked(self.runner, spec, |command, output| {
            Error::backend("git", format!("'{command}' failed: {output}"), None)
        })
        .map(|out| out.stdout)
    }

    /// `git status --porcelain`, trimmed. Empty means a clean tree.
    ///
    /// # Errors
    ///
    /// Returns an error if git fails (e.g. not a repository).
    pub fn status(&self) -> Result<String> {
        let out = self.checked(&self.git().args(["status", "--porcelain"]))?;
        Ok(out.trim_end().to_string())
    }

    /// Stages `file` and commits it with `message`.
    ///
    /// # Errors
    ///
    /// Returns an error if staging or committing fails.
    pub fn commit_file(&self, file: &Path, message: &str) -> Result<()> {
        debug!(repo = %self.repo.display(), file = %file.display(), message, "Committing");
        self.checked(&self.git().arg("add").arg(path_arg(file)))?;
        self.checked(&self.git().args(["commit", "-m", message]))?;
        Ok(())
    }

    /// Drops `file` from the index, keeping the working copy.
    ///
    /// # Errors
    ///
    /// Returns an error if git fails.
    pub fn unstage(&self, file: &Path) -> Result<()> {
        self.checked(&self.git().args(["reset", "-q", "--"]).arg(path_arg(file)))?;
        Ok(())
    }

    /// Pushes the current branch to its upstream.
    ///
    /// # Errors
    ///
    /// Returns an error if the push fails.
    pub fn push(&self) -> Result<()> {
        self.checked(&self.git().arg("push"))?;
        Ok(())
    }
}
