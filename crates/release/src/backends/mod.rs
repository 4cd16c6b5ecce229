//! Collaborators the pipeline publishes through.
//!
//! The core never talks to a hosting service or a tap directly. Provider
//! crates implement:
//!
//! - [`ReleaseHost`] - creates the release and uploads archives
//!   (`brewship-github`)
//! - [`FormulaTarget`] - supplies the formula record and stores the rendered
//!   formula (`brewship-homebrew`)

use crate::builder::TestDirective;
use crate::error::Result;
use crate::formula::FormulaDescriptor;
use std::path::{Path, PathBuf};

/// Everything recorded about a formula before a publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaRecord {
    /// Formula metadata.
    pub descriptor: FormulaDescriptor,
    /// Version of the last published formula, if any.
    pub previous_version: Option<String>,
    /// Extra build flags honoured on every publish.
    pub extra_build_args: Vec<String>,
    /// Test directive honoured on every publish.
    pub test: Option<TestDirective>,
}

impl FormulaRecord {
    /// Creates a record with no history and no build settings.
    #[must_use]
    pub const fn new(descriptor: FormulaDescriptor) -> Self {
        Self {
            descriptor,
            previous_version: None,
            extra_build_args: Vec::new(),
            test: None,
        }
    }

    /// Sets the previous version.
    #[must_use]
    pub fn with_previous_version(mut self, version: impl Into<String>) -> Self {
        self.previous_version = Some(version.into());
        self
    }

    /// Sets the extra build flags.
    #[must_use]
    pub fn with_extra_build_args(mut self, args: Vec<String>) -> Self {
        self.extra_build_args = args;
        self
    }

    /// Sets the test directive.
    #[must_use]
    pub fn with_test(mut self, test: Option<TestDirective>) -> Self {
        self.test = test;
        self
    }
}

/// A release about to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest<'a> {
    /// Project root (the release repository's checkout).
    pub project_path: &'a Path,
    /// Version, used verbatim as the tag.
    pub version: &'a str,
    /// Release notes.
    pub notes: &'a str,
    /// Archives, arm64 first when both architectures are present.
    pub archives: &'a [PathBuf],
}

/// Hosts releases and their downloadable assets.
pub trait ReleaseHost {
    /// Name used in logs and errors (e.g. "GitHub").
    fn name(&self) -> &'static str;

    /// Verifies the host's tooling is available.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MissingHostingCli`] if it is not.
    fn check_prerequisites(&self) -> Result<()>;

    /// Most recent release tag, if any release exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be queried.
    fn latest_version(&self, project_path: &Path) -> Result<Option<String>>;

    /// Creates the release and uploads the archives.
    ///
    /// Returns one download URL per archive, in the same order.
    ///
    /// # Errors
    ///
    /// Returns an error if the release cannot be created or an upload fails.
    fn upload(&self, request: &ReleaseRequest<'_>) -> Result<Vec<String>>;
}

/// Where the formula comes from and where it goes.
pub trait FormulaTarget {
    /// Loads the formula record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be loaded.
    fn record(&self) -> Result<FormulaRecord>;

    /// Stores rendered formula text, replacing any previous file, and
    /// commits it when `commit_message` is given.
    ///
    /// Returns the path of the written formula.
    ///
    /// # Errors
    ///
    /// Returns an error if the formula cannot be written or committed.
    fn publish(
        &self,
        record: &FormulaRecord,
        content: &str,
        commit_message: Option<&str>,
    ) -> Result<PathBuf>;
}
