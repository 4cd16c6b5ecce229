//! Publish orchestrator.
//!
//! Sequences the full pipeline: prerequisite checks, version resolution,
//! the optional in-source version update, build, archive, upload, formula
//! rendering and formula publishing. Every step blocks until it finishes;
//! the first failure ends the publish and nothing after it runs.

use crate::arch::{ArchSet, Architecture};
use crate::archive::{ArchivedBinary, BinaryArchiver, archive_file_name};
use crate::backends::{FormulaRecord, FormulaTarget, ReleaseHost, ReleaseRequest};
use crate::builder::{BuildRequest, BuildStep, MultiArchBuilder, Toolchain};
use crate::error::{Error, Result};
use crate::formula::{AssetRef, FormulaAssets, FormulaGenerator};
use crate::git::Git;
use crate::marker::{MarkerPattern, VersionMarker};
use crate::runner::CommandRunner;
use crate::version::{self, VersionDirective};
use crate::{
    emit_formula_rendered, emit_publish_completed, emit_publish_started, emit_release_uploaded,
    emit_version_resolved,
};
use std::path::PathBuf;
use tracing::{info, warn};

/// Per-invocation publish settings.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Project root; must be a clean git checkout.
    pub project_path: PathBuf,
    /// How to choose the version.
    pub directive: VersionDirective,
    /// Architectures to build.
    pub arch_set: ArchSet,
    /// Skip the toolchain clean.
    pub skip_clean: bool,
    /// Skip the recorded test directive.
    pub skip_tests: bool,
    /// Release notes; defaults to `Release <version>`.
    pub notes: Option<String>,
    /// Rewrite and commit the in-source version marker.
    pub update_version_marker: bool,
    /// Re-digest archives in-process before uploading.
    pub verify_checksums: bool,
    /// Commit the formula in the tap.
    pub commit_formula: bool,
}

impl PublishOptions {
    /// Creates options with defaults: universal build, clean, tests on,
    /// checksum verification on, formula committed.
    #[must_use]
    pub fn new(project_path: impl Into<PathBuf>, directive: VersionDirective) -> Self {
        Self {
            project_path: project_path.into(),
            directive,
            arch_set: ArchSet::Universal,
            skip_clean: false,
            skip_tests: false,
            notes: None,
            update_version_marker: false,
            verify_checksums: true,
            commit_formula: true,
        }
    }

    /// Sets the architecture set.
    #[must_use]
    pub const fn with_arch_set(mut self, arch_set: ArchSet) -> Self {
        self.arch_set = arch_set;
        self
    }

    /// Skips the clean step.
    #[must_use]
    pub const fn with_skip_clean(mut self, skip: bool) -> Self {
        self.skip_clean = skip;
        self
    }

    /// Skips tests.
    #[must_use]
    pub const fn with_skip_tests(mut self, skip: bool) -> Self {
        self.skip_tests = skip;
        self
    }

    /// Sets release notes.
    #[must_use]
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    /// Enables the in-source version update.
    #[must_use]
    pub const fn with_version_marker_update(mut self, update: bool) -> Self {
        self.update_version_marker = update;
        self
    }

    /// Enables or disables in-process checksum verification.
    #[must_use]
    pub const fn with_verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    /// Enables or disables committing the formula.
    #[must_use]
    pub const fn with_commit_formula(mut self, commit: bool) -> Self {
        self.commit_formula = commit;
        self
    }
}

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseArtifactBundle {
    /// Resolved version, as tagged.
    pub version: String,
    /// Installed binary name.
    pub install_name: String,
    /// Archives, arm64 first.
    pub archives: Vec<ArchivedBinary>,
    /// Download URLs aligned with `archives`.
    pub asset_urls: Vec<String>,
    /// Rendered formula text.
    pub formula: String,
    /// Where the formula was written.
    pub formula_path: PathBuf,
}

/// What a publish would do, without doing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPlan {
    /// Version that would be released.
    pub version: String,
    /// Version it was derived from, if any.
    pub previous_version: Option<String>,
    /// Build commands in order.
    pub steps: Vec<BuildStep>,
    /// Archive names in upload order.
    pub archive_names: Vec<String>,
    /// Formula file name.
    pub formula_file: String,
}

/// Runs the publish pipeline against its collaborators.
pub struct PublishOrchestrator<'a> {
    runner: &'a dyn CommandRunner,
    host: &'a dyn ReleaseHost,
    target: &'a dyn FormulaTarget,
    toolchain: Toolchain,
    marker_pattern: MarkerPattern,
}

impl<'a> PublishOrchestrator<'a> {
    /// Creates an orchestrator with the default toolchain and marker pattern.
    #[must_use]
    pub fn new(
        runner: &'a dyn CommandRunner,
        host: &'a dyn ReleaseHost,
        target: &'a dyn FormulaTarget,
    ) -> Self {
        Self {
            runner,
            host,
            target,
            toolchain: Toolchain::default(),
            marker_pattern: MarkerPattern::default(),
        }
    }

    /// Replaces the toolchain settings.
    #[must_use]
    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }

    /// Replaces the marker pattern.
    #[must_use]
    pub fn with_marker_pattern(mut self, pattern: MarkerPattern) -> Self {
        self.marker_pattern = pattern;
        self
    }

    /// Runs the full pipeline.
    ///
    /// # Errors
    ///
    /// Returns the first failure. Precondition failures (missing hosting
    /// CLI, uncommitted changes, version errors) happen before any build.
    pub fn publish(&self, options: &PublishOptions) -> Result<ReleaseArtifactBundle> {
        self.check_preconditions(options)?;

        let record = self.target.record()?;
        emit_publish_started!(record.descriptor.name, options.arch_set);

        let (version, _) = self.resolve_version(options, &record)?;

        if options.update_version_marker {
            if let Err(e) = self.update_version_marker(options, &version) {
                warn!(error = %e, "Skipping in-source version update");
            }
        }

        let request = Self::build_request(options, &record);
        let builder = MultiArchBuilder::new(self.runner).with_toolchain(self.toolchain.clone());
        let output = builder.build(&request)?;

        let archiver = BinaryArchiver::new(self.runner);
        let mut archives = archiver.archive(&output.paths())?;
        archives.sort_by_key(|a| a.architecture());
        if options.verify_checksums {
            for archive in &archives {
                archive.verify()?;
            }
        }

        let archive_paths: Vec<PathBuf> = archives.iter().map(|a| a.archive_path.clone()).collect();
        let notes = options
            .notes
            .clone()
            .unwrap_or_else(|| format!("Release {version}"));
        let asset_urls = self.host.upload(&ReleaseRequest {
            project_path: &options.project_path,
            version: &version,
            notes: &notes,
            archives: &archive_paths,
        })?;
        if asset_urls.len() != archives.len() {
            return Err(Error::backend(
                self.host.name(),
                format!(
                    "expected {} asset URLs, got {}",
                    archives.len(),
                    asset_urls.len()
                ),
                None,
            ));
        }
        emit_release_uploaded!(version, asset_urls.len());

        let assets = Self::formula_assets(&archives, &asset_urls)?;
        let bare_version = version::strip_prefix(&version);
        let formula = FormulaGenerator::generate(&record.descriptor, bare_version, &assets);
        emit_formula_rendered!(record.descriptor.name, assets);

        let commit_message = format!("Update {} to {bare_version}", record.descriptor.name);
        let formula_path = self.target.publish(
            &record,
            &formula,
            options.commit_formula.then_some(commit_message.as_str()),
        )?;
        emit_publish_completed!(record.descriptor.name, version);

        Ok(ReleaseArtifactBundle {
            version,
            install_name: record.descriptor.install_name,
            archives,
            asset_urls,
            formula,
            formula_path,
        })
    }

    /// Resolves the version and lists what a publish would run.
    ///
    /// # Errors
    ///
    /// Returns the same precondition and version errors as [`Self::publish`].
    pub fn plan(&self, options: &PublishOptions) -> Result<PublishPlan> {
        self.check_preconditions(options)?;
        let record = self.target.record()?;
        let (version, previous_version) = self.resolve_version(options, &record)?;

        let request = Self::build_request(options, &record);
        let builder = MultiArchBuilder::new(self.runner).with_toolchain(self.toolchain.clone());
        let steps = builder.plan(&request);
        let archive_names = builder
            .output_for(&request)
            .paths()
            .into_iter()
            .map(archive_file_name)
            .collect();

        Ok(PublishPlan {
            version,
            previous_version,
            steps,
            archive_names,
            formula_file: record.descriptor.file_name(),
        })
    }

    fn check_preconditions(&self, options: &PublishOptions) -> Result<()> {
        self.host.check_prerequisites()?;

        let status = Git::new(self.runner, &options.project_path).status()?;
        if !status.is_empty() {
            warn!(changes = %status, "Working tree is not clean");
            return Err(Error::UncommittedChanges { summary: status });
        }
        Ok(())
    }

    fn resolve_version(
        &self,
        options: &PublishOptions,
        record: &FormulaRecord,
    ) -> Result<(String, Option<String>)> {
        let previous = match (&options.directive, &record.previous_version) {
            (VersionDirective::Explicit(_), recorded) => recorded.clone(),
            (VersionDirective::Increment(_), Some(recorded)) => Some(recorded.clone()),
            (VersionDirective::Increment(_), None) => {
                self.host.latest_version(&options.project_path)?
            }
        };

        let version = version::resolve(&options.directive, previous.as_deref())?;
        emit_version_resolved!(version, previous);
        Ok((version, previous))
    }

    fn update_version_marker(&self, options: &PublishOptions, version: &str) -> Result<()> {
        let Some(marker) = VersionMarker::find(&options.project_path, &self.marker_pattern)? else {
            info!("No in-source version marker found");
            return Ok(());
        };
        if marker.is_current(version) {
            info!(path = %marker.path.display(), "In-source version already current");
            return Ok(());
        }

        let original = marker.rewrite(version)?;
        let git = Git::new(self.runner, &options.project_path);
        if let Err(e) = git.commit_file(&marker.path, &format!("Update version to {version}")) {
            // The tree must be left as it was found.
            marker.restore(&original)?;
            if let Err(unstage) = git.unstage(&marker.path) {
                warn!(error = %unstage, path = %marker.path.display(), "Failed to unstage version marker");
            }
            return Err(Error::version_marker(e.to_string(), Some(marker.path.clone())));
        }
        info!(path = %marker.path.display(), from = %marker.current, to = %version, "Updated in-source version");
        Ok(())
    }

    fn build_request(options: &PublishOptions, record: &FormulaRecord) -> BuildRequest {
        BuildRequest::new(&record.descriptor.install_name, &options.project_path)
            .with_arch_set(options.arch_set)
            .with_skip_clean(options.skip_clean)
            .with_extra_args(record.extra_build_args.clone())
            .with_test(if options.skip_tests {
                None
            } else {
                record.test.clone()
            })
    }

    /// Pairs URLs with hashes and picks the formula template.
    ///
    /// Refuses to render when no architecture has both a URL and a hash.
    fn formula_assets(archives: &[ArchivedBinary], urls: &[String]) -> Result<FormulaAssets> {
        let mut arm = None;
        let mut intel = None;
        for (archive, url) in archives.iter().zip(urls) {
            let asset = AssetRef::new(url, &archive.sha256);
            match archive.architecture() {
                Some(Architecture::Arm64) => arm = Some(asset),
                Some(Architecture::X86_64) => intel = Some(asset),
                None if arm.is_none() => arm = Some(asset),
                None => {}
            }
        }

        let assets = FormulaAssets::select(arm.as_ref(), intel.as_ref());
        if assets.is_complete() {
            Ok(assets)
        } else {
            let path = archives
                .first()
                .map_or_else(PathBuf::new, |a| a.archive_path.clone());
            Err(Error::missing_sha256(path))
        }
    }
}
