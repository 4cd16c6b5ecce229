//! `brewship publish`

use crate::cli::OutputFormat;
use brewship_github::{GitHubReleaseConfig, GitHubReleaseHost};
use brewship_homebrew::{ProjectConfig, TapTarget};
use brewship_release::error::{Error, Result};
use brewship_release::{
    ArchSet, PublishOptions, PublishOrchestrator, PublishPlan, ReleaseArtifactBundle,
    SystemRunner, VersionDirective,
};
use std::fmt::Write;
use std::path::PathBuf;
use tracing::info;

/// Arguments of one publish invocation.
#[derive(Debug, Clone)]
pub struct PublishArgs {
    pub path: PathBuf,
    pub directive: VersionDirective,
    pub arch: ArchSet,
    pub skip_clean: bool,
    pub skip_tests: bool,
    pub notes: Option<String>,
    pub notes_file: Option<PathBuf>,
    pub update_source_version: bool,
    pub verify_checksums: bool,
    pub dry_run: bool,
    pub output_format: OutputFormat,
}

impl PublishArgs {
    /// Release notes from `--notes` or `--notes-file`.
    fn notes(&self) -> Result<Option<String>> {
        match (&self.notes, &self.notes_file) {
            (Some(notes), _) => Ok(Some(notes.clone())),
            (None, Some(file)) => std::fs::read_to_string(file)
                .map(|text| Some(text.trim_end().to_string()))
                .map_err(|e| {
                    Error::config(
                        format!("failed to read notes file {}: {e}", file.display()),
                        "Pass --notes instead, or fix the path",
                    )
                }),
            (None, None) => Ok(None),
        }
    }

    fn options(&self, config: &ProjectConfig) -> Result<PublishOptions> {
        Ok(PublishOptions::new(&self.path, self.directive.clone())
            .with_arch_set(self.arch)
            .with_skip_clean(self.skip_clean)
            .with_skip_tests(self.skip_tests)
            .with_notes(self.notes()?)
            .with_version_marker_update(self.update_source_version)
            .with_verify_checksums(self.verify_checksums)
            .with_commit_formula(config.tap.commit))
    }
}

/// Publishes the project with the system toolchain, `gh` and the local tap.
///
/// # Errors
///
/// Returns the first pipeline failure.
pub fn execute(args: &PublishArgs) -> Result<String> {
    let config = ProjectConfig::load(&args.path)?;
    let options = args.options(&config)?;

    let runner = SystemRunner::new();
    let host = GitHubReleaseHost::new(
        &runner,
        GitHubReleaseConfig::new()
            .with_repo(config.release.repo.clone())
            .with_draft(config.release.draft)
            .with_prerelease(config.release.prerelease),
    );
    let toolchain = config.toolchain();
    let tap = TapTarget::new(&runner, config, &args.path);
    let orchestrator = PublishOrchestrator::new(&runner, &host, &tap).with_toolchain(toolchain);

    run(&orchestrator, &options, args.dry_run, args.output_format)
}

/// Plans or publishes with an already wired orchestrator.
///
/// # Errors
///
/// Returns the first pipeline failure.
pub fn run(
    orchestrator: &PublishOrchestrator<'_>,
    options: &PublishOptions,
    dry_run: bool,
    format: OutputFormat,
) -> Result<String> {
    if dry_run {
        let plan = orchestrator.plan(options)?;
        info!(version = %plan.version, "Dry run complete");
        return Ok(render_plan(&plan, format));
    }

    let bundle = orchestrator.publish(options)?;
    Ok(render_bundle(&bundle, format))
}

fn render_plan(plan: &PublishPlan, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::json!({
            "dry_run": true,
            "version": plan.version,
            "previous_version": plan.previous_version,
            "steps": plan
                .steps
                .iter()
                .map(|step| serde_json::json!({
                    "step": step.kind.to_string(),
                    "command": step.command.to_string(),
                }))
                .collect::<Vec<_>>(),
            "archives": plan.archive_names,
            "formula": plan.formula_file,
        })
        .to_string(),
        OutputFormat::Text => {
            let mut output = String::from("Dry run - nothing will be built or published.\n\n");
            let _ = writeln!(
                output,
                "Version: {} (previous: {})",
                plan.version,
                plan.previous_version.as_deref().unwrap_or("none")
            );
            output.push_str("\nSteps:\n");
            for (i, step) in plan.steps.iter().enumerate() {
                let _ = writeln!(output, "  {}. {}: {}", i + 1, step.kind, step.command);
            }
            output.push_str("\nArchives:\n");
            for name in &plan.archive_names {
                let _ = writeln!(output, "  {name}");
            }
            let _ = write!(output, "\nFormula: {}", plan.formula_file);
            output
        }
    }
}

fn render_bundle(bundle: &ReleaseArtifactBundle, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::json!({
            "version": bundle.version,
            "install_name": bundle.install_name,
            "archives": bundle
                .archives
                .iter()
                .zip(&bundle.asset_urls)
                .map(|(archive, url)| serde_json::json!({
                    "path": archive.archive_path.display().to_string(),
                    "sha256": archive.sha256,
                    "url": url,
                }))
                .collect::<Vec<_>>(),
            "formula_path": bundle.formula_path.display().to_string(),
        })
        .to_string(),
        OutputFormat::Text => {
            let mut output = format!("Published {} {}\n", bundle.install_name, bundle.version);
            for (archive, url) in bundle.archives.iter().zip(&bundle.asset_urls) {
                let _ = writeln!(output, "  {} sha256:{}", url, archive.sha256);
            }
            let _ = write!(output, "Formula: {}", bundle.formula_path.display());
            output
        }
    }
}
