//! GitHub Releases host for brewship.
//!
//! Implements [`ReleaseHost`] on top of the `gh` CLI, so authentication and
//! host selection are whatever `gh auth` is already set up for.

use brewship_release::backends::{ReleaseHost, ReleaseRequest};
use brewship_release::error::{Error, Result};
use brewship_release::runner::{CommandRunner, CommandSpec};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

const GH: &str = "gh";
const INSTALL_HELP: &str = "Install the GitHub CLI with 'brew install gh' and run 'gh auth login'";

/// Configuration for the GitHub Releases host.
#[derive(Debug, Clone, Default)]
pub struct GitHubReleaseConfig {
    /// Repository in "owner/repo" format; detected with `gh repo view` when unset
    pub repo: Option<String>,
    /// Whether to create the release as a draft
    pub draft: bool,
    /// Whether to mark the release as a prerelease
    pub prerelease: bool,
}

impl GitHubReleaseConfig {
    /// Creates a configuration that detects the repository from the checkout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the repository.
    #[must_use]
    pub fn with_repo(mut self, repo: Option<String>) -> Self {
        self.repo = repo;
        self
    }

    /// Sets the draft flag.
    #[must_use]
    pub const fn with_draft(mut self, draft: bool) -> Self {
        self.draft = draft;
        self
    }

    /// Sets the prerelease flag.
    #[must_use]
    pub const fn with_prerelease(mut self, prerelease: bool) -> Self {
        self.prerelease = prerelease;
        self
    }
}

/// Parse an "owner/repo" slug, also accepting GitHub remote URLs.
#[must_use]
pub fn parse_repo_slug(value: &str) -> Option<(String, String)> {
    let value = value.trim();
    let path = value
        .strip_prefix("git@github.com:")
        .or_else(|| value.strip_prefix("https://github.com/"))
        .unwrap_or(value);
    let path = path.strip_suffix(".git").unwrap_or(path);
    let (owner, repo) = path.split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}

/// Download URL GitHub serves a release asset from.
#[must_use]
pub fn asset_url(owner: &str, repo: &str, tag: &str, file_name: &str) -> String {
    format!("https://github.com/{owner}/{repo}/releases/download/{tag}/{file_name}")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseView {
    tag_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepoView {
    name_with_owner: String,
}

/// GitHub Releases host.
///
/// Creates the release for a version tag and uploads every archive in the
/// same `gh release create` call, so a release never exists without its
/// assets.
pub struct GitHubReleaseHost<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    config: GitHubReleaseConfig,
}

impl<'a, R: CommandRunner + ?Sized> GitHubReleaseHost<'a, R> {
    /// Creates a new GitHub release host.
    #[must_use]
    pub const fn new(runner: &'a R, config: GitHubReleaseConfig) -> Self {
        Self { runner, config }
    }

    fn gh(&self, project_path: &Path) -> CommandSpec {
        CommandSpec::new(GH).current_dir(project_path)
    }

    fn with_repo(&self, spec: CommandSpec) -> CommandSpec {
        match &self.config.repo {
            Some(repo) => spec.args(["--repo", repo.as_str()]),
            None => spec,
        }
    }

    /// Resolves the repository slug from config or the checkout.
    fn repository(&self, project_path: &Path) -> Result<(String, String)> {
        let slug = match &self.config.repo {
            Some(repo) => repo.clone(),
            None => {
                let spec = self
                    .gh(project_path)
                    .args(["repo", "view", "--json", "nameWithOwner"]);
                let output = self.runner.run(&spec)?;
                if !output.is_success() {
                    return Err(Error::backend(
                        "GitHub",
                        format!("could not determine repository: {}", output.combined()),
                        Some("Set [release] repo = \"owner/name\" in brewship.toml".to_string()),
                    ));
                }
                let view: RepoView = serde_json::from_str(&output.stdout).map_err(|e| {
                    Error::backend("GitHub", format!("unexpected gh output: {e}"), None)
                })?;
                view.name_with_owner
            }
        };

        parse_repo_slug(&slug).ok_or_else(|| {
            Error::config(
                format!("invalid repository '{slug}'"),
                "Use the owner/name form, e.g. me/my-tool",
            )
        })
    }
}

impl<R: CommandRunner + ?Sized> ReleaseHost for GitHubReleaseHost<'_, R> {
    fn name(&self) -> &'static str {
        "GitHub"
    }

    fn check_prerequisites(&self) -> Result<()> {
        if self.runner.is_installed(GH) {
            Ok(())
        } else {
            Err(Error::missing_cli(GH, INSTALL_HELP))
        }
    }

    fn latest_version(&self, project_path: &Path) -> Result<Option<String>> {
        let spec = self.with_repo(
            self.gh(project_path)
                .args(["release", "view", "--json", "tagName"]),
        );
        let output = self.runner.run(&spec)?;
        if !output.is_success() {
            // gh exits non-zero when the repository has no releases yet
            if output.stderr.contains("release not found") {
                debug!("No previous GitHub release");
                return Ok(None);
            }
            return Err(Error::backend(
                "GitHub",
                format!("'{spec}' failed: {}", output.combined()),
                None,
            ));
        }

        let view: ReleaseView = serde_json::from_str(&output.stdout)
            .map_err(|e| Error::backend("GitHub", format!("unexpected gh output: {e}"), None))?;
        let tag = view.tag_name.trim().to_string();
        Ok((!tag.is_empty()).then_some(tag))
    }

    fn upload(&self, request: &ReleaseRequest<'_>) -> Result<Vec<String>> {
        let (owner, repo) = self.repository(request.project_path)?;
        let tag = request.version;

        let mut spec = self
            .gh(request.project_path)
            .args(["release", "create", tag])
            .args(
                request
                    .archives
                    .iter()
                    .map(|path| path.to_string_lossy().into_owned()),
            )
            .args(["--title", tag, "--notes", request.notes]);
        if self.config.draft {
            spec = spec.arg("--draft");
        }
        if self.config.prerelease {
            spec = spec.arg("--prerelease");
        }
        let spec = spec.args(["--repo".to_string(), format!("{owner}/{repo}")]);

        info!(
            owner = %owner,
            repo = %repo,
            tag = %tag,
            artifact_count = request.archives.len(),
            "Creating GitHub release"
        );
        let output = self.runner.run(&spec)?;
        if !output.is_success() {
            return Err(Error::backend(
                "GitHub",
                format!("release {tag} could not be created: {}", output.combined()),
                Some(format!(
                    "If the release already exists, remove it with 'gh release delete {tag}'"
                )),
            ));
        }

        let urls = request
            .archives
            .iter()
            .map(|path| {
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                asset_url(&owner, &repo, tag, &file_name)
            })
            .collect::<Vec<_>>();
        debug!(?urls, "Release assets uploaded");
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brewship_release::runner::{CommandOutput, ScriptedRunner};
    use std::path::PathBuf;

    #[test]
    fn test_parse_repo_slug() {
        assert_eq!(
            parse_repo_slug("me/my-tool"),
            Some(("me".to_string(), "my-tool".to_string()))
        );
        assert_eq!(
            parse_repo_slug("git@github.com:me/my-tool.git"),
            Some(("me".to_string(), "my-tool".to_string()))
        );
        assert_eq!(
            parse_repo_slug("https://github.com/me/my-tool"),
            Some(("me".to_string(), "my-tool".to_string()))
        );
        assert_eq!(parse_repo_slug("my-tool"), None);
        assert_eq!(parse_repo_slug("a/b/c"), None);
        assert_eq!(parse_repo_slug("/b"), None);
    }

    #[test]
    fn test_asset_url() {
        assert_eq!(
            asset_url("me", "app", "v1.0.0", "App-arm64.tar.gz"),
            "https://github.com/me/app/releases/download/v1.0.0/App-arm64.tar.gz"
        );
    }

    #[test]
    fn test_missing_gh() {
        let runner = ScriptedRunner::new();
        let host = GitHubReleaseHost::new(&runner, GitHubReleaseConfig::new());
        let err = host.check_prerequisites().unwrap_err();
        assert!(matches!(err, Error::MissingHostingCli { ref program, .. } if program == "gh"));

        let runner = ScriptedRunner::new().with_installed("gh");
        let host = GitHubReleaseHost::new(&runner, GitHubReleaseConfig::new());
        host.check_prerequisites().unwrap();
    }

    #[test]
    fn test_latest_version() {
        let runner = ScriptedRunner::new().on(
            "gh release view",
            CommandOutput::success(r#"{"tagName":"v1.4.0"}"#),
        );
        let host = GitHubReleaseHost::new(
            &runner,
            GitHubReleaseConfig::new().with_repo(Some("me/app".to_string())),
        );
        assert_eq!(
            host.latest_version(Path::new("/p")).unwrap().as_deref(),
            Some("v1.4.0")
        );
        assert_eq!(
            runner.command_lines(),
            vec!["gh release view --json tagName --repo me/app"]
        );
    }

    #[test]
    fn test_latest_version_without_releases() {
        let runner = ScriptedRunner::new().on(
            "gh release view",
            CommandOutput::failure(1, "release not found"),
        );
        let host = GitHubReleaseHost::new(&runner, GitHubReleaseConfig::new());
        assert!(host.latest_version(Path::new("/p")).unwrap().is_none());

        let runner = ScriptedRunner::new().on(
            "gh release view",
            CommandOutput::failure(4, "authentication required"),
        );
        let host = GitHubReleaseHost::new(&runner, GitHubReleaseConfig::new());
        assert!(matches!(
            host.latest_version(Path::new("/p")),
            Err(Error::Backend { .. })
        ));
    }

    #[test]
    fn test_upload_detects_repository() {
        let runner = ScriptedRunner::new().on(
            "gh repo view",
            CommandOutput::success(r#"{"nameWithOwner":"me/app"}"#),
        );
        let host = GitHubReleaseHost::new(&runner, GitHubReleaseConfig::new().with_draft(true));
        let archives = vec![
            PathBuf::from("/p/.build/arm64-apple-macosx/release/App-arm64.tar.gz"),
            PathBuf::from("/p/.build/x86_64-apple-macosx/release/App-x86_64.tar.gz"),
        ];

        let urls = host
            .upload(&ReleaseRequest {
                project_path: Path::new("/p"),
                version: "v1.0.0",
                notes: "Release v1.0.0",
                archives: &archives,
            })
            .unwrap();

        assert_eq!(
            urls,
            vec![
                "https://github.com/me/app/releases/download/v1.0.0/App-arm64.tar.gz",
                "https://github.com/me/app/releases/download/v1.0.0/App-x86_64.tar.gz",
            ]
        );
        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[1].args,
            vec![
                "release",
                "create",
                "v1.0.0",
                "/p/.build/arm64-apple-macosx/release/App-arm64.tar.gz",
                "/p/.build/x86_64-apple-macosx/release/App-x86_64.tar.gz",
                "--title",
                "v1.0.0",
                "--notes",
                "Release v1.0.0",
                "--draft",
                "--repo",
                "me/app",
            ]
        );
        assert_eq!(calls[1].current_dir, Some(PathBuf::from("/p")));
    }

    #[test]
    fn test_upload_failure() {
        let runner = ScriptedRunner::new().on(
            "gh release create",
            CommandOutput::failure(1, "a release with the same tag name already exists"),
        );
        let host = GitHubReleaseHost::new(
            &runner,
            GitHubReleaseConfig::new().with_repo(Some("me/app".to_string())),
        );
        let err = host
            .upload(&ReleaseRequest {
                project_path: Path::new("/p"),
                version: "v1.0.0",
                notes: "n",
                archives: &[PathBuf::from("/p/App.tar.gz")],
            })
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }
}
