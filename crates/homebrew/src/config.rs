//! Project configuration (`brewship.toml`).

use brewship_release::builder::{TestDirective, Toolchain};
use brewship_release::error::{Error, Result};
use brewship_release::formula::FormulaDescriptor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration file name, looked up in the project root.
pub const CONFIG_FILE: &str = "brewship.toml";

/// Test command value selecting the toolchain's own test invocation.
pub const DEFAULT_TEST_COMMAND: &str = "default";

/// Complete project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Formula metadata and recorded build settings.
    pub formula: FormulaConfig,
    /// Tap checkout settings.
    #[serde(default)]
    pub tap: TapConfig,
    /// Release host settings.
    #[serde(default)]
    pub release: ReleaseHostConfig,
    /// Toolchain settings.
    #[serde(default)]
    pub build: BuildConfig,
}

/// `[formula]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaConfig {
    /// Formula name.
    pub name: String,
    /// One-line description.
    pub desc: String,
    /// Homepage URL.
    pub homepage: String,
    /// SPDX license identifier.
    pub license: String,
    /// Installed binary name; defaults to `name`.
    pub install_name: Option<String>,
    /// Flags appended to every release compile.
    pub extra_build_args: Vec<String>,
    /// Test command; `"default"` runs the toolchain's test invocation.
    pub test_command: Option<String>,
    /// Append the toolchain's required test flags to a custom command.
    pub amend_test_command: bool,
}

/// `[tap]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapConfig {
    /// Local tap checkout, relative to the project root unless absolute.
    pub path: PathBuf,
    /// Directory inside the tap holding formulae.
    pub formula_dir: PathBuf,
    /// Commit the formula after writing it.
    pub commit: bool,
    /// Push the tap after committing.
    pub push: bool,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("../homebrew-tap"),
            formula_dir: PathBuf::from("Formula"),
            commit: true,
            push: false,
        }
    }
}

/// `[release]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseHostConfig {
    /// Repository in "owner/repo" format.
    pub repo: Option<String>,
    /// Create releases as drafts.
    pub draft: bool,
    /// Mark releases as prereleases.
    pub prerelease: bool,
}

/// `[build]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Toolchain executable.
    pub tool: String,
    /// Strip executable.
    pub strip: String,
    /// Build output root, relative to the project root.
    pub build_root: PathBuf,
    /// Flags a custom test command must carry when amended.
    pub required_test_flags: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        let toolchain = Toolchain::default();
        Self {
            tool: toolchain.tool,
            strip: toolchain.strip,
            build_root: toolchain.build_root,
            required_test_flags: toolchain.required_test_flags,
        }
    }
}

impl ProjectConfig {
    /// Loads `brewship.toml` from the project root.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file is missing, unreadable,
    /// malformed, or has no formula name.
    pub fn load(project_path: &Path) -> Result<Self> {
        let path = project_path.join(CONFIG_FILE);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config(
                    format!("{} not found", path.display()),
                    format!("Create {CONFIG_FILE} with a [formula] table naming the formula"),
                )
            } else {
                Error::config(
                    format!("failed to read {}: {e}", path.display()),
                    "Check the file permissions",
                )
            }
        })?;
        debug!(path = %path.display(), "Loaded project configuration");
        Self::parse(&content, &path)
    }

    /// Parses configuration text; `origin` names the file in errors.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the text is malformed or has no
    /// formula name.
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            Error::config(
                format!("invalid {}: {}", origin.display(), e.message()),
                "See the configuration reference in readme.md",
            )
        })?;

        if config.formula.name.trim().is_empty() {
            return Err(Error::config(
                format!("{} has no formula name", origin.display()),
                "Set [formula] name = \"my-tool\"",
            ));
        }
        Ok(config)
    }

    /// The formula descriptor this configuration describes.
    #[must_use]
    pub fn descriptor(&self) -> FormulaDescriptor {
        let formula = &self.formula;
        let descriptor = FormulaDescriptor::new(&formula.name)
            .with_desc(&formula.desc)
            .with_homepage(&formula.homepage)
            .with_license(&formula.license);
        match &formula.install_name {
            Some(install_name) => descriptor.with_install_name(install_name),
            None => descriptor,
        }
    }

    /// The recorded test directive, if tests are configured.
    #[must_use]
    pub fn test_directive(&self) -> Option<TestDirective> {
        let command = self.formula.test_command.as_deref()?.trim();
        if command.is_empty() {
            None
        } else if command == DEFAULT_TEST_COMMAND {
            Some(TestDirective::Default)
        } else {
            Some(TestDirective::Custom {
                command: command.to_string(),
                amend: self.formula.amend_test_command,
            })
        }
    }

    /// Toolchain settings from the `[build]` table.
    #[must_use]
    pub fn toolchain(&self) -> Toolchain {
        Toolchain {
            tool: self.build.tool.clone(),
            strip: self.build.strip.clone(),
            build_root: self.build.build_root.clone(),
            required_test_flags: self.build.required_test_flags.clone(),
        }
    }

    /// Absolute tap location for a project root.
    #[must_use]
    pub fn tap_path(&self, project_path: &Path) -> PathBuf {
        if self.tap.path.is_absolute() {
            self.tap.path.clone()
        } else {
            project_path.join(&self.tap.path)
        }
    }
}
