//! Error types for the release pipeline.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for release operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while publishing a release.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A version string could not be split into three integer components.
    #[error("Invalid version format: {version}")]
    #[diagnostic(
        code(brewship::release::invalid_version_format),
        help("The previous version must look like 1.2.3 or v1.2.3")
    )]
    InvalidVersionFormat {
        /// The version string that failed to parse
        version: String,
    },

    /// An explicitly supplied version failed validation.
    #[error("Invalid version number: {version}")]
    #[diagnostic(
        code(brewship::release::invalid_version_number),
        help("Versions must match major.minor.patch, optionally prefixed with 'v' (e.g. 1.0.0, v2.3.4)")
    )]
    InvalidVersionNumber {
        /// The rejected version string
        version: String,
    },

    /// An increment was requested but no earlier release is known.
    #[error("No previous version to increment")]
    #[diagnostic(
        code(brewship::release::no_previous_version),
        help("Pass an explicit version with --version for the first release")
    )]
    NoPreviousVersionToIncrement,

    /// The release-hosting CLI is not on PATH.
    #[error("Required command-line tool '{program}' is not installed")]
    #[diagnostic(code(brewship::release::missing_cli), help("{help}"))]
    MissingHostingCli {
        /// Program that was looked up
        program: String,
        /// Installation hint
        help: String,
    },

    /// The project has uncommitted local changes.
    #[error("Project has uncommitted changes:\n{summary}")]
    #[diagnostic(
        code(brewship::release::uncommitted_changes),
        help("Commit or stash your changes before publishing")
    )]
    UncommittedChanges {
        /// `git status --porcelain` output
        summary: String,
    },

    /// The toolchain failed to clean, compile or strip.
    #[error("Build failed: {command}")]
    #[diagnostic(code(brewship::release::build_failure))]
    BuildFailure {
        /// The command line that failed
        command: String,
        /// Captured stdout and stderr
        output: String,
    },

    /// The test command exited unsuccessfully.
    #[error("Tests failed: {command}")]
    #[diagnostic(
        code(brewship::release::test_failure),
        help("Re-run the command locally or pass --skip-tests to publish anyway")
    )]
    TestFailure {
        /// The test command that was run
        command: String,
        /// Captured test output
        output: String,
    },

    /// Archive creation failed.
    #[error("Archive error: {message}")]
    #[diagnostic(
        code(brewship::release::archive),
        help("Check that the binary exists and that 'tar' is available")
    )]
    Archive {
        /// The error message
        message: String,
        /// The path that caused the error
        path: Option<PathBuf>,
    },

    /// No SHA-256 could be obtained for an archive.
    #[error("Missing SHA-256 for {}", path.display())]
    #[diagnostic(code(brewship::release::missing_sha256))]
    MissingSha256 {
        /// Archive (or asset) the hash was expected for
        path: PathBuf,
    },

    /// The checksum tool disagreed with an in-process digest.
    #[error("Checksum mismatch for {}: tool reported {reported}, computed {computed}", path.display())]
    #[diagnostic(code(brewship::release::checksum_mismatch))]
    ChecksumMismatch {
        /// Archive path
        path: PathBuf,
        /// Hash parsed from the checksum tool
        reported: String,
        /// Hash computed in-process
        computed: String,
    },

    /// Updating the in-source version marker failed.
    #[error("Could not update source version: {message}")]
    #[diagnostic(code(brewship::release::version_marker))]
    VersionMarker {
        /// The error message
        message: String,
        /// File that was being rewritten
        path: Option<PathBuf>,
    },

    /// An external command could not be spawned.
    #[error("Failed to run '{command}': {source}")]
    #[diagnostic(code(brewship::release::command))]
    Command {
        /// The command line
        command: String,
        /// The spawn error
        #[source]
        source: std::io::Error,
    },

    /// A collaborator (release host, tap, git) failed.
    #[error("{backend} error: {message}")]
    #[diagnostic(code(brewship::release::backend))]
    Backend {
        /// The collaborator that failed
        backend: String,
        /// The error message
        message: String,
        /// Help text for the user
        #[help]
        help: Option<String>,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(brewship::release::config), help("{help}"))]
    Config {
        /// The error message
        message: String,
        /// Help text for the user
        help: String,
    },

    /// Wrapped I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(brewship::release::io))]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new invalid version format error.
    #[must_use]
    pub fn invalid_version_format(version: impl Into<String>) -> Self {
        Self::InvalidVersionFormat {
            version: version.into(),
        }
    }

    /// Create a new invalid version number error.
    #[must_use]
    pub fn invalid_version_number(version: impl Into<String>) -> Self {
        Self::InvalidVersionNumber {
            version: version.into(),
        }
    }

    /// Create a new missing CLI error.
    #[must_use]
    pub fn missing_cli(program: impl Into<String>, help: impl Into<String>) -> Self {
        Self::MissingHostingCli {
            program: program.into(),
            help: help.into(),
        }
    }

    /// Create a new build failure.
    #[must_use]
    pub fn build_failure(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self::BuildFailure {
            command: command.into(),
            output: output.into(),
        }
    }

    /// Create a new test failure.
    #[must_use]
    pub fn test_failure(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self::TestFailure {
            command: command.into(),
            output: output.into(),
        }
    }

    /// Create a new archive error.
    #[must_use]
    pub fn archive(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Archive {
            message: message.into(),
            path,
        }
    }

    /// Create a new missing SHA-256 error.
    #[must_use]
    pub fn missing_sha256(path: impl Into<PathBuf>) -> Self {
        Self::MissingSha256 { path: path.into() }
    }

    /// Create a new version marker error.
    #[must_use]
    pub fn version_marker(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::VersionMarker {
            message: message.into(),
            path,
        }
    }

    /// Create a new backend error.
    #[must_use]
    pub fn backend(
        backend: impl Into<String>,
        message: impl Into<String>,
        help: Option<String>,
    ) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
            help,
        }
    }

    /// Create a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Returns the captured output for build and test failures.
    #[must_use]
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Self::BuildFailure { output, .. } | Self::TestFailure { output, .. } => Some(output),
            _ => None,
        }
    }
}
