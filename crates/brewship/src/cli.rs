//! Command-line interface definition.

use crate::tracing::{LogLevel, TracingFormat};
use brewship_release::{ArchSet, VersionPart};
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for command results.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON for scripts and CI
    Json,
}

/// Main CLI entry point for brewship.
///
/// Builds, archives, releases and publishes a command-line tool to a Homebrew tap.
#[derive(Parser, Debug)]
#[command(name = "brewship")]
#[command(about = "Publish command-line tools to a Homebrew tap in one step")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Log output format.
    #[arg(
        long,
        global = true,
        help = "Log output format",
        default_value = "compact",
        value_enum
    )]
    pub log_format: TracingFormat,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build, release and publish a new version.
    #[command(about = "Build, release and publish a new version to the tap")]
    #[command(group(ArgGroup::new("version_source").required(true).args(["version", "bump"])))]
    Publish {
        /// Project root containing brewship.toml.
        #[arg(long, short = 'p', default_value = ".", help = "Project directory")]
        path: PathBuf,

        /// Explicit version to release.
        #[arg(long, help = "Version to release, e.g. 1.2.0 or v1.2.0")]
        version: Option<String>,

        /// Version component to increment.
        #[arg(long, help = "Increment the previous version: major, minor or patch")]
        bump: Option<VersionPart>,

        /// Architectures to build.
        #[arg(
            long,
            default_value = "universal",
            help = "Architectures to build: arm64, x86_64 or universal"
        )]
        arch: ArchSet,

        /// Skip cleaning previous build products.
        #[arg(long, help = "Skip the clean step")]
        skip_clean: bool,

        /// Skip the configured tests.
        #[arg(long, help = "Skip the configured test command")]
        skip_tests: bool,

        /// Release notes text.
        #[arg(long, conflicts_with = "notes_file", help = "Release notes")]
        notes: Option<String>,

        /// File with release notes.
        #[arg(long, help = "Read release notes from a file")]
        notes_file: Option<PathBuf>,

        /// Rewrite the version in the source entry point and commit it.
        #[arg(long, help = "Update and commit the in-source version before building")]
        update_source_version: bool,

        /// Skip the in-process checksum verification.
        #[arg(long, help = "Trust the checksum tool without re-digesting archives")]
        no_verify: bool,

        /// Show the plan without building or publishing.
        #[arg(long, help = "Resolve the version and print the plan only")]
        dry_run: bool,

        /// Output format for the result.
        #[arg(
            long = "output",
            short = 'o',
            value_enum,
            default_value_t = OutputFormat::Text,
            help = "Output format"
        )]
        output_format: OutputFormat,
    },

    /// Print the version following another one.
    #[command(about = "Print the next version after incrementing one component")]
    NextVersion {
        /// Component to increment.
        #[arg(long, help = "major, minor or patch")]
        bump: VersionPart,

        /// Version to increment from.
        #[arg(long, help = "Previous version, e.g. v1.2.3")]
        from: String,
    },

    /// Render formula text without building or releasing.
    #[command(about = "Render a formula for already-released assets")]
    Formula {
        /// Project root containing brewship.toml.
        #[arg(long, short = 'p', default_value = ".", help = "Project directory")]
        path: PathBuf,

        /// Version to render.
        #[arg(long, help = "Released version")]
        version: String,

        /// Apple Silicon asset URL.
        #[arg(long, requires = "arm_sha", help = "arm64 archive URL")]
        arm_url: Option<String>,

        /// Apple Silicon asset SHA-256.
        #[arg(long, requires = "arm_url", help = "arm64 archive SHA-256")]
        arm_sha: Option<String>,

        /// Intel asset URL.
        #[arg(long, requires = "intel_sha", help = "x86_64 archive URL")]
        intel_url: Option<String>,

        /// Intel asset SHA-256.
        #[arg(long, requires = "intel_url", help = "x86_64 archive SHA-256")]
        intel_sha: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["brewship", "publish", "--bump", "patch"]).unwrap();
        assert_eq!(cli.level, LogLevel::Warn);
        assert_eq!(cli.log_format, TracingFormat::Compact);

        let Commands::Publish {
            path,
            version,
            bump,
            arch,
            skip_clean,
            skip_tests,
            notes,
            dry_run,
            output_format,
            ..
        } = cli.command
        else {
            panic!("expected publish");
        };
        assert_eq!(path, PathBuf::from("."));
        assert!(version.is_none());
        assert_eq!(bump, Some(VersionPart::Patch));
        assert_eq!(arch, ArchSet::Universal);
        assert!(!skip_clean);
        assert!(!skip_tests);
        assert!(notes.is_none());
        assert!(!dry_run);
        assert_eq!(output_format, OutputFormat::Text);
    }

    #[test]
    fn test_cli_log_options() {
        let cli = Cli::try_parse_from([
            "brewship",
            "--level",
            "debug",
            "--log-format",
            "json",
            "next-version",
            "--bump",
            "minor",
            "--from",
            "1.0.0",
        ])
        .unwrap();
        assert_eq!(cli.level, LogLevel::Debug);
        assert_eq!(cli.log_format, TracingFormat::Json);

        let cli = Cli::try_parse_from([
            "brewship",
            "next-version",
            "--bump",
            "major",
            "--from",
            "v2.0.0",
            "-L",
            "error",
        ])
        .unwrap();
        assert_eq!(cli.level, LogLevel::Error);
    }

    #[test]
    fn test_publish_requires_version_source() {
        assert!(Cli::try_parse_from(["brewship", "publish"]).is_err());
        assert!(
            Cli::try_parse_from(["brewship", "publish", "--version", "1.0.0", "--bump", "patch"])
                .is_err()
        );
        assert!(Cli::try_parse_from(["brewship", "publish", "--version", "1.0.0"]).is_ok());
    }

    #[test]
    fn test_publish_flags() {
        let cli = Cli::try_parse_from([
            "brewship",
            "publish",
            "--path",
            "/src/app",
            "--version",
            "v1.2.0",
            "--arch",
            "arm64",
            "--skip-clean",
            "--skip-tests",
            "--notes-file",
            "NOTES.md",
            "--update-source-version",
            "--dry-run",
            "-o",
            "json",
        ])
        .unwrap();
        let Commands::Publish {
            path,
            version,
            arch,
            skip_clean,
            skip_tests,
            notes_file,
            update_source_version,
            dry_run,
            output_format,
            ..
        } = cli.command
        else {
            panic!("expected publish");
        };
        assert_eq!(path, PathBuf::from("/src/app"));
        assert_eq!(version.as_deref(), Some("v1.2.0"));
        assert_eq!(arch, ArchSet::Arm64);
        assert!(skip_clean && skip_tests && update_source_version && dry_run);
        assert_eq!(notes_file, Some(PathBuf::from("NOTES.md")));
        assert_eq!(output_format, OutputFormat::Json);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Cli::try_parse_from(["brewship", "publish", "--bump", "huge"]).is_err());
        assert!(
            Cli::try_parse_from(["brewship", "publish", "--bump", "patch", "--arch", "ppc"])
                .is_err()
        );
        assert!(
            Cli::try_parse_from([
                "brewship",
                "publish",
                "--bump",
                "patch",
                "--notes",
                "x",
                "--notes-file",
                "y"
            ])
            .is_err()
        );
    }

    #[test]
    fn test_formula_pairs_required() {
        assert!(
            Cli::try_parse_from([
                "brewship",
                "formula",
                "--version",
                "1.0.0",
                "--arm-url",
                "https://x/a.tar.gz"
            ])
            .is_err()
        );
        let cli = Cli::try_parse_from([
            "brewship",
            "formula",
            "--version",
            "1.0.0",
            "--intel-url",
            "https://x/i.tar.gz",
            "--intel-sha",
            "abc",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Formula {
                arm_url: None,
                intel_url: Some(_),
                ..
            }
        ));
    }
}
