//! Command implementations.
//!
//! Each command returns the text to print on stdout; diagnostics and
//! progress go through tracing on stderr.

pub mod formula;
pub mod next_version;
pub mod publish;

use crate::cli::Commands;
use brewship_release::VersionDirective;
use publish::PublishArgs;

/// Runs a parsed command and returns its stdout text.
pub fn execute(command: Commands) -> miette::Result<String> {
    let output = match command {
        Commands::Publish {
            path,
            version,
            bump,
            arch,
            skip_clean,
            skip_tests,
            notes,
            notes_file,
            update_source_version,
            no_verify,
            dry_run,
            output_format,
        } => {
            let directive = match (version, bump) {
                (Some(version), _) => VersionDirective::Explicit(version),
                (None, Some(part)) => VersionDirective::Increment(part),
                (None, None) => {
                    return Err(miette::miette!(
                        help = "Pass --version <V> or --bump <major|minor|patch>",
                        "No version given"
                    ));
                }
            };
            publish::execute(&PublishArgs {
                path,
                directive,
                arch,
                skip_clean,
                skip_tests,
                notes,
                notes_file,
                update_source_version,
                verify_checksums: !no_verify,
                dry_run,
                output_format,
            })?
        }
        Commands::NextVersion { bump, from } => next_version::execute(bump, &from)?,
        Commands::Formula {
            path,
            version,
            arm_url,
            arm_sha,
            intel_url,
            intel_sha,
        } => formula::execute(
            &path,
            &version,
            arm_url.zip(arm_sha),
            intel_url.zip(intel_sha),
        )?,
    };
    Ok(output)
}
