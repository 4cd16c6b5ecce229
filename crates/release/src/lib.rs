//! Release pipeline for command-line tools distributed through Homebrew.
//!
//! One publish takes a clean project checkout to a tagged release with
//! per-architecture archives and an updated formula in a tap:
//!
//! 1. resolve the version (explicit, or incremented from the last release)
//! 2. optionally rewrite the in-source version marker
//! 3. build for arm64 and/or x86_64, strip, and test
//! 4. archive each binary and checksum the archive
//! 5. create the release and upload the archives
//! 6. render the formula and commit it to the tap
//!
//! # Architecture
//!
//! - [`version`] - version validation, increment and resolution
//! - [`builder`] - multi-architecture build plans
//! - [`archive`] - archiving and SHA-256 checksums
//! - [`formula`] - formula rendering
//! - [`marker`] - in-source version marker
//! - [`orchestrator`] - sequences the above
//! - [`backends`] - release host and formula target seams
//! - [`runner`] - external command execution
//!
//! # Example
//!
//! ```rust,ignore
//! use brewship_release::{PublishOptions, PublishOrchestrator, SystemRunner, VersionDirective, VersionPart};
//!
//! let runner = SystemRunner::new();
//! let orchestrator = PublishOrchestrator::new(&runner, &host, &tap);
//! let options = PublishOptions::new(".", VersionDirective::Increment(VersionPart::Patch));
//! let bundle = orchestrator.publish(&options)?;
//! println!("{}", bundle.formula);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod arch;
pub mod archive;
pub mod backends;
pub mod builder;
pub mod error;
pub mod events;
pub mod formula;
pub mod git;
pub mod marker;
pub mod orchestrator;
pub mod runner;
pub mod version;

// Re-export main types
pub use arch::{ArchSet, Architecture};
pub use archive::{ArchivedBinary, BinaryArchiver};
pub use backends::{FormulaRecord, FormulaTarget, ReleaseHost, ReleaseRequest};
pub use builder::{BinaryOutput, BuildRequest, BuildStep, MultiArchBuilder, TestDirective, Toolchain};
pub use error::{Error, Result};
pub use formula::{AssetRef, FormulaAssets, FormulaDescriptor, FormulaGenerator};
pub use git::Git;
pub use marker::{MarkerPattern, VersionMarker};
pub use orchestrator::{PublishOptions, PublishOrchestrator, PublishPlan, ReleaseArtifactBundle};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, ScriptedRunner, SystemRunner};
pub use version::{VersionDirective, VersionPart};
