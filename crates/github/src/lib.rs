//! GitHub Releases host for brewship.
//!
//! This crate provides the [`GitHubReleaseHost`], which creates a tagged
//! release and uploads the per-architecture archives through the `gh` CLI.
//!
//! # Example
//!
//! ```rust,ignore
//! use brewship_github::{GitHubReleaseConfig, GitHubReleaseHost};
//! use brewship_release::SystemRunner;
//!
//! let runner = SystemRunner::new();
//! let host = GitHubReleaseHost::new(
//!     &runner,
//!     GitHubReleaseConfig::new().with_repo(Some("me/my-tool".to_string())),
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

mod release;

pub use release::{GitHubReleaseConfig, GitHubReleaseHost, asset_url, parse_repo_slug};
