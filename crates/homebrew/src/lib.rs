//! Homebrew tap target for brewship.
//!
//! This crate provides the [`TapTarget`], which supplies the formula record
//! from the project's `brewship.toml` and a local tap checkout, and writes
//! the rendered formula back into the tap.
//!
//! # Features
//!
//! - Project configuration (`brewship.toml`)
//! - Previous version discovery from the published formula
//! - Formula replacement with optional commit and push
//!
//! # Example
//!
//! ```rust,ignore
//! use brewship_homebrew::{ProjectConfig, TapTarget};
//! use brewship_release::SystemRunner;
//! use std::path::Path;
//!
//! let project = Path::new(".");
//! let config = ProjectConfig::load(project)?;
//! let runner = SystemRunner::new();
//! let tap = TapTarget::new(&runner, config, project);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

mod config;
mod tap;

pub use config::{
    BuildConfig, CONFIG_FILE, DEFAULT_TEST_COMMAND, FormulaConfig, ProjectConfig,
    ReleaseHostConfig, TapConfig,
};
pub use tap::{TapTarget, previous_version};
