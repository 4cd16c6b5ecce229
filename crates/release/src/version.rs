//! Version validation and resolution.
//!
//! Versions are plain `major.minor.patch` triples with an optional leading
//! `v`. Pre-release and build metadata are deliberately not accepted.

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^v?\d+\.\d+\.\d+$").expect("static version pattern is valid")
});

/// Which component of a version to increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionPart {
    /// `(m+1, 0, 0)`
    Major,
    /// `(m, n+1, 0)`
    Minor,
    /// `(m, n, p+1)`
    Patch,
}

impl fmt::Display for VersionPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Patch => write!(f, "patch"),
        }
    }
}

impl FromStr for VersionPart {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            _ => Err(Error::config(
                format!("Unknown version part: {s}"),
                "Valid parts: major, minor, patch",
            )),
        }
    }
}

/// How the version for a publish is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionDirective {
    /// Use this version verbatim after validation.
    Explicit(String),
    /// Increment the previous version.
    Increment(VersionPart),
}

/// Returns true iff `version` is `major.minor.patch` with an optional `v`.
#[must_use]
pub fn is_valid(version: &str) -> bool {
    VERSION_PATTERN.is_match(version)
}

/// Increments `previous` by `part`, keeping a leading `v` if present.
///
/// # Errors
///
/// Returns [`Error::InvalidVersionFormat`] if `previous` is not three
/// dot-separated integers, or if the bumped component would overflow.
pub fn increment(part: VersionPart, previous: &str) -> Result<String> {
    let (prefix, bare) = match previous.strip_prefix('v') {
        Some(rest) => ("v", rest),
        None => ("", previous),
    };

    let components = bare
        .split('.')
        .map(str::parse::<u64>)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| Error::invalid_version_format(previous))?;

    let [major, minor, patch] = components[..] else {
        return Err(Error::invalid_version_format(previous));
    };

    let bumped = match part {
        VersionPart::Major => major.checked_add(1).map(|major| (major, 0, 0)),
        VersionPart::Minor => minor.checked_add(1).map(|minor| (major, minor, 0)),
        VersionPart::Patch => patch.checked_add(1).map(|patch| (major, minor, patch)),
    };
    let (major, minor, patch) = bumped.ok_or_else(|| Error::invalid_version_format(previous))?;

    Ok(format!("{prefix}{major}.{minor}.{patch}"))
}

/// Resolves the version for a publish.
///
/// Explicit versions are validated and returned untouched; only the
/// increment path is aware of the `v` prefix.
///
/// # Errors
///
/// - [`Error::InvalidVersionNumber`] for an explicit version failing [`is_valid`]
/// - [`Error::NoPreviousVersionToIncrement`] for an increment without a previous version
/// - [`Error::InvalidVersionFormat`] if the previous version does not parse
pub fn resolve(directive: &VersionDirective, previous: Option<&str>) -> Result<String> {
    match directive {
        VersionDirective::Explicit(version) => {
            if is_valid(version) {
                Ok(version.clone())
            } else {
                Err(Error::invalid_version_number(version))
            }
        }
        VersionDirective::Increment(part) => {
            let previous = previous.ok_or(Error::NoPreviousVersionToIncrement)?;
            increment(*part, previous)
        }
    }
}

/// Strips one leading `v`, as rendered in formula files.
#[must_use]
pub fn strip_prefix(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}
