//! Target architectures.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A CPU architecture the toolchain can build for.
///
/// The derived ordering puts `Arm64` first; every multi-architecture
/// sequence in the pipeline (builds, archives, uploads, formula blocks)
/// follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Architecture {
    /// Apple Silicon
    Arm64,
    /// Intel
    X86_64,
}

impl Architecture {
    /// Name passed to `--arch`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Arm64 => "arm64",
            Self::X86_64 => "x86_64",
        }
    }

    /// Toolchain triple fragment, also the build output directory name.
    #[must_use]
    pub const fn triple(&self) -> &'static str {
        match self {
            Self::Arm64 => "arm64-apple-macosx",
            Self::X86_64 => "x86_64-apple-macosx",
        }
    }

    /// Suffix appended to archive names.
    #[must_use]
    pub const fn archive_suffix(&self) -> &'static str {
        match self {
            Self::Arm64 => "-arm64",
            Self::X86_64 => "-x86_64",
        }
    }

    /// Classifies a path by the triple it contains.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        if path.contains(Self::Arm64.triple()) {
            Some(Self::Arm64)
        } else if path.contains(Self::X86_64.triple()) {
            Some(Self::X86_64)
        } else {
            None
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Architecture {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "arm64" | "arm" => Ok(Self::Arm64),
            "x86_64" | "intel" => Ok(Self::X86_64),
            _ => Err(Error::config(
                format!("Unknown architecture: {s}"),
                "Valid architectures: arm64, x86_64",
            )),
        }
    }
}

/// The set of architectures requested for one publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArchSet {
    /// Apple Silicon only
    Arm64,
    /// Intel only
    X86_64,
    /// Both, arm64 first
    #[default]
    Universal,
}

impl ArchSet {
    /// Architectures in build order.
    #[must_use]
    pub const fn architectures(&self) -> &'static [Architecture] {
        match self {
            Self::Arm64 => &[Architecture::Arm64],
            Self::X86_64 => &[Architecture::X86_64],
            Self::Universal => &[Architecture::Arm64, Architecture::X86_64],
        }
    }

    /// Whether more than one architecture is built.
    #[must_use]
    pub const fn is_universal(&self) -> bool {
        matches!(self, Self::Universal)
    }
}

impl fmt::Display for ArchSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arm64 => write!(f, "arm64"),
            Self::X86_64 => write!(f, "x86_64"),
            Self::Universal => write!(f, "universal"),
        }
    }
}

impl FromStr for ArchSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "arm64" => Ok(Self::Arm64),
            "x86_64" => Ok(Self::X86_64),
            "universal" => Ok(Self::Universal),
            _ => Err(Error::config(
                format!("Unknown architecture set: {s}"),
                "Valid values: arm64, x86_64, universal",
            )),
        }
    }
}
