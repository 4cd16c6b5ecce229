//! Binary archiving and checksums.
//!
//! Each binary is compressed beside itself into
//! `<file><arch-suffix>.tar.gz`, where the suffix comes from the toolchain
//! triple in the binary's path (`-arm64`, `-x86_64`, or nothing). The
//! archive holds only the bare file name. Its SHA-256 is taken from the
//! checksum tool's `<hex>  <path>` output.

use crate::arch::Architecture;
use crate::emit_archive_created;
use crate::error::{Error, Result};
use crate::runner::{CommandRunner, CommandSpec, path_arg};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extension every archive carries.
pub const ARCHIVE_EXTENSION: &str = ".tar.gz";

/// A binary that has been archived and hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedBinary {
    /// The original binary.
    pub binary_path: PathBuf,
    /// The `.tar.gz` beside it.
    pub archive_path: PathBuf,
    /// Lowercase hex SHA-256 of the archive file.
    pub sha256: String,
}

impl ArchivedBinary {
    /// Architecture this archive was built for, from its binary path.
    #[must_use]
    pub fn architecture(&self) -> Option<Architecture> {
        Architecture::from_path(&self.binary_path.to_string_lossy())
    }

    /// File name of the archive.
    #[must_use]
    pub fn archive_name(&self) -> String {
        self.archive_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Re-digests the archive in-process and compares with the recorded hash.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChecksumMismatch`] if the digests differ, or an
    /// archive error if the file cannot be read.
    pub fn verify(&self) -> Result<()> {
        let computed = compute_sha256(&self.archive_path)?;
        if computed == self.sha256 {
            Ok(())
        } else {
            Err(Error::ChecksumMismatch {
                path: self.archive_path.clone(),
                reported: self.sha256.clone(),
                computed,
            })
        }
    }
}

/// Archive name for a binary: `<file><suffix>.tar.gz`.
#[must_use]
pub fn archive_file_name(binary_path: &Path) -> String {
    let file_name = binary_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = Architecture::from_path(&binary_path.to_string_lossy())
        .map_or("", |arch| arch.archive_suffix());
    format!("{file_name}{suffix}{ARCHIVE_EXTENSION}")
}

/// Extracts the hash from checksum tool output (`<hex><whitespace><path>`).
///
/// # Errors
///
/// Returns [`Error::MissingSha256`] if the first token is empty.
pub fn parse_checksum_output(output: &str, archive: &Path) -> Result<String> {
    output
        .split_whitespace()
        .next()
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .ok_or_else(|| Error::missing_sha256(archive))
}

/// Computes the SHA-256 of a file in-process.
///
/// # Errors
///
/// Returns an archive error if the file cannot be opened or read.
pub fn compute_sha256(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| {
        Error::archive(
            format!("Failed to open file for checksum: {e}"),
            Some(path.to_path_buf()),
        )
    })?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(|e| {
            Error::archive(
                format!("Failed to read file for checksum: {e}"),
                Some(path.to_path_buf()),
            )
        })?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Archives binaries with `tar` and hashes them with `shasum`.
pub struct BinaryArchiver<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
}

impl<'a, R: CommandRunner + ?Sized> BinaryArchiver<'a, R> {
    /// Creates a new archiver.
    #[must_use]
    pub const fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// Archives and hashes each binary, in the order given.
    ///
    /// Each archive is created and immediately hashed before the next
    /// binary is touched, so results pair 1:1 with the input.
    ///
    /// # Errors
    ///
    /// Returns an archive error if `tar` fails and
    /// [`Error::MissingSha256`] if the checksum tool yields no hash.
    /// Archives created before the failure stay on disk.
    pub fn archive<P: AsRef<Path>>(&self, binaries: &[P]) -> Result<Vec<ArchivedBinary>> {
        binaries
            .iter()
            .map(|binary| self.archive_one(binary.as_ref()))
            .collect()
    }

    fn archive_one(&self, binary: &Path) -> Result<ArchivedBinary> {
        let (Some(dir), Some(file_name)) = (binary.parent(), binary.file_name()) else {
            return Err(Error::archive(
                "Binary path has no file name",
                Some(binary.to_path_buf()),
            ));
        };

        let archive_name = archive_file_name(binary);
        let archive_path = dir.join(&archive_name);

        let tar = CommandSpec::new("tar")
            .arg("-czf")
            .arg(&archive_name)
            .arg(file_name.to_string_lossy())
            .current_dir(dir);
        let output = self.runner.run(&tar)?;
        if !output.is_success() {
            return Err(Error::archive(
                format!("'{tar}' failed: {}", output.combined()),
                Some(binary.to_path_buf()),
            ));
        }

        let shasum = CommandSpec::new("shasum")
            .args(["-a", "256"])
            .arg(path_arg(&archive_path));
        let output = self.runner.run(&shasum)?;
        if !output.is_success() {
            debug!(stderr = %output.stderr, "Checksum tool failed");
            return Err(Error::missing_sha256(&archive_path));
        }
        let sha256 = parse_checksum_output(&output.stdout, &archive_path)?;

        emit_archive_created!(archive_path, sha256);

        Ok(ArchivedBinary {
            binary_path: binary.to_path_buf(),
            archive_path,
            sha256,
        })
    }

    /// Removes archives. Paths not ending in `.tar.gz` are left alone.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if an existing archive cannot be removed.
    pub fn cleanup<P: AsRef<Path>>(&self, archives: &[P]) -> Result<()> {
        for path in archives {
            let path = path.as_ref();
            if !path.to_string_lossy().ends_with(ARCHIVE_EXTENSION) {
                debug!(path = %path.display(), "Skipping cleanup of non-archive");
                continue;
            }
            match std::fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "Removed archive"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(path = %path.display(), "Archive already removed");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
