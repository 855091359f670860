//! Blake3 hashing utilities for source checksums.
//!
//! Provides deterministic checksums over a set of source files, used when
//! recording roots in a lockfile.

use crate::error::{AbleError, AbleResult};
use camino::Utf8Path;

/// Prefix recorded in front of every checksum
pub const CHECKSUM_PREFIX: &str = "blake3:";

/// Compute Blake3 hash of data
pub fn blake3_hash(data: &[u8]) -> String {
    let hash = blake3::hash(data);
    hash.to_hex().to_string()
}

/// Checksum a set of files below `base`.
///
/// Files are hashed in sorted order together with their path relative to
/// `base`, so renames change the checksum and input order does not.
pub fn checksum_files<P: AsRef<Utf8Path>>(base: &Utf8Path, files: &[P]) -> AbleResult<String> {
    let mut sorted: Vec<&Utf8Path> = files.iter().map(AsRef::as_ref).collect();
    sorted.sort();
    sorted.dedup();

    let mut hasher = blake3::Hasher::new();
    for path in sorted {
        let data = std::fs::read(path)
            .map_err(|e| AbleError::io(format!("Failed to read file: {}", path), e))?;
        let relative = path.strip_prefix(base).unwrap_or(path);
        hasher.update(relative.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(&data);
    }

    Ok(format!("{}{}", CHECKSUM_PREFIX, hasher.finalize().to_hex()))
}
