//! Source-file fingerprinting for cache invalidation.
//!
//! A cache written by one version of a function must not be served by
//! another. The fingerprint is a sha256 over the defining source file's
//! bytes: any edit changes it, an unmodified file always reproduces it.
//! The stored fingerprint is compared once per process, at wrap time.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::{RecallError, RecallResult};

/// Fingerprint of a wrapped function's defining source file.
#[derive(Debug, Clone)]
pub struct SourceFingerprint {
    /// sha256 of the file's content.
    pub hex: String,

    /// File modification time, when the filesystem reports one.
    pub modified: Option<DateTime<Utc>>,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// Computes the fingerprint of the source file at `path`.
pub fn compute(path: &Path) -> RecallResult<SourceFingerprint> {
    let bytes = fs::read(path).map_err(|e| RecallError::Source {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from);

    Ok(SourceFingerprint {
        hex: sha256_hex(&bytes),
        modified,
    })
}

/// True iff a store validated against `stored` must be discarded.
///
/// An absent stored fingerprint means a fresh store and also invalidates,
/// so a store is never kept without a recorded fingerprint.
pub fn should_invalidate(stored: Option<&str>, current: &SourceFingerprint) -> bool {
    match stored {
        Some(hex) => hex != current.hex,
        None => true,
    }
}
