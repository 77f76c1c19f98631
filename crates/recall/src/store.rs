//! On-disk keyed store for one memoized function.
//!
//! The store holds the full entry mapping in memory and rewrites its file
//! wholesale on persist. Reads are forgiving: a missing, unreadable, or
//! corrupt file is recovered as an empty store rather than surfaced to the
//! caller, so a damaged cache costs recomputation, never a failure.
//!
//! # File layout
//!
//! ```text
//! <module>.<function>.cache      # JSON: schema, fingerprint, saved_at, entries
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{RecallError, RecallResult};
use crate::key::CacheKey;

/// On-disk format version; anything else is treated as corrupt.
const SCHEMA_VERSION: u32 = 1;

/// Serialized form of a store.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    /// Format version.
    schema: u32,

    /// Fingerprint of the source file that produced `entries`.
    #[serde(default)]
    fingerprint: Option<String>,

    /// When the store was last persisted.
    saved_at: DateTime<Utc>,

    /// Memoized results keyed by canonical argument hash.
    entries: HashMap<CacheKey, Value>,
}

/// In-memory cache store bound to one wrapped function.
#[derive(Debug, Default)]
pub struct MemoStore {
    entries: HashMap<CacheKey, Value>,
    fingerprint: Option<String>,
    dirty: bool,
}

impl MemoStore {
    /// Create an empty store with no fingerprint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store persisted at `path`.
    ///
    /// A missing file is the normal first run and yields an empty store.
    /// An unreadable or unparsable file yields the same, with a warning:
    /// the recovery path for corruption is recomputation, not an error.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no cache file, starting empty");
                return Self::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cache file unreadable, starting empty");
                return Self::new();
            }
        };

        let file: CacheFile = match serde_json::from_str(&content) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cache file corrupt, starting empty");
                return Self::new();
            }
        };

        if file.schema != SCHEMA_VERSION {
            warn!(
                path = %path.display(),
                schema = file.schema,
                "cache file has unknown schema, starting empty"
            );
            return Self::new();
        }

        debug!(
            path = %path.display(),
            entries = file.entries.len(),
            "loaded cache file"
        );
        Self {
            entries: file.entries,
            fingerprint: file.fingerprint,
            dirty: false,
        }
    }

    /// Look up a memoized value. Pure read.
    pub fn lookup(&self, key: &CacheKey) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Add or overwrite an entry and mark the store dirty.
    pub fn insert(&mut self, key: CacheKey, value: Value) {
        self.entries.insert(key, value);
        self.dirty = true;
    }

    /// Serialize the full mapping plus fingerprint to `path`.
    ///
    /// Writes to `<path>.tmp` and renames into place, so a crash mid-write
    /// leaves either the old file or an orphan temp file that the loader
    /// never reads as valid data.
    pub fn persist(&mut self, path: &Path) -> RecallResult<()> {
        let file = CacheFile {
            schema: SCHEMA_VERSION,
            fingerprint: self.fingerprint.clone(),
            saved_at: Utc::now(),
            entries: self.entries.clone(),
        };

        let json = serde_json::to_string_pretty(&file).map_err(|e| RecallError::Cache {
            message: format!("failed to serialize cache: {}", e),
        })?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| RecallError::Cache {
                    message: format!("failed to create cache directory: {}", e),
                })?;
            }
        }

        write_atomic(path, &json)?;
        self.dirty = false;

        debug!(path = %path.display(), entries = self.entries.len(), "persisted cache");
        Ok(())
    }

    /// Clear all entries and the fingerprint, keeping the store alive for
    /// immediate reuse with a freshly computed fingerprint.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.fingerprint = None;
        self.dirty = true;
    }

    /// Fingerprint of the source file that produced the current entries.
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// Record the fingerprint the current entries are valid for.
    pub fn set_fingerprint(&mut self, hex: impl Into<String>) {
        self.fingerprint = Some(hex.into());
    }

    /// Number of memoized entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when in-memory state has diverged from disk.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

fn write_atomic(path: &Path, content: &str) -> RecallResult<()> {
    let temp_path = path.with_extension("tmp");

    fs::write(&temp_path, content).map_err(|e| RecallError::Cache {
        message: format!("failed to write temp file: {}", e),
    })?;

    fs::rename(&temp_path, path).map_err(|e| RecallError::Cache {
        message: format!("failed to rename temp file: {}", e),
    })?;

    Ok(())
}
