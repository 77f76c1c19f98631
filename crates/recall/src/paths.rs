//! Cache file naming and location.
//!
//! One cache file per wrapped function, named from the function's identity:
//! `<module>.<function>.cache`, where `module` is the defining source
//! file's stem. Names are slugged so they are valid on every filesystem.

use std::path::{Path, PathBuf};

use crate::error::{RecallError, RecallResult};

/// Lowercases `value` and reduces it to `[a-z0-9_-]`, collapsing
/// whitespace runs to a single `-` and dropping everything else.
pub(crate) fn slug(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_dash = false;

    for c in value.trim().chars() {
        if c.is_whitespace() {
            pending_dash = !out.is_empty();
            continue;
        }
        for lc in c.to_lowercase() {
            if lc.is_ascii_alphanumeric() || lc == '_' || lc == '-' {
                if pending_dash {
                    out.push('-');
                    pending_dash = false;
                }
                out.push(lc);
            }
        }
    }

    out
}

/// File name for the cache of `function` defined in `module`.
pub(crate) fn cache_file_name(module: &str, function: &str) -> String {
    format!("{}.{}.cache", slug(module), slug(function))
}

/// Full path for the cache file of `function` defined in `source`.
///
/// The file lands in `cache_dir` when given, otherwise it is a bare
/// relative path resolved against the current working directory.
pub(crate) fn cache_file_path(
    cache_dir: Option<&Path>,
    source: &Path,
    function: &str,
) -> RecallResult<PathBuf> {
    let module = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| RecallError::Source {
            path: source.display().to_string(),
            message: "path has no file name to derive a cache name from".to_string(),
        })?;

    let file_name = cache_file_name(&module, function);
    Ok(match cache_dir {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    })
}
