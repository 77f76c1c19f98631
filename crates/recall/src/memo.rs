//! The memoizing wrapper.
//!
//! `Memo` is an explicit adapter around a callable: it owns the function,
//! the store, and the cache file path, and exposes the same call contract
//! as the function itself. Construction resolves the cache file, loads any
//! persisted entries, and runs the invalidation check once; each call then
//! either replays a stored result or invokes the function and records it.

use std::convert::Infallible;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::RecallResult;
use crate::fingerprint;
use crate::key::CacheKey;
use crate::paths;
use crate::store::MemoStore;

/// Where the wrapped function is defined.
///
/// Callers typically pass `file!()`. `Unavailable` covers functions with
/// no resolvable backing file; those wrappers memoize in memory only,
/// since a cache that cannot be validated against a source must never be
/// persisted.
#[derive(Debug, Clone)]
pub enum SourceRef {
    /// Path to the defining source file.
    File(PathBuf),

    /// No backing file; persistence is disabled.
    Unavailable,
}

/// Builder for [`Memo`].
#[derive(Debug, Clone)]
pub struct MemoBuilder {
    name: String,
    source: SourceRef,
    cache_dir: Option<PathBuf>,
}

impl MemoBuilder {
    /// Start building a wrapper for the function called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: SourceRef::Unavailable,
            cache_dir: None,
        }
    }

    /// Set the defining source file, normally `file!()`.
    pub fn source_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = SourceRef::File(path.into());
        self
    }

    /// Set the source reference explicitly.
    pub fn source(mut self, source: SourceRef) -> Self {
        self.source = source;
        self
    }

    /// Override the directory the cache file is written to.
    ///
    /// Default is the current working directory.
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Wrap a fallible callable.
    ///
    /// `Err` results propagate to the caller unchanged and are never
    /// cached.
    pub fn wrap<A, R, E, F>(self, func: F) -> RecallResult<Memo<A, R, E, F>>
    where
        F: FnMut(&A) -> Result<R, E>,
    {
        let (cache_path, store, fingerprint) = match &self.source {
            SourceRef::File(source) => match fingerprint::compute(source) {
                Ok(current) => {
                    let path =
                        paths::cache_file_path(self.cache_dir.as_deref(), source, &self.name)?;
                    let mut store = MemoStore::load(&path);

                    if fingerprint::should_invalidate(store.fingerprint(), &current) {
                        debug!(
                            func = %self.name,
                            source = %source.display(),
                            "source fingerprint changed, discarding cached entries"
                        );
                        store.invalidate();
                        store.set_fingerprint(current.hex.clone());
                    }

                    (Some(path), store, Some(current.hex))
                }
                Err(e) => {
                    warn!(
                        func = %self.name,
                        error = %e,
                        "source file unreadable, memoizing in memory only"
                    );
                    (None, MemoStore::new(), None)
                }
            },
            SourceRef::Unavailable => {
                debug!(func = %self.name, "no source file, memoizing in memory only");
                (None, MemoStore::new(), None)
            }
        };

        Ok(Memo {
            func,
            name: self.name,
            store,
            cache_path,
            fingerprint,
            _call: PhantomData,
        })
    }

    /// Wrap an infallible callable.
    ///
    /// The resulting wrapper also exposes [`Memo::get`], which returns the
    /// value directly.
    pub fn wrap_fn<A, R, F>(
        self,
        mut func: F,
    ) -> RecallResult<Memo<A, R, Infallible, impl FnMut(&A) -> Result<R, Infallible>>>
    where
        F: FnMut(&A) -> R,
    {
        self.wrap(move |args: &A| Ok(func(args)))
    }
}

/// A memoized function.
///
/// Owns exactly one [`MemoStore`] and one on-disk cache file, named from
/// the wrapped function's identity. Observable behavior matches the
/// wrapped function, except that a hit skips the function body entirely,
/// so side effects the function would have had do not occur on a hit.
pub struct Memo<A, R, E, F> {
    func: F,
    name: String,
    store: MemoStore,
    cache_path: Option<PathBuf>,
    /// Fingerprint computed at wrap time; entries recorded this process
    /// are valid for exactly this source state.
    fingerprint: Option<String>,
    _call: PhantomData<fn(&A) -> Result<R, E>>,
}

impl<A, R, E, F> Memo<A, R, E, F>
where
    A: Serialize,
    R: Serialize + DeserializeOwned,
    F: FnMut(&A) -> Result<R, E>,
{
    /// Call the wrapped function, replaying a cached result when one
    /// exists for these arguments.
    pub fn call(&mut self, args: &A) -> Result<R, E> {
        let key = match CacheKey::for_args(args) {
            Ok(key) => key,
            Err(e) => {
                debug!(func = %self.name, error = %e, "arguments not keyable, bypassing cache");
                return (self.func)(args);
            }
        };

        if let Some(value) = self.store.lookup(&key) {
            match serde_json::from_value::<R>(value.clone()) {
                Ok(result) => {
                    debug!(func = %self.name, key = %key, "cache hit");
                    return Ok(result);
                }
                Err(e) => {
                    warn!(
                        func = %self.name,
                        key = %key,
                        error = %e,
                        "cached value no longer deserializes, recomputing"
                    );
                }
            }
        }

        debug!(func = %self.name, key = %key, "cache miss");
        let result = (self.func)(args)?;
        self.record(key, &result);
        Ok(result)
    }

    /// Insert a freshly computed result and flush the store.
    ///
    /// Neither an unserializable result nor a failed flush fails the call:
    /// the former is returned uncached, the latter leaves the store dirty
    /// for the next flush to rewrite.
    fn record(&mut self, key: CacheKey, result: &R) {
        let value = match serde_json::to_value(result) {
            Ok(value) => value,
            Err(e) => {
                debug!(func = %self.name, error = %e, "result not serializable, not cached");
                return;
            }
        };

        self.store.insert(key, value);
        if let Some(path) = &self.cache_path {
            if let Err(e) = self.store.persist(path) {
                warn!(func = %self.name, error = %e, "failed to persist cache");
            }
        }
    }

    /// Drop all memoized entries and delete the cache file.
    pub fn clear(&mut self) -> RecallResult<()> {
        self.store.invalidate();
        if let Some(fp) = &self.fingerprint {
            self.store.set_fingerprint(fp.clone());
        }
        if let Some(path) = &self.cache_path {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(crate::error::RecallError::Cache {
                        message: format!("failed to delete cache file: {}", e),
                    })
                }
            }
        }
        Ok(())
    }

    /// Name the wrapper was built with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of memoized entries currently held.
    pub fn entry_count(&self) -> usize {
        self.store.len()
    }

    /// Path of the on-disk cache file, when persistence is enabled.
    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    /// False when the wrapper runs in the degraded in-memory policy.
    pub fn is_persistent(&self) -> bool {
        self.cache_path.is_some()
    }
}

impl<A, R, F> Memo<A, R, Infallible, F>
where
    A: Serialize,
    R: Serialize + DeserializeOwned,
    F: FnMut(&A) -> Result<R, Infallible>,
{
    /// Call an infallible wrapped function, returning the value directly.
    pub fn get(&mut self, args: &A) -> R {
        match self.call(args) {
            Ok(result) => result,
            Err(never) => match never {},
        }
    }
}
