//! Persistent memoization for pure functions.
//!
//! Wrapping a function with [`Memo`] caches its return value per argument
//! set. A later call with the same arguments replays the cached value
//! instead of re-running the function body, and the cache is written to a
//! file so it survives across program runs. When the source file that
//! defines the function changes, the cache is discarded on next load, so
//! results from an old implementation are never served.
//!
//! # Quick Start
//!
//! ```no_run
//! use recall::MemoBuilder;
//!
//! # fn main() -> recall::RecallResult<()> {
//! let mut add = MemoBuilder::new("add")
//!     .source_file(file!())
//!     .wrap_fn(|&(x, y): &(i64, i64)| x + y)?;
//!
//! assert_eq!(add.get(&(2, 3)), 5); // computed, cached, persisted
//! assert_eq!(add.get(&(2, 3)), 5); // replayed from cache
//! # Ok(())
//! # }
//! ```
//!
//! # Only memoize pure functions
//!
//! A hit skips the function body entirely: side effects do not happen,
//! and results that depend on anything outside the arguments (global
//! state, the clock, the network) will be replayed stale. Memoize only
//! functions whose output is fully determined by their arguments.
//!
//! # Concurrency
//!
//! Everything here is single-threaded and synchronous. The cache file has
//! no locking discipline: running the same wrapped function concurrently
//! from multiple threads or processes is unsupported, and concurrent
//! writers may lose entries (last persist wins).
//!
//! # Failure behavior
//!
//! The wrapper never introduces a failure mode the wrapped function does
//! not have. A missing or corrupt cache file is recovered as an empty
//! cache; arguments with no canonical representation bypass caching for
//! that call; errors from the wrapped function propagate unchanged and
//! are never cached; a function with no resolvable source file is
//! memoized in memory only.

pub mod error;
pub mod fingerprint;
pub mod key;
mod paths;
pub mod store;

mod memo;

pub use error::{RecallError, RecallResult};
pub use fingerprint::SourceFingerprint;
pub use key::CacheKey;
pub use memo::{Memo, MemoBuilder, SourceRef};
pub use store::MemoStore;
