//! Error types for the memoization layer.

/// Memoization errors.
#[derive(Debug, thiserror::Error)]
pub enum RecallError {
    /// Cache store could not be serialized or written.
    #[error("cache error: {message}")]
    Cache { message: String },

    /// The wrapped function's source file could not be read or resolved.
    #[error("source file error for {path}: {message}")]
    Source { path: String, message: String },

    /// Call arguments have no canonical representation and cannot be keyed.
    #[error("arguments not keyable: {message}")]
    Key { message: String },
}

/// Result alias for memoization operations.
pub type RecallResult<T> = Result<T, RecallError>;
