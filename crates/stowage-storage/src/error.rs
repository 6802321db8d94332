/// Errors from storage adapters and their backends.
///
/// Precondition misses (key already present on `add`, key absent on
/// `update`/`delete`, adapter locked) are not errors; they are reported as
/// `Ok(false)` by the mutating operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The codec could not encode the container, or could not decode
    /// persisted content.
    #[error("codec error: {0}")]
    Codec(String),

    /// The backing medium rejected the operation.
    #[error("backend error: {0}")]
    Backend(String),

    /// The namespace cannot be used by this backend.
    #[error("invalid namespace {namespace:?}: {reason}")]
    InvalidNamespace { namespace: String, reason: String },

    /// I/O error from a file-backed area.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
