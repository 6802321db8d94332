//! Error types for weak storage writes.

use thiserror::Error;

/// Reasons a write to a weak storage was refused. A refused write never
/// changes the stored value.
#[derive(Debug, Error)]
pub enum WeakStorageError {
    /// The instance's association was deleted or destroyed.
    #[error("instance in namespace {name:?} has been destroyed")]
    Destroyed { name: String },

    /// The instance's validator rejected the value.
    #[error("value rejected in namespace {name:?}: {reason}")]
    Rejected { name: String, reason: String },

    /// A value could not be converted to or from its object form.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience type alias for weak storage operations.
pub type WeakResult<T> = std::result::Result<T, WeakStorageError>;
