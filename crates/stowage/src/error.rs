use thiserror::Error;

#[derive(Debug, Error)]
pub enum StowageError {
    #[error("storage error: {0}")]
    Storage(#[from] stowage_storage::StorageError),

    #[error("weak storage error: {0}")]
    Weak(#[from] stowage_weak::WeakStorageError),
}

pub type StowageResult<T> = Result<T, StowageError>;
