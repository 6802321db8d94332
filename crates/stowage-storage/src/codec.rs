//! Serialize/deserialize hooks for persisted containers.
//!
//! The persisted representation is a single opaque string per namespace.
//! [`JsonCodec`] is the default; [`FnCodec`] wraps caller-supplied
//! functions.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StorageError, StorageResult};

/// Converts a container to and from its persisted string form.
pub trait Codec<T>: Send + Sync {
    fn encode(&self, value: &T) -> StorageResult<String>;

    fn decode(&self, raw: &str) -> StorageResult<T>;
}

/// Structured-text codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T: Serialize + DeserializeOwned> Codec<T> for JsonCodec {
    fn encode(&self, value: &T) -> StorageResult<String> {
        serde_json::to_string(value).map_err(|e| StorageError::Codec(e.to_string()))
    }

    fn decode(&self, raw: &str) -> StorageResult<T> {
        serde_json::from_str(raw).map_err(|e| StorageError::Codec(e.to_string()))
    }
}

type EncodeFn<T> = dyn Fn(&T) -> Result<String, String> + Send + Sync;
type DecodeFn<T> = dyn Fn(&str) -> Result<T, String> + Send + Sync;

/// Codec built from a pair of caller-supplied functions.
pub struct FnCodec<T> {
    encode: Arc<EncodeFn<T>>,
    decode: Arc<DecodeFn<T>>,
}

impl<T> FnCodec<T> {
    pub fn new<E, D>(encode: E, decode: D) -> Self
    where
        E: Fn(&T) -> Result<String, String> + Send + Sync + 'static,
        D: Fn(&str) -> Result<T, String> + Send + Sync + 'static,
    {
        Self {
            encode: Arc::new(encode),
            decode: Arc::new(decode),
        }
    }
}

impl<T> Clone for FnCodec<T> {
    fn clone(&self) -> Self {
        Self {
            encode: Arc::clone(&self.encode),
            decode: Arc::clone(&self.decode),
        }
    }
}

impl<T> fmt::Debug for FnCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnCodec")
    }
}

impl<T> Codec<T> for FnCodec<T> {
    fn encode(&self, value: &T) -> StorageResult<String> {
        (self.encode)(value).map_err(StorageError::Codec)
    }

    fn decode(&self, raw: &str) -> StorageResult<T> {
        (self.decode)(raw).map_err(StorageError::Codec)
    }
}
