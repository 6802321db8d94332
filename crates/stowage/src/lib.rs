//! Stowage: keyed storage over pluggable adapters, plus values tied to the
//! lifetime of an owning instance.
//!
//! This crate re-exports the two halves:
//!
//! - [`stowage_storage`]: [`Storage`] and [`ReactiveStorage`] over an
//!   adapter whose [`Mode`] decides whether results are immediate or
//!   deferred.
//! - [`stowage_weak`]: [`WeakStorage`] and [`IndexedWeakStorage`] with
//!   process-wide namespaced registries.
//!
//! The [`open`] module has shorthand constructors; [`prelude`] brings the
//! traits needed to call storage operations into scope.

pub mod error;
pub mod open;

pub use error::{StowageError, StowageResult};

pub use stowage_storage::{
    AreaAdapter, Codec, Completion, Deferred, Entries, EventStream, FileArea, FileAreaConfig,
    FnCodec, Immediate, JsonCodec, Listener, MemoryAdapter, MemoryArea, Mode, ReactiveConfig,
    ReactiveStorage, RemoteAdapter, RemoteBackend, Returns, Storage, StorageAdapter,
    StorageArea, StorageError, StorageEvent, StorageKey, StorageMethod, StorageResult,
    StorageShape, StorageValue,
};
pub use stowage_weak::{
    IndexedWeakStorage, InstanceId, Validator, WeakResult, WeakStorage, WeakStorageError,
    DEFAULT_NAMESPACE,
};

pub mod prelude {
    pub use stowage_storage::{Mode, StorageAdapter, StorageArea, StorageShape};

    pub use crate::{
        Entries, IndexedWeakStorage, Storage, StowageError, StowageResult, WeakStorage,
    };
}
