//! Keyed storage over pluggable persistence adapters.
//!
//! Callers work through one create/read/update/delete contract
//! ([`StorageShape`]) while an adapter ([`StorageAdapter`]) owns the entries
//! and performs the actual load/save against its backing medium.
//!
//! # Result modes
//!
//! Each adapter declares a [`Mode`]. With [`Immediate`] every operation
//! returns its value directly; with [`Deferred`] every operation except
//! `size` returns a boxed future. The choice is made in the type system, so
//! a caller of an immediate storage never sees a future and a caller of a
//! deferred storage always does.
//!
//! # Adapters
//!
//! - [`MemoryAdapter`] -- immediate, no backend
//! - [`AreaAdapter`] -- immediate, one encoded string per namespace in a
//!   [`StorageArea`] ([`MemoryArea`], [`FileArea`])
//! - [`RemoteAdapter`] -- deferred, through an async [`RemoteBackend`]
//!
//! # Design Rules
//!
//! 1. A storage owns exactly one adapter for its whole life.
//! 2. Successful mutations persist as part of the same call.
//! 3. Precondition misses and a locked adapter yield `Ok(false)`, never `Err`.
//! 4. Malformed persisted content loads as an empty container.
//! 5. Backend faults propagate unmodified.

pub mod area;
pub mod codec;
pub mod config;
mod container;
pub mod error;
pub mod event;
pub mod memory;
pub mod mode;
pub mod persistent;
pub mod reactive;
pub mod remote;
pub mod storage;
pub mod traits;

pub use area::{FileArea, MemoryArea, RemoteBackend, StorageArea};
pub use codec::{Codec, FnCodec, JsonCodec};
pub use config::{FileAreaConfig, ReactiveConfig};
pub use error::{StorageError, StorageResult};
pub use event::{Listener, StorageEvent, StorageMethod};
pub use memory::MemoryAdapter;
pub use mode::{Completion, Deferred, Immediate, Mode, Returns};
pub use persistent::AreaAdapter;
pub use reactive::{EventStream, ReactiveStorage};
pub use remote::RemoteAdapter;
pub use storage::Storage;
pub use traits::{Entries, StorageAdapter, StorageKey, StorageShape, StorageValue};
