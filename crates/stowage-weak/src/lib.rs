//! Values tied to the lifetime of an owning instance.
//!
//! A [`WeakStorage`] associates one value with its own identity inside a
//! named, process-wide table. Other code can read that value only when it
//! holds the instance, and the association disappears when the instance is
//! dropped or destroyed. [`IndexedWeakStorage`] adds a second table from the
//! integer value of a chosen field to the owning instance, so a value can be
//! found by that number from anywhere in the process.
//!
//! Namespaces are created lazily on first use and are never removed; only
//! their entries come and go. Dropping an instance is the finalization step:
//! it removes the association and any index registration that still refers
//! to it. Call `destroy` when the release must happen at a known point.

pub mod error;
pub mod indexed;
mod registry;
pub mod weak;

pub use error::{WeakResult, WeakStorageError};
pub use indexed::IndexedWeakStorage;
pub use registry::InstanceId;
pub use weak::{Validator, WeakStorage, DEFAULT_NAMESPACE};
