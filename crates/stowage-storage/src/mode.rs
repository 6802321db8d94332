//! Result modes: whether a storage hands results back immediately or behind
//! a future.
//!
//! Every adapter declares its [`Mode`] as an associated type, and every
//! operation returns [`Returns<'a, M, T>`]. For [`Immediate`] that alias
//! normalizes to plain `T`; for [`Deferred`] it normalizes to
//! `BoxFuture<'a, T>`. Generic code is written once against [`Mode::map`]
//! and [`Mode::ready`], while callers of a concrete storage only ever see
//! the collapsed type.

use std::future::IntoFuture;

use futures::future::{self, BoxFuture, FutureExt};

/// The output type an operation of mode `M` produces for a value `T`.
pub type Returns<'a, M, T> = <M as Mode>::Output<'a, T>;

/// Type-level switch between immediate and deferred results.
pub trait Mode: Send + Sync + 'static {
    /// What an operation producing `T` actually returns in this mode.
    type Output<'a, T: Send + 'a>: Send + 'a;

    /// `true` when outputs must be awaited.
    const DEFERRED: bool;

    /// Lift an already-available value into this mode.
    fn ready<'a, T: Send + 'a>(value: T) -> Self::Output<'a, T>;

    /// Transform the eventual value without leaving the mode.
    ///
    /// For [`Deferred`] the closure runs after the inner future resolves.
    fn map<'a, T, U, F>(output: Self::Output<'a, T>, f: F) -> Self::Output<'a, U>
    where
        T: Send + 'a,
        U: Send + 'a,
        F: FnOnce(T) -> U + Send + 'a;

    /// Erase the mode into a tagged [`Completion`].
    fn completion<'a, T: Send + 'a>(output: Self::Output<'a, T>) -> Completion<'a, T>;
}

/// Results are returned directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Immediate;

/// Results are returned as boxed futures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deferred;

impl Mode for Immediate {
    type Output<'a, T: Send + 'a> = T;

    const DEFERRED: bool = false;

    fn ready<'a, T: Send + 'a>(value: T) -> T {
        value
    }

    fn map<'a, T, U, F>(output: T, f: F) -> U
    where
        T: Send + 'a,
        U: Send + 'a,
        F: FnOnce(T) -> U + Send + 'a,
    {
        f(output)
    }

    fn completion<'a, T: Send + 'a>(output: T) -> Completion<'a, T> {
        Completion::Ready(output)
    }
}

impl Mode for Deferred {
    type Output<'a, T: Send + 'a> = BoxFuture<'a, T>;

    const DEFERRED: bool = true;

    fn ready<'a, T: Send + 'a>(value: T) -> BoxFuture<'a, T> {
        future::ready(value).boxed()
    }

    fn map<'a, T, U, F>(output: BoxFuture<'a, T>, f: F) -> BoxFuture<'a, U>
    where
        T: Send + 'a,
        U: Send + 'a,
        F: FnOnce(T) -> U + Send + 'a,
    {
        output.map(f).boxed()
    }

    fn completion<'a, T: Send + 'a>(output: BoxFuture<'a, T>) -> Completion<'a, T> {
        Completion::Pending(output)
    }
}

/// A value that is either available now or will be after awaiting.
///
/// Useful to code that receives outputs from storages of either mode and
/// wants to branch at runtime instead of being generic over [`Mode`].
pub enum Completion<'a, T> {
    Ready(T),
    Pending(BoxFuture<'a, T>),
}

impl<'a, T: Send + 'a> Completion<'a, T> {
    /// Returns `true` if the value is available without awaiting.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Take the value if it is already available.
    pub fn into_ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Pending(_) => None,
        }
    }
}

impl<'a, T: Send + 'a> IntoFuture for Completion<'a, T> {
    type Output = T;
    type IntoFuture = BoxFuture<'a, T>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Self::Ready(value) => future::ready(value).boxed(),
            Self::Pending(fut) => fut,
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Completion<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}
