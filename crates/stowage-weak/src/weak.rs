use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::error::{WeakResult, WeakStorageError};
use crate::registry::{self, InstanceId};

/// Namespace used when none is given.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Check run against every value passed to [`WeakStorage::set`].
pub type Validator<T> = Arc<dyn Fn(&T) -> Result<(), String> + Send + Sync>;

/// A value associated with this instance's identity in a named,
/// process-wide table.
///
/// The value is reachable only through the instance (or the static
/// [`get`](WeakStorage::get) given the instance) and is removed from the
/// table when the instance is dropped.
///
/// # States
///
/// - *live*: entered at construction; the association exists.
///   [`clear`](Self::clear) keeps the instance live but stores the empty
///   sentinel.
/// - *destroyed*: the association was removed by [`delete`](Self::delete)
///   or [`destroy`](Self::destroy). Writes are refused from then on.
pub struct WeakStorage<T> {
    id: InstanceId,
    name: String,
    validator: Option<Validator<T>>,
    _value: PhantomData<fn() -> T>,
}

impl<T> WeakStorage<T> {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` while the association exists.
    pub fn is_live(&self) -> bool {
        registry::contains(&self.name, self.id)
    }

    /// Names of every namespace created so far, sorted.
    pub fn namespaces() -> Vec<String> {
        registry::namespaces()
    }

    /// Number of live associations in `name`.
    pub fn associations(name: &str) -> usize {
        registry::len(name)
    }
}

impl<T: Clone + Send + Sync + 'static> WeakStorage<T> {
    /// Associate `value` with a new instance in namespace `name`.
    pub fn new(value: T, name: impl Into<String>) -> Self {
        let name = name.into();
        let id = InstanceId::next();
        registry::insert(&name, id, Some(value));
        debug!(%id, namespace = %name, "weak storage created");
        Self {
            id,
            name,
            validator: None,
            _value: PhantomData,
        }
    }

    /// Same as [`new`](Self::new) with the arguments in namespace-first order.
    pub fn create(name: impl Into<String>, value: T) -> Self {
        Self::new(value, name)
    }

    /// Attach a validator consulted by every subsequent [`set`](Self::set).
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&T) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Read `instance`'s value from namespace `name`.
    ///
    /// `None` if `instance` has no association in `name` (including a
    /// different namespace than its own), was cleared, or was destroyed.
    pub fn get(name: &str, instance: &WeakStorage<T>) -> Option<T> {
        registry::get(name, instance.id)
    }

    /// Returns `true` if `instance` has an association in `name`, even a
    /// cleared one.
    pub fn contains(name: &str, instance: &WeakStorage<T>) -> bool {
        registry::contains(name, instance.id)
    }

    /// The current value; `None` after `clear`, `delete` or `destroy`.
    pub fn value(&self) -> Option<T> {
        registry::get(&self.name, self.id)
    }

    /// Overwrite the value after validation. A refused write leaves the
    /// stored value untouched.
    pub fn set(&self, value: T) -> WeakResult<&Self> {
        self.validate(&value)?;
        if !registry::replace(&self.name, self.id, Some(value)) {
            // Deleted between validation and write.
            return Err(self.destroyed());
        }
        Ok(self)
    }

    /// Store the empty sentinel while keeping the association.
    pub fn clear(&self) -> &Self {
        registry::replace::<T>(&self.name, self.id, None);
        self
    }

    /// Remove the association without clearing first.
    pub fn delete(&self) -> &Self {
        registry::remove(&self.name, self.id);
        self
    }

    /// Clear, then remove the association.
    pub fn destroy(&self) -> &Self {
        self.clear().delete();
        debug!(id = %self.id, namespace = %self.name, "weak storage destroyed");
        self
    }

    fn validate(&self, value: &T) -> WeakResult<()> {
        if !self.is_live() {
            return Err(self.destroyed());
        }
        if let Some(validator) = &self.validator {
            validator(value).map_err(|reason| WeakStorageError::Rejected {
                name: self.name.clone(),
                reason,
            })?;
        }
        Ok(())
    }

    fn destroyed(&self) -> WeakStorageError {
        WeakStorageError::Destroyed {
            name: self.name.clone(),
        }
    }
}

impl<T> Drop for WeakStorage<T> {
    fn drop(&mut self) {
        if registry::remove(&self.name, self.id) {
            debug!(id = %self.id, namespace = %self.name, "weak storage released");
        }
    }
}

impl<T> fmt::Debug for WeakStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakStorage")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("live", &self.is_live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_is_reachable_through_instance_and_static_get() {
        let age = WeakStorage::new(25u32, "weak::age");
        let score = WeakStorage::new(90u32, "weak::score");
        assert_eq!(age.value(), Some(25));
        assert_eq!(score.value(), Some(90));
        assert_eq!(WeakStorage::get("weak::age", &age), Some(25));
        assert_eq!(WeakStorage::get("weak::score", &score), Some(90));

        age.set(30).unwrap();
        assert_eq!(age.value(), Some(30));
    }

    #[test]
    fn destroy_then_reads_are_absent() {
        let age = WeakStorage::new(25u32, "weak::destroy");
        age.destroy();
        assert_eq!(WeakStorage::get("weak::destroy", &age), None);
        assert!(!age.is_live());

        let score = WeakStorage::new(90u32, "weak::delete");
        score.delete();
        assert_eq!(WeakStorage::get("weak::delete", &score), None);
    }

    #[test]
    fn namespaces_are_isolated() {
        let a = WeakStorage::new("same".to_string(), "weak::iso-a");
        let b = WeakStorage::new("same".to_string(), "weak::iso-b");
        a.set("changed".to_string()).unwrap();

        assert_eq!(WeakStorage::get("weak::iso-b", &b).as_deref(), Some("same"));
        assert_eq!(WeakStorage::get("weak::iso-b", &a), None);
        assert_eq!(WeakStorage::get("weak::iso-a", &b), None);
        assert!(WeakStorage::<String>::namespaces().contains(&"weak::iso-a".to_string()));
    }

    #[test]
    fn clear_keeps_association() {
        let w = WeakStorage::new(vec![1, 2, 3], "weak::clear");
        w.clear();
        assert_eq!(w.value(), None);
        assert!(w.is_live());
        assert!(WeakStorage::contains("weak::clear", &w));

        w.set(vec![4]).unwrap();
        assert_eq!(w.value(), Some(vec![4]));
    }

    #[test]
    fn set_after_destroy_is_refused() {
        let w = WeakStorage::new(1i64, "weak::refused");
        w.destroy();
        let err = w.set(2).unwrap_err();
        assert!(matches!(err, WeakStorageError::Destroyed { .. }));
        assert!(!w.is_live());
        // clear does not resurrect the association either.
        w.clear();
        assert!(!w.is_live());
    }

    #[test]
    fn validator_blocks_write() {
        let w = WeakStorage::new(10u8, "weak::validator")
            .with_validator(|v: &u8| if *v <= 100 { Ok(()) } else { Err(format!("{v} > 100")) });
        w.set(50).unwrap();
        let err = w.set(200).unwrap_err();
        assert!(matches!(err, WeakStorageError::Rejected { ref reason, .. } if reason == "200 > 100"));
        assert_eq!(w.value(), Some(50));
    }

    #[test]
    fn drop_releases_association() {
        let ns = "weak::drop";
        let keep = WeakStorage::new(1u8, ns);
        {
            let _short = WeakStorage::new(2u8, ns);
            assert_eq!(WeakStorage::<u8>::associations(ns), 2);
        }
        assert_eq!(WeakStorage::<u8>::associations(ns), 1);
        drop(keep);
        assert_eq!(WeakStorage::<u8>::associations(ns), 0);
    }

    #[test]
    fn create_uses_namespace_first_order() {
        let w = WeakStorage::create("weak::create", 'x');
        assert_eq!(w.name(), "weak::create");
        assert_eq!(w.value(), Some('x'));
        let debug = format!("{w:?}");
        assert!(debug.contains("live: true"));
    }

    #[test]
    fn default_namespace_constant() {
        let w = WeakStorage::new(0u16, DEFAULT_NAMESPACE);
        assert_eq!(w.name(), "default");
        assert_ne!(w.id(), WeakStorage::new(0u16, DEFAULT_NAMESPACE).id());
    }
}
