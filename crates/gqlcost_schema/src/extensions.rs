//! Typed extension slot for host configuration attached to a schema.
//!
//! Values are keyed by their `TypeId`, so each host layer owns one slot per type
//! without string keys.

use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A type-keyed map of shared extension values.
#[derive(Clone, Default)]
pub struct Extensions {
    data: FxHashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Extensions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
        self.data.insert(TypeId::of::<T>(), Arc::new(value));
    }

    #[must_use]
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.data
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref())
    }

    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.data.contains_key(&TypeId::of::<T>())
    }

    /// Removes the value of type `T`. Returns true if one was present.
    pub fn remove<T: 'static>(&mut self) -> bool {
        self.data.remove(&TypeId::of::<T>()).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Budget(i64);

    #[derive(Debug, PartialEq)]
    struct Label(&'static str);

    #[test]
    fn test_insert_and_get_by_type() {
        let mut ext = Extensions::new();
        ext.insert(Budget(200));
        ext.insert(Label("public"));

        assert_eq!(ext.get::<Budget>(), Some(&Budget(200)));
        assert_eq!(ext.get::<Label>(), Some(&Label("public")));
        assert_eq!(ext.len(), 2);
    }

    #[test]
    fn test_insert_replaces_same_type() {
        let mut ext = Extensions::new();
        ext.insert(Budget(1));
        ext.insert(Budget(2));
        assert_eq!(ext.get::<Budget>(), Some(&Budget(2)));
        assert_eq!(ext.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut ext = Extensions::new();
        ext.insert(Budget(1));
        assert!(ext.remove::<Budget>());
        assert!(!ext.contains::<Budget>());
        assert!(!ext.remove::<Budget>());
        assert!(ext.is_empty());
    }

    #[test]
    fn test_clones_share_values() {
        let mut ext = Extensions::new();
        ext.insert(Budget(7));
        let copy = ext.clone();
        assert_eq!(copy.get::<Budget>(), Some(&Budget(7)));
    }
}
