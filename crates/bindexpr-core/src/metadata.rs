//! Typed key/value metadata passed alongside compilation and invocation.
//!
//! A [`MetadataKey<T>`] names a slot holding a `T`. The [`MetadataContext`]
//! stores values behind `Arc<dyn Any>` so contexts are cheap to clone and
//! merge; a lookup with a key of the wrong type simply misses.
//!
//! ```
//! use bindexpr_core::{MetadataContext, MetadataKey};
//!
//! const RETRIES: MetadataKey<u32> = MetadataKey::new("retries");
//!
//! let mut ctx = MetadataContext::new();
//! ctx.set(RETRIES, 3);
//! assert_eq!(ctx.get(RETRIES), Some(&3));
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use rustc_hash::FxHashMap;

/// A typed metadata key.
pub struct MetadataKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> MetadataKey<T> {
    /// Create a key. Keys with equal names address the same slot.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// The key name.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for MetadataKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for MetadataKey<T> {}

impl<T> fmt::Debug for MetadataKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetadataKey({})", self.name)
    }
}

/// A clonable, mergeable metadata store.
#[derive(Clone, Default)]
pub struct MetadataContext {
    values: FxHashMap<&'static str, Arc<dyn Any + Send + Sync>>,
}

impl MetadataContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value.
    pub fn get<T: Any + Send + Sync>(&self, key: MetadataKey<T>) -> Option<&T> {
        self.values.get(key.name).and_then(|v| v.downcast_ref::<T>())
    }

    /// Store a value, replacing any previous one.
    pub fn set<T: Any + Send + Sync>(&mut self, key: MetadataKey<T>, value: T) {
        self.values.insert(key.name, Arc::new(value));
    }

    /// Builder-style [`set`](Self::set).
    pub fn with<T: Any + Send + Sync>(mut self, key: MetadataKey<T>, value: T) -> Self {
        self.set(key, value);
        self
    }

    /// Remove a value, returning whether it was present.
    pub fn remove<T>(&mut self, key: MetadataKey<T>) -> bool {
        self.values.remove(key.name).is_some()
    }

    /// Check whether a slot is occupied (regardless of its type).
    pub fn contains<T>(&self, key: MetadataKey<T>) -> bool {
        self.values.contains_key(key.name)
    }

    /// Copy every entry of `other` into this context, overwriting on conflict.
    pub fn merge(&mut self, other: &MetadataContext) {
        for (name, value) in &other.values {
            self.values.insert(name, Arc::clone(value));
        }
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the context is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for MetadataContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("MetadataContext").field("keys", &keys).finish()
    }
}
