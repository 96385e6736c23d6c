//! Memoizing cache with at-most-one construction per key.
//!
//! The table lock is held only long enough to find or create the slot for a
//! key. Construction runs outside it, inside the slot's `OnceLock`, so
//! unrelated keys build in parallel while callers racing on the same key
//! block until the first construction finishes and then share its result.
//!
//! An initializer must never ask the same cache for the key it is building.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::resolver::errors::ResolveError;

type Slot<V, E> = Arc<OnceLock<Result<Arc<V>, E>>>;

pub struct MemoCache<K, V, E = ResolveError> {
    slots: Mutex<HashMap<K, Slot<V, E>>>,
}

impl<K, V, E> MemoCache<K, V, E>
where
    K: Eq + Hash + Clone,
    E: Clone,
{
    pub fn new() -> Self {
        MemoCache {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key`, running `init` if nobody has yet.
    ///
    /// Failures are cached too: every later caller sees the same error.
    pub fn get_or_try_init<F>(&self, key: &K, init: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let slot = {
            let mut slots = self.slots.lock();
            slots.entry(key.clone()).or_default().clone()
        };

        slot.get_or_init(|| init().map(Arc::new)).clone()
    }

    /// The finished result for `key`, if construction has completed.
    pub fn get(&self, key: &K) -> Option<Result<Arc<V>, E>> {
        let slot = self.slots.lock().get(key).cloned()?;
        slot.get().cloned()
    }

    /// Number of keys that have been requested.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

impl<K, V, E> Default for MemoCache<K, V, E>
where
    K: Eq + Hash + Clone,
    E: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
