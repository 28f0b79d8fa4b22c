//! A read-optimized concurrent map built on immutable snapshots.
//!
//! The map holds an `Arc` to an immutable `HashMap` snapshot. Readers clone
//! the `Arc` (one atomic increment) and then read the snapshot freely; a
//! concurrent write can never invalidate an in-flight read, and a read never
//! observes a partially mutated map. Writers clone the snapshot, apply
//! their mutation, and swap the new snapshot in. Writes serialize against
//! each other and pay a full copy, which is the intended trade: these maps
//! back caches whose reads outnumber writes by orders of magnitude.

use std::hash::Hash;
use std::sync::{Arc, RwLock};

use hashbrown::HashMap;

use super::CacheMap;

/// Snapshot-swapping concurrent map; see the module docs.
pub struct LockFreeMap<K, V> {
    map: RwLock<Arc<HashMap<K, V>>>,
}

impl<K, V> Default for LockFreeMap<K, V> {
    fn default() -> Self {
        Self {
            map: RwLock::new(Arc::new(HashMap::new())),
        }
    }
}

impl<K, V> LockFreeMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically loads the current snapshot.
    fn snapshot(&self) -> Arc<HashMap<K, V>> {
        Arc::clone(&self.map.read().expect("lock poisoned"))
    }

    /// Clone-modify-swap under the writer lock.
    fn mutate(&self, apply: impl FnOnce(&mut HashMap<K, V>)) {
        let mut guard = self.map.write().expect("lock poisoned");
        let mut next = HashMap::clone(&**guard);
        apply(&mut next);
        *guard = Arc::new(next);
    }

    /// The number of entries in the current snapshot.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether the current snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

impl<K, V> CacheMap<K, V> for LockFreeMap<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn insert(&self, key: K, value: V) {
        self.mutate(|map| {
            map.insert(key, value);
        });
    }

    fn find(&self, key: &K) -> Option<V> {
        self.snapshot().get(key).cloned()
    }

    fn clear(&self) {
        let mut guard = self.map.write().expect("lock poisoned");
        *guard = Arc::new(HashMap::new());
    }
}
