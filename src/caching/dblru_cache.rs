//! A double-barrel LRU cache.
//!
//! Instead of per-access list maintenance, the cache keeps two maps. Every
//! insert lands in the primary map and bumps an atomic counter; when the
//! counter passes `max_size`, the secondary map is discarded, the primary
//! becomes the secondary, and a fresh primary takes its place. Lookups try
//! the primary first and, on a secondary hit, promote the entry back into
//! the primary. Entries therefore survive as long as they keep being used,
//! giving approximately-LRU behavior with only map operations.
//!
//! `max_size` must cover the concurrent working set: undersizing causes the
//! barrels to thrash, while oversizing simply delays eviction.

use std::hash::Hash;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use super::CacheMap;
use super::lock_free_map::LockFreeMap;

/// Double-barrel LRU cache over a [`CacheMap`] backing store.
pub struct DblruCache<K, V, M = LockFreeMap<K, V>>
where
    K: Eq + Hash + Clone,
    V: Clone,
    M: CacheMap<K, V>,
{
    max_size: u64,
    current_size: AtomicU64,
    /// Written only during a barrel shift; reads are shared.
    barrels: RwLock<Barrels<M>>,
    _marker: std::marker::PhantomData<(K, V)>,
}

struct Barrels<M> {
    primary: M,
    secondary: M,
}

impl<K, V, M> DblruCache<K, V, M>
where
    K: Eq + Hash + Clone,
    V: Clone,
    M: CacheMap<K, V>,
{
    /// Creates a cache that shifts barrels after `max_size` inserts.
    pub fn new(max_size: u64) -> Self {
        Self {
            max_size: max_size.max(1),
            current_size: AtomicU64::new(0),
            barrels: RwLock::new(Barrels {
                primary: M::default(),
                secondary: M::default(),
            }),
            _marker: std::marker::PhantomData,
        }
    }

    /// Inserts `value` under `key`.
    pub fn insert(&self, key: K, value: V) {
        {
            let barrels = self.barrels.read().expect("lock poisoned");
            barrels.primary.insert(key, value);
        }
        self.handle_insert();
    }

    /// Looks up `key`, promoting a secondary-barrel hit back into the
    /// primary barrel.
    pub fn find(&self, key: &K) -> Option<V> {
        let barrels = self.barrels.read().expect("lock poisoned");
        if let Some(value) = barrels.primary.find(key) {
            return Some(value);
        }

        let value = barrels.secondary.find(key)?;
        barrels.primary.insert(key.clone(), value.clone());
        drop(barrels);
        self.handle_insert();
        Some(value)
    }

    /// Empties both barrels.
    pub fn clear(&self) {
        let barrels = self.barrels.write().expect("lock poisoned");
        barrels.primary.clear();
        barrels.secondary.clear();
        self.current_size.store(0, Ordering::Release);
    }

    /// Counts an insert and shifts the barrels once the primary has seen
    /// more than `max_size` of them.
    fn handle_insert(&self) {
        if self.current_size.fetch_add(1, Ordering::AcqRel) + 1 <= self.max_size {
            return;
        }

        let mut barrels = self.barrels.write().expect("lock poisoned");
        // Another thread may have shifted while we waited for the lock.
        if self.current_size.load(Ordering::Acquire) <= self.max_size {
            return;
        }
        let primary = std::mem::take(&mut barrels.primary);
        barrels.secondary = primary;
        self.current_size.store(0, Ordering::Release);
    }
}

impl<K, V, M> CacheMap<K, V> for DblruCache<K, V, M>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
    M: CacheMap<K, V>,
{
    fn insert(&self, key: K, value: V) {
        DblruCache::insert(self, key, value);
    }

    fn find(&self, key: &K) -> Option<V> {
        DblruCache::find(self, key)
    }

    fn clear(&self) {
        DblruCache::clear(self);
    }
}

impl<K, V, M> Default for DblruCache<K, V, M>
where
    K: Eq + Hash + Clone,
    V: Clone,
    M: CacheMap<K, V>,
{
    fn default() -> Self {
        Self::new(1024)
    }
}
