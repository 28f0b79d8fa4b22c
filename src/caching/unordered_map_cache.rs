//! A mutex-guarded map cache for low-contention call sites.

use std::hash::Hash;
use std::sync::Mutex;

use hashbrown::HashMap;

use super::CacheMap;

/// Plain mutex-around-a-map cache storage.
pub struct UnorderedMapCache<K, V> {
    map: Mutex<HashMap<K, V>>,
}

impl<K, V> Default for UnorderedMapCache<K, V> {
    fn default() -> Self {
        Self {
            map: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> UnorderedMapCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` currently has an entry.
    pub fn exists(&self, key: &K) -> bool {
        self.map.lock().expect("lock poisoned").contains_key(key)
    }

    /// The number of entries held.
    pub fn len(&self) -> usize {
        self.map.lock().expect("lock poisoned").len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> CacheMap<K, V> for UnorderedMapCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn insert(&self, key: K, value: V) {
        self.map.lock().expect("lock poisoned").insert(key, value);
    }

    fn find(&self, key: &K) -> Option<V> {
        self.map.lock().expect("lock poisoned").get(key).cloned()
    }

    fn clear(&self) {
        self.map.lock().expect("lock poisoned").clear();
    }
}
