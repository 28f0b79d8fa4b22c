//! A sharded cache wrapper.
//!
//! Hashes each key to one of `N` independent inner caches so that
//! synchronization happens per shard rather than globally. `N` is typically
//! a small power of two.

use std::hash::{BuildHasher, Hash, RandomState};

use super::CacheMap;

/// Cache partitioned into independently synchronized shards.
pub struct ShardCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: CacheMap<K, V>,
{
    shards: Vec<C>,
    hash_builder: RandomState,
    _marker: std::marker::PhantomData<(K, V)>,
}

impl<K, V, C> ShardCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: CacheMap<K, V>,
{
    /// Creates a cache with `shards` inner caches built by `make_shard`.
    pub fn with_shards(shards: usize, make_shard: impl Fn() -> C) -> Self {
        let shards = shards.max(1);
        Self {
            shards: (0..shards).map(|_| make_shard()).collect(),
            hash_builder: RandomState::new(),
            _marker: std::marker::PhantomData,
        }
    }

    /// The number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Inserts `value` under `key` into its shard.
    pub fn insert(&self, key: K, value: V) {
        self.shard_for(&key).insert(key, value);
    }

    /// Looks up `key` in its shard.
    pub fn find(&self, key: &K) -> Option<V> {
        self.shard_for(key).find(key)
    }

    /// Empties every shard.
    pub fn clear(&self) {
        for shard in &self.shards {
            shard.clear();
        }
    }

    #[inline]
    fn shard_for(&self, key: &K) -> &C {
        let hash = self.hash_builder.hash_one(key);
        &self.shards[(hash % self.shards.len() as u64) as usize]
    }
}
