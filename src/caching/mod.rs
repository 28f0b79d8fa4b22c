//! Runtime caches for decoded postings records and other per-query lookups.
//!
//! The building block is the [`CacheMap`] trait: an insert/find map that is
//! safe to share across threads. Two implementations are provided: the
//! snapshot-swapping [`lock_free_map::LockFreeMap`] for read-heavy use, and
//! the plain [`unordered_map_cache::UnorderedMapCache`] for low contention.
//! [`dblru_cache::DblruCache`] layers approximate LRU eviction on top of a
//! pair of such maps, and [`shard_cache::ShardCache`] partitions the key
//! space across several independently synchronized inner caches.

pub mod dblru_cache;
pub mod lock_free_map;
pub mod shard_cache;
pub mod unordered_map_cache;

#[cfg(test)]
mod tests;

use std::hash::Hash;

/// A concurrent insert/find map usable as cache backing storage.
///
/// `find` returns values by clone; references into the map could be
/// invalidated by a concurrent writer as soon as the call returns. Cached
/// values are therefore cheap-to-clone types (ids, counts, `Arc`s).
pub trait CacheMap<K, V>: Send + Sync + Default
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Inserts or replaces the value for `key`.
    fn insert(&self, key: K, value: V);

    /// Returns a clone of the value for `key`, if present.
    fn find(&self, key: &K) -> Option<V>;

    /// Empties the map.
    fn clear(&self);
}
