// Test module organization for the caching layer.
// Compiled only under cfg(test) via the declaration in caching/mod.rs.

use super::CacheMap;
use super::dblru_cache::DblruCache;
use super::lock_free_map::LockFreeMap;
use super::shard_cache::ShardCache;
use super::unordered_map_cache::UnorderedMapCache;

mod cache_tests;
