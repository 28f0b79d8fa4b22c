use std::sync::Arc;
use std::thread;

use super::*;

#[test]
fn lock_free_map_basic_operations() {
    let map: LockFreeMap<u64, String> = LockFreeMap::new();
    assert!(map.find(&1).is_none());

    map.insert(1, "one".to_string());
    map.insert(2, "two".to_string());
    assert_eq!(map.find(&1).as_deref(), Some("one"));
    assert_eq!(map.len(), 2);

    map.insert(1, "uno".to_string());
    assert_eq!(map.find(&1).as_deref(), Some("uno"));

    map.clear();
    assert!(map.is_empty());
}

#[test]
fn lock_free_map_readers_see_consistent_snapshots() {
    let map: Arc<LockFreeMap<u64, u64>> = Arc::new(LockFreeMap::new());
    for key in 0..64 {
        map.insert(key, key);
    }

    let mut handles = Vec::new();
    for _ in 0..4 {
        let map = Arc::clone(&map);
        handles.push(thread::spawn(move || {
            for _ in 0..1_000 {
                for key in 0..64 {
                    if let Some(value) = map.find(&key) {
                        assert!(value == key || value == key * 2);
                    }
                }
            }
        }));
    }
    for key in 0..64 {
        map.insert(key, key * 2);
    }
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn unordered_map_cache_basic_operations() {
    let cache: UnorderedMapCache<String, u64> = UnorderedMapCache::new();
    cache.insert("a".to_string(), 1);
    assert!(cache.exists(&"a".to_string()));
    assert_eq!(cache.find(&"a".to_string()), Some(1));
    assert_eq!(cache.find(&"b".to_string()), None);
}

#[test]
fn dblru_keeps_hot_entries_across_a_shift() {
    let cache: DblruCache<u64, u64> = DblruCache::new(4);

    cache.insert(1, 100);
    // Push enough entries through to shift the barrels once.
    for key in 2..=5 {
        cache.insert(key, key);
    }

    // Entry 1 is now in the secondary barrel; a find promotes it.
    assert_eq!(cache.find(&1), Some(100));

    // Shift again: promoted entry must survive in the new secondary.
    for key in 6..=10 {
        cache.insert(key, key);
    }
    assert_eq!(cache.find(&1), Some(100));
}

#[test]
fn dblru_eventually_evicts_cold_entries() {
    let cache: DblruCache<u64, u64> = DblruCache::new(2);
    cache.insert(1, 1);

    // Two full shifts with no access to key 1 pushes it out entirely.
    for key in 10..20 {
        cache.insert(key, key);
    }

    assert_eq!(cache.find(&1), None);
}

#[test]
fn dblru_over_unordered_map_backing() {
    let cache: DblruCache<u64, u64, UnorderedMapCache<u64, u64>> = DblruCache::new(8);
    for key in 0..8 {
        cache.insert(key, key + 100);
    }
    for key in 0..8 {
        assert_eq!(cache.find(&key), Some(key + 100));
    }
}

#[test]
fn shard_cache_routes_consistently() {
    let cache: ShardCache<u64, u64, DblruCache<u64, u64>> =
        ShardCache::with_shards(8, || DblruCache::new(64));
    assert_eq!(cache.shard_count(), 8);

    for key in 0..512 {
        cache.insert(key, key * 3);
    }
    for key in 0..512 {
        assert_eq!(cache.find(&key), Some(key * 3), "wrong shard for {key}");
    }

    cache.clear();
    assert_eq!(cache.find(&0), None);
}

#[test]
fn caches_are_usable_across_threads() {
    let cache: Arc<ShardCache<u64, u64, DblruCache<u64, u64>>> =
        Arc::new(ShardCache::with_shards(4, || DblruCache::new(256)));

    let mut handles = Vec::new();
    for t in 0..4u64 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..256u64 {
                let key = t * 1_000 + i;
                cache.insert(key, key);
                assert_eq!(cache.find(&key), Some(key));
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}
