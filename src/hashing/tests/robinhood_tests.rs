use rand::Rng;

use super::*;

#[test]
fn set_semantics_after_repeated_inserts() {
    let mut map = RobinHoodMap::new();
    for key in 0..500u64 {
        let (_, inserted) = map.insert(key, key + 1);
        assert!(inserted);
    }
    for key in 0..500u64 {
        let (_, inserted) = map.insert(key, 0);
        assert!(!inserted, "duplicate insert must not create an entry");
    }

    assert_eq!(map.len(), 500);
    for key in 0..500u64 {
        assert_eq!(map.get(&key), Some(&(key + 1)), "value overwritten for {key}");
    }
}

#[test]
fn displacement_stays_bounded_at_high_load() {
    let mut map = RobinHoodMap::new();
    map.set_max_load_factor(0.9);

    for key in 0..1_000u64 {
        map.insert(key, ());
    }

    // Every key must resolve without hitting an empty bucket first.
    for key in 0..1_000u64 {
        assert!(map.contains_key(&key), "lost key {key}");
    }

    // Probe lengths are equalized; even at 0.9 load the longest chain is
    // far below the table size.
    assert!(
        map.max_displacement() <= 64,
        "displacement {} too large",
        map.max_displacement()
    );
}

#[test]
fn erase_preserves_remaining_cluster() {
    let mut map = RobinHoodMap::new();
    for key in 0..300u64 {
        map.insert(key, key * 10);
    }

    for key in (0..300u64).step_by(2) {
        assert!(map.erase(&key));
        assert!(!map.erase(&key), "double erase must report missing");
    }

    assert_eq!(map.len(), 150);
    for key in 0..300u64 {
        if key % 2 == 0 {
            assert!(!map.contains_key(&key));
        } else {
            assert_eq!(map.get(&key), Some(&(key * 10)), "lost key {key} after erase");
        }
    }
}

#[test]
fn get_mut_updates_in_place() {
    let mut map = RobinHoodMap::new();
    map.insert("term".to_string(), 1u64);
    *map.get_mut(&"term".to_string()).unwrap() += 41;
    assert_eq!(map.get(&"term".to_string()), Some(&42));
}

#[test]
fn extract_returns_all_entries() {
    let mut map = RobinHoodMap::new();
    for key in 0..40u64 {
        map.insert(key, key);
    }

    let mut entries = map.extract();
    entries.sort_unstable();
    assert_eq!(entries.len(), 40);
    assert_eq!(entries[0], (0, 0));
    assert_eq!(entries[39], (39, 39));
    assert!(map.is_empty());
}

#[test]
fn matches_reference_map_under_random_operations() {
    let mut rng = rand::rng();
    let mut map = RobinHoodMap::new();
    let mut reference = hashbrown::HashMap::new();

    for _ in 0..20_000 {
        let key: u64 = rng.random_range(0..512);
        if rng.random_range(0..4) == 0 {
            assert_eq!(map.erase(&key), reference.remove(&key).is_some());
        } else {
            let value: u64 = rng.random_range(0..1_000_000);
            let newly = reference.try_insert(key, value).is_ok();
            let (_, inserted) = map.insert(key, value);
            assert_eq!(inserted, newly);
        }
        assert_eq!(map.len(), reference.len());
    }

    for (key, value) in &reference {
        assert_eq!(map.get(key), Some(value));
    }
}

#[test]
fn reserve_avoids_rehash_churn() {
    let mut map = RobinHoodMap::with_capacity(10_000);
    let capacity = map.capacity();
    for key in 0..9_000u64 {
        map.insert(key, ());
    }
    assert_eq!(map.capacity(), capacity);
}
