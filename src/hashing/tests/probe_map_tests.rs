use super::*;

#[test]
fn emplace_deduplicates() {
    let mut map = ProbeMap::new();
    let (idx_a, inserted_a) = map.emplace(42u64, "first");
    let (idx_b, inserted_b) = map.emplace(42u64, "second");

    assert!(inserted_a);
    assert!(!inserted_b);
    assert_eq!(idx_a, idx_b);
    assert_eq!(map.get(&42), Some(&"first"));
    assert_eq!(map.len(), 1);
}

#[test]
fn histogram_accumulation() {
    let mut map: ProbeMap<u64, u64> = ProbeMap::new();
    let lengths = [4u64, 3, 4, 4, 7, 3];
    for len in lengths {
        *map.get_or_insert_with(len, || 0) += 1;
    }

    assert_eq!(map.get(&4), Some(&3));
    assert_eq!(map.get(&3), Some(&2));
    assert_eq!(map.get(&7), Some(&1));
    assert_eq!(map.get(&5), None);
}

#[test]
fn survives_resizing() {
    let mut map = ProbeMap::new();
    for key in 0..5_000u64 {
        map.emplace(key, key * 2);
    }

    assert_eq!(map.len(), 5_000);
    for key in 0..5_000u64 {
        assert_eq!(map.get(&key), Some(&(key * 2)));
    }
}

#[test]
fn iterates_in_insertion_order() {
    let mut map = ProbeMap::new();
    map.emplace(9u64, 'a');
    map.emplace(1u64, 'b');
    map.emplace(5u64, 'c');

    let pairs: Vec<(u64, char)> = map.iter().map(|(&k, &v)| (k, v)).collect();
    assert_eq!(pairs, vec![(9, 'a'), (1, 'b'), (5, 'c')]);
}

#[test]
fn clear_keeps_capacity() {
    let mut map = ProbeMap::new();
    for key in 0..100u64 {
        map.emplace(key, ());
    }
    let capacity = map.capacity();
    map.clear();

    assert!(map.is_empty());
    assert_eq!(map.capacity(), capacity);
    assert_eq!(map.get(&1), None);
}

#[test]
fn custom_tuning_still_resolves_all_keys() {
    let mut map = ProbeMap::with_tuning(0.5, 2.0);
    for key in 0..1_000u64 {
        map.emplace(key, key);
    }
    for key in 0..1_000u64 {
        assert_eq!(map.get(&key), Some(&key));
    }
}
