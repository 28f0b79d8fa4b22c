//! A probing set that stores keys directly in the slot array.
//!
//! Empty slots are recognized by a sentinel bit pattern rather than a
//! separate occupancy vector, so the whole table is one contiguous array of
//! keys. This only works for small `Copy` keys with a value that can never
//! be inserted; dense ids qualify because the all-ones pattern is never
//! assigned.

use std::hash::{BuildHasher, Hash, RandomState};

use super::{DEFAULT_MAX_LOAD_FACTOR, hash_of, next_prime};
use crate::ids::{DocId, TermId};

/// A key type with a designated never-inserted sentinel value.
pub trait SentinelKey: Copy + PartialEq {
    /// The bit pattern marking an empty slot.
    const SENTINEL: Self;
}

impl SentinelKey for u64 {
    const SENTINEL: Self = u64::MAX;
}

impl SentinelKey for u32 {
    const SENTINEL: Self = u32::MAX;
}

impl SentinelKey for DocId {
    const SENTINEL: Self = DocId::new(u64::MAX);
}

impl SentinelKey for TermId {
    const SENTINEL: Self = TermId::new(u64::MAX);
}

/// Inline-key probing set; see the module docs.
pub struct InlineKeySet<K, S = RandomState> {
    slots: Vec<K>,
    len: usize,
    max_load_factor: f64,
    hash_builder: S,
}

impl<K: SentinelKey + Hash + Eq> InlineKeySet<K> {
    /// Creates an empty set with the default load factor.
    pub fn new() -> Self {
        Self::with_hasher(DEFAULT_MAX_LOAD_FACTOR, RandomState::new())
    }
}

impl<K: SentinelKey + Hash + Eq> Default for InlineKeySet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: SentinelKey + Hash + Eq, S: BuildHasher> InlineKeySet<K, S> {
    /// Creates an empty set with an explicit hasher.
    pub fn with_hasher(max_load_factor: f64, hash_builder: S) -> Self {
        Self {
            slots: vec![K::SENTINEL; 17],
            len: 0,
            max_load_factor,
            hash_builder,
        }
    }

    /// Inserts `key`, returning whether it was newly added.
    ///
    /// Inserting the sentinel value is a programmer error.
    pub fn insert(&mut self, key: K) -> bool {
        debug_assert!(key != K::SENTINEL, "cannot insert the sentinel key");

        if (self.len + 1) as f64 / self.slots.len() as f64 > self.max_load_factor {
            self.resize();
        }

        let mut idx = self.slot_of(&key);
        while self.slots[idx] != K::SENTINEL {
            if self.slots[idx] == key {
                return false;
            }
            idx = (idx + 1) % self.slots.len();
        }

        self.slots[idx] = key;
        self.len += 1;
        true
    }

    /// Whether `key` is in the set.
    pub fn contains(&self, key: &K) -> bool {
        let mut idx = self.slot_of(key);
        while self.slots[idx] != K::SENTINEL {
            if &self.slots[idx] == key {
                return true;
            }
            idx = (idx + 1) % self.slots.len();
        }
        false
    }

    /// The number of keys in the set.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the set holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of slots currently allocated.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// An estimate of the heap bytes held by the container.
    pub fn bytes_used(&self) -> usize {
        std::mem::size_of::<K>() * self.slots.capacity()
    }

    /// Empties the set, keeping the slot allocation.
    pub fn clear(&mut self) {
        self.slots.fill(K::SENTINEL);
        self.len = 0;
    }

    #[inline]
    fn slot_of(&self, key: &K) -> usize {
        (hash_of(&self.hash_builder, key) % self.slots.len() as u64) as usize
    }

    fn resize(&mut self) {
        let new_capacity = next_prime(self.slots.len() * 2);
        let mut new_slots = vec![K::SENTINEL; new_capacity];

        for &key in self.slots.iter().filter(|&&k| k != K::SENTINEL) {
            let mut idx = (hash_of(&self.hash_builder, &key) % new_capacity as u64) as usize;
            while new_slots[idx] != K::SENTINEL {
                idx = (idx + 1) % new_capacity;
            }
            new_slots[idx] = key;
        }

        self.slots = new_slots;
    }
}
