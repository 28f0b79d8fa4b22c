//! An insert-only linear-probing hash set with contiguous key storage.
//!
//! The probe array maps hash slots to indices into a single `Vec<K>`, so
//! hundreds of millions of insertions amortize to plain vector pushes and
//! the accumulated keys can be moved out wholesale once a chunk is ready to
//! be flushed. The primary consumer is the in-RAM postings accumulator
//! during indexing, which keys the set by term id and keeps the postings
//! lists in a side vector parallel to the key storage.

use std::hash::{BuildHasher, Hash, RandomState};

use super::{hash_of, next_prime};

/// Load factor expressed as a fraction, so the resize condition check stays
/// in integer arithmetic.
///
/// The default is 3/4: the set resizes when more than three quarters of the
/// probe slots would be occupied after an insert.
#[derive(Debug, Clone, Copy)]
pub struct LoadFactor {
    pub numerator: u64,
    pub denominator: u64,
}

impl Default for LoadFactor {
    fn default() -> Self {
        Self {
            numerator: 3,
            denominator: 4,
        }
    }
}

/// Insert-only probing set; see the module docs.
///
/// `insert` does not test for prior membership. Callers that need set
/// semantics call [`ProbeSet::find`] first, which is the access pattern of
/// the indexing accumulator (look up the term's slot, append to its
/// postings, insert only on a miss).
pub struct ProbeSet<K, S = RandomState> {
    /// Probe slots mapping to indices into `keys`.
    table: Vec<usize>,
    /// Whether each probe slot is occupied.
    occupancy: Vec<bool>,
    /// Contiguous key storage in insertion order.
    keys: Vec<K>,
    alpha: LoadFactor,
    hash_builder: S,
}

impl<K: Hash + Eq> ProbeSet<K> {
    /// Creates an empty set with the default load factor.
    pub fn new() -> Self {
        Self::with_load_factor(LoadFactor::default())
    }

    /// Creates an empty set that resizes at the given load factor.
    pub fn with_load_factor(alpha: LoadFactor) -> Self {
        Self::with_hasher(alpha, RandomState::new())
    }
}

impl<K: Hash + Eq> Default for ProbeSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, S: BuildHasher> ProbeSet<K, S> {
    /// Creates an empty set with an explicit hasher.
    pub fn with_hasher(alpha: LoadFactor, hash_builder: S) -> Self {
        Self {
            table: vec![0; 17],
            occupancy: vec![false; 17],
            keys: Vec::new(),
            alpha,
            hash_builder,
        }
    }

    /// Inserts `key`, returning its index in the contiguous key storage.
    ///
    /// No membership check is performed; inserting a key twice stores it
    /// twice.
    pub fn insert(&mut self, key: K) -> usize {
        if self.alpha.denominator * (self.keys.len() as u64 + 1)
            >= self.alpha.numerator * self.occupancy.len() as u64
        {
            self.resize();
        }

        let mut idx = (hash_of(&self.hash_builder, &key) % self.occupancy.len() as u64) as usize;
        while self.occupancy[idx] {
            idx = (idx + 1) % self.occupancy.len();
        }

        self.occupancy[idx] = true;
        self.table[idx] = self.keys.len();

        if self.keys.len() == self.keys.capacity() {
            self.keys.reserve(self.keys.len() / 2 + 1);
        }
        self.keys.push(key);
        self.keys.len() - 1
    }

    /// Looks up `key`, returning its index in the key storage if present.
    pub fn find(&self, key: &K) -> Option<usize> {
        let mut idx = (hash_of(&self.hash_builder, key) % self.occupancy.len() as u64) as usize;
        while self.occupancy[idx] {
            let key_idx = self.table[idx];
            if &self.keys[key_idx] == key {
                return Some(key_idx);
            }
            idx = (idx + 1) % self.occupancy.len();
        }
        None
    }

    /// Returns the key stored at `index`.
    pub fn key_at(&self, index: usize) -> &K {
        &self.keys[index]
    }

    /// Iterates over the stored keys in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.keys.iter()
    }

    /// Whether the set holds no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The number of keys in the set.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// The number of probe slots currently allocated.
    pub fn capacity(&self) -> usize {
        self.occupancy.len()
    }

    /// An estimate of the heap bytes held by the container.
    pub fn bytes_used(&self) -> usize {
        std::mem::size_of::<usize>() * self.table.capacity()
            + self.occupancy.capacity()
            + std::mem::size_of::<K>() * self.keys.capacity()
    }

    /// Empties the set, releasing the key storage but keeping the probe
    /// table allocation.
    pub fn clear(&mut self) {
        self.keys = Vec::new();
        self.occupancy.fill(false);
    }

    /// Moves the contiguous key storage out and empties the set.
    pub fn extract_keys(&mut self) -> Vec<K> {
        let keys = std::mem::take(&mut self.keys);
        self.clear();
        keys
    }

    fn resize(&mut self) {
        let new_capacity = next_prime(self.occupancy.len() * 2);
        let mut new_occupancy = vec![false; new_capacity];
        let mut new_table = vec![0usize; new_capacity];

        for idx in 0..self.occupancy.len() {
            if !self.occupancy[idx] {
                continue;
            }
            let key_idx = self.table[idx];
            let mut new_idx =
                (hash_of(&self.hash_builder, &self.keys[key_idx]) % new_capacity as u64) as usize;
            while new_occupancy[new_idx] {
                new_idx = (new_idx + 1) % new_capacity;
            }
            new_occupancy[new_idx] = true;
            new_table[new_idx] = key_idx;
        }

        self.occupancy = new_occupancy;
        self.table = new_table;
    }
}
