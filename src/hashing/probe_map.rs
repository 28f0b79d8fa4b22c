//! A linear-probing map with inline keys and externally stored values.
//!
//! Probe cells carry the key and a one-based index into a side vector of
//! values; a zero index marks an empty cell. The layout keeps the probe
//! array small when values are large, and keeps the values contiguous for
//! iteration.

use std::hash::{BuildHasher, Hash, RandomState};

use super::{DEFAULT_MAX_LOAD_FACTOR, DEFAULT_RESIZE_RATIO, hash_of, next_prime};

#[derive(Clone)]
struct Cell<K> {
    key: K,
    /// One-based index into the value storage; 0 means empty.
    idx: usize,
}

/// Inline-key / external-value probing map; see the module docs.
pub struct ProbeMap<K, V, S = RandomState> {
    cells: Vec<Cell<K>>,
    values: Vec<V>,
    /// Keys parallel to `values`, for iteration in insertion order.
    keys: Vec<K>,
    max_load_factor: f64,
    resize_ratio: f64,
    hash_builder: S,
}

impl<K: Hash + Eq + Clone + Default, V> ProbeMap<K, V> {
    /// Creates an empty map with the default load factor and resize ratio.
    pub fn new() -> Self {
        Self::with_tuning(DEFAULT_MAX_LOAD_FACTOR, DEFAULT_RESIZE_RATIO)
    }

    /// Creates an empty map with explicit tuning knobs.
    pub fn with_tuning(max_load_factor: f64, resize_ratio: f64) -> Self {
        Self::with_hasher(max_load_factor, resize_ratio, RandomState::new())
    }
}

impl<K: Hash + Eq + Clone + Default, V> Default for ProbeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone + Default, V, S: BuildHasher> ProbeMap<K, V, S> {
    /// Creates an empty map with an explicit hasher.
    pub fn with_hasher(max_load_factor: f64, resize_ratio: f64, hash_builder: S) -> Self {
        Self {
            cells: (0..17)
                .map(|_| Cell {
                    key: K::default(),
                    idx: 0,
                })
                .collect(),
            values: Vec::new(),
            keys: Vec::new(),
            max_load_factor,
            resize_ratio,
            hash_builder,
        }
    }

    /// Inserts `value` under `key` if absent.
    ///
    /// # Returns
    ///
    /// The index of the entry in the value storage and whether a new entry
    /// was created. An existing entry's value is left untouched.
    pub fn emplace(&mut self, key: K, value: V) -> (usize, bool) {
        self.rehash_if_needed();

        let mut idx = self.slot_of(&key);
        while self.cells[idx].idx != 0 {
            if self.cells[idx].key == key {
                return (self.cells[idx].idx - 1, false);
            }
            idx = (idx + 1) % self.cells.len();
        }

        self.values.push(value);
        self.keys.push(key.clone());
        self.cells[idx] = Cell {
            key,
            idx: self.values.len(),
        };
        (self.values.len() - 1, true)
    }

    /// Returns a mutable reference to the value for `key`, inserting the
    /// result of `default` on a miss.
    pub fn get_or_insert_with(&mut self, key: K, default: impl FnOnce() -> V) -> &mut V {
        let (idx, inserted) = match self.find(&key) {
            Some(idx) => (idx, false),
            None => (0, true),
        };
        let idx = if inserted {
            self.emplace(key, default()).0
        } else {
            idx
        };
        &mut self.values[idx]
    }

    /// Looks up `key`, returning the index of its entry if present.
    pub fn find(&self, key: &K) -> Option<usize> {
        let mut idx = self.slot_of(key);
        while self.cells[idx].idx != 0 {
            if &self.cells[idx].key == key {
                return Some(self.cells[idx].idx - 1);
            }
            idx = (idx + 1) % self.cells.len();
        }
        None
    }

    /// Returns the value for `key`, if present.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|idx| &self.values[idx])
    }

    /// Returns the value stored at `index`.
    pub fn value_at(&self, index: usize) -> &V {
        &self.values[index]
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.keys.iter().zip(self.values.iter())
    }

    /// The number of entries in the map.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The number of probe cells currently allocated.
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// An estimate of the heap bytes held by the container.
    pub fn bytes_used(&self) -> usize {
        std::mem::size_of::<Cell<K>>() * self.cells.capacity()
            + std::mem::size_of::<V>() * self.values.capacity()
            + std::mem::size_of::<K>() * self.keys.capacity()
    }

    /// Empties the map, keeping the probe table allocation.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.idx = 0;
        }
        self.values.clear();
        self.keys.clear();
    }

    #[inline]
    fn slot_of(&self, key: &K) -> usize {
        (hash_of(&self.hash_builder, key) % self.cells.len() as u64) as usize
    }

    fn rehash_if_needed(&mut self) {
        let next_load = (self.values.len() + 1) as f64 / self.cells.len() as f64;
        if next_load <= self.max_load_factor {
            return;
        }

        let target = (self.cells.len() as f64 * self.resize_ratio).ceil() as usize;
        let new_capacity = next_prime(target);
        let mut new_cells: Vec<Cell<K>> = (0..new_capacity)
            .map(|_| Cell {
                key: K::default(),
                idx: 0,
            })
            .collect();

        for cell in self.cells.iter().filter(|c| c.idx != 0) {
            let mut idx =
                (hash_of(&self.hash_builder, &cell.key) % new_capacity as u64) as usize;
            while new_cells[idx].idx != 0 {
                idx = (idx + 1) % new_capacity;
            }
            new_cells[idx] = cell.clone();
        }

        self.cells = new_cells;
    }
}
