//! Robin-hood hashing over separate contiguous entry storage.
//!
//! Buckets are `(hash_code, index + 1)` pairs into an entry vector, with a
//! zero index marking an empty bucket. On insertion, whenever the probing
//! candidate has been displaced further from its home bucket than the
//! current occupant, the two swap and probing continues with the displaced
//! occupant; this equalizes probe-sequence lengths and bounds worst-case
//! probes even at high load. Deletion backward-shifts the following cluster
//! until an empty bucket or a zero-displacement occupant. Lookups can stop
//! early once their displacement exceeds the occupant's, which makes missing
//! keys cheap.
//!
//! This is the general-purpose map of the crate: vocabularies, label
//! interning, and the optimizer's per-term tables all sit on it.

use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash, RandomState};

use super::hash_of;

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    hc: u64,
    /// One-based index into the entry storage; 0 means empty.
    idx: usize,
}

impl Bucket {
    #[inline]
    fn occupied(self) -> bool {
        self.idx > 0
    }

    #[inline]
    fn eidx(self) -> usize {
        self.idx - 1
    }
}

/// Robin-hood hash map; see the module docs.
pub struct RobinHoodMap<K, V, S = RandomState> {
    buckets: Vec<Bucket>,
    entries: Vec<(K, V)>,
    max_load_factor: f64,
    hash_builder: S,
}

/// Default cap on `size / bucket_count` before doubling.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.95;

impl<K: Hash + Eq, V> RobinHoodMap<K, V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    /// Creates an empty map with room for `count` entries.
    pub fn with_capacity(count: usize) -> Self {
        let mut map = Self::new();
        map.reserve(count);
        map
    }
}

impl<K: Hash + Eq, V> Default for RobinHoodMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> RobinHoodMap<K, V, S> {
    /// Creates an empty map with an explicit hasher.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            buckets: vec![Bucket::default(); 8],
            entries: Vec::new(),
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            hash_builder,
        }
    }

    /// Inserts `value` under `key` if absent.
    ///
    /// # Returns
    ///
    /// The index of the entry in the entry storage and whether a new entry
    /// was created. An existing entry's value is left untouched; use
    /// [`RobinHoodMap::get_mut`] to update in place.
    pub fn insert(&mut self, key: K, value: V) -> (usize, bool) {
        self.rehash_if_needed(self.next_load_factor());

        let hc = hash_of(&self.hash_builder, &key);
        let mask = self.buckets.len() - 1;
        let mut idx = (hc as usize) & mask;
        let mut num_probes = 0usize;

        loop {
            if !self.buckets[idx].occupied() {
                self.entries.push((key, value));
                self.buckets[idx] = Bucket {
                    hc,
                    idx: self.entries.len(),
                };
                return (self.buckets[idx].eidx(), true);
            }

            let eidx = self.buckets[idx].eidx();
            if self.buckets[idx].hc == hc && self.entries[eidx].0 == key {
                return (eidx, false);
            }

            let dib = self.distance_from_initial(idx);
            if num_probes > dib {
                // Steal from the rich: the new entry takes this bucket and
                // the displaced occupant continues probing.
                self.entries.push((key, value));
                let displaced = self.buckets[idx];
                self.buckets[idx] = Bucket {
                    hc,
                    idx: self.entries.len(),
                };
                let entry_idx = self.buckets[idx].eidx();

                self.robinhood_insert(displaced, (idx + 1) & mask, dib + 1);
                return (entry_idx, true);
            }

            idx = (idx + 1) & mask;
            num_probes += 1;
        }
    }

    /// Returns the value for `key`, if present.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let bucket = self.find_bucket(key)?;
        Some(&self.entries[self.buckets[bucket].eidx()].1)
    }

    /// Returns a mutable reference to the value for `key`, if present.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let bucket = self.find_bucket(key)?;
        let eidx = self.buckets[bucket].eidx();
        Some(&mut self.entries[eidx].1)
    }

    /// Whether `key` has an entry.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_bucket(key).is_some()
    }

    /// Returns a mutable reference to the value for `key`, inserting the
    /// result of `default` on a miss.
    pub fn get_or_insert_with(&mut self, key: K, default: impl FnOnce() -> V) -> &mut V {
        let (idx, _) = self.insert_with(key, default);
        &mut self.entries[idx].1
    }

    fn insert_with(&mut self, key: K, default: impl FnOnce() -> V) -> (usize, bool) {
        match self.find_bucket(&key) {
            Some(bucket) => (self.buckets[bucket].eidx(), false),
            None => self.insert(key, default()),
        }
    }

    /// Removes `key`, returning whether an entry was erased.
    ///
    /// Erasure swap-removes the entry, repoints the bucket of the moved
    /// entry, and then backward-shifts the probe cluster that followed the
    /// erased bucket.
    pub fn erase<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(bucket_idx) = self.find_bucket(key) else {
            return false;
        };

        let eidx = self.buckets[bucket_idx].eidx();
        let last = self.entries.len() - 1;
        if eidx != last {
            self.entries.swap(eidx, last);
            let moved_bucket = self
                .find_bucket::<K>(&self.entries[eidx].0)
                .expect("moved entry must have a bucket");
            self.buckets[moved_bucket].idx = eidx + 1;
        }
        self.entries.pop();
        self.buckets[bucket_idx] = Bucket::default();

        // Backward-shift until the cluster ends or an entry is already in
        // its home bucket.
        let mask = self.buckets.len() - 1;
        let mut prev = bucket_idx;
        let mut idx = (bucket_idx + 1) & mask;
        loop {
            if !self.buckets[idx].occupied() || self.distance_from_initial(idx) == 0 {
                return true;
            }
            self.buckets.swap(prev, idx);
            prev = idx;
            idx = (idx + 1) & mask;
        }
    }

    /// Iterates over `(key, value)` pairs in entry-storage order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Iterates with mutable access to the values.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V)> {
        self.entries.iter_mut().map(|(k, v)| (&*k, v))
    }

    /// The number of entries in the map.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The number of buckets currently allocated.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Empties the map, keeping the bucket allocation.
    pub fn clear(&mut self) {
        self.buckets.fill(Bucket::default());
        self.entries.clear();
    }

    /// Moves the entry storage out and empties the map.
    pub fn extract(&mut self) -> Vec<(K, V)> {
        let entries = std::mem::take(&mut self.entries);
        self.buckets.fill(Bucket::default());
        entries
    }

    /// An estimate of the heap bytes held by the container.
    pub fn bytes_used(&self) -> usize {
        std::mem::size_of::<Bucket>() * self.buckets.capacity()
            + std::mem::size_of::<(K, V)>() * self.entries.capacity()
    }

    /// Current `size / bucket_count`.
    pub fn load_factor(&self) -> f64 {
        self.entries.len() as f64 / self.buckets.len() as f64
    }

    /// The load factor that would result from one more insert.
    pub fn next_load_factor(&self) -> f64 {
        (self.entries.len() + 1) as f64 / self.buckets.len() as f64
    }

    /// The configured load-factor cap.
    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    /// Reconfigures the load-factor cap, rehashing if the map is already
    /// past it.
    pub fn set_max_load_factor(&mut self, mlf: f64) {
        self.max_load_factor = mlf;
        self.rehash_if_needed(self.load_factor());
    }

    /// Ensures capacity for `count` entries without further rehashing.
    pub fn reserve(&mut self, count: usize) {
        self.entries.reserve(count);
        let buckets = (count as f64 / self.max_load_factor).ceil() as usize;
        self.rehash(buckets);
    }

    /// Rehashes into at least `count` buckets (rounded up to a power of
    /// two). No-op if the bucket count would not change or the resulting
    /// load factor would exceed the cap.
    pub fn rehash(&mut self, count: usize) {
        let next_size = count.max(8).next_power_of_two();
        if next_size == self.buckets.len()
            || self.entries.len() as f64 / next_size as f64 > self.max_load_factor
        {
            return;
        }

        let old_buckets = std::mem::replace(&mut self.buckets, vec![Bucket::default(); next_size]);
        let mask = self.buckets.len() - 1;
        for bucket in old_buckets {
            if !bucket.occupied() {
                continue;
            }
            self.robinhood_insert(bucket, (bucket.hc as usize) & mask, 0);
        }
    }

    /// The largest displacement of any occupied bucket. Diagnostic; the
    /// robin-hood invariant keeps this small even near the load cap.
    pub fn max_displacement(&self) -> usize {
        (0..self.buckets.len())
            .filter(|&i| self.buckets[i].occupied())
            .map(|i| self.distance_from_initial(i))
            .max()
            .unwrap_or(0)
    }

    fn rehash_if_needed(&mut self, load: f64) {
        if load > self.max_load_factor {
            self.rehash(self.buckets.len() * 2);
        }
    }

    #[inline]
    fn distance_from_initial(&self, bucket_idx: usize) -> usize {
        let initial = (self.buckets[bucket_idx].hc as usize) & (self.buckets.len() - 1);
        if bucket_idx < initial {
            // wrapped around the end of the table
            self.buckets.len() - initial + bucket_idx
        } else {
            bucket_idx - initial
        }
    }

    /// Locates the bucket holding `key`, cutting the probe short as soon as
    /// the displacement exceeds the occupant's.
    fn find_bucket<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hc = hash_of(&self.hash_builder, key);
        let mask = self.buckets.len() - 1;
        let mut idx = (hc as usize) & mask;
        let mut num_probes = 0usize;

        loop {
            if !self.buckets[idx].occupied() {
                return None;
            }
            if self.buckets[idx].hc == hc
                && self.entries[self.buckets[idx].eidx()].0.borrow() == key
            {
                return Some(idx);
            }
            if num_probes > self.distance_from_initial(idx) {
                return None;
            }
            num_probes += 1;
            idx = (idx + 1) & mask;
        }
    }

    /// Bumps `bucket` down the probe chain until an empty position, swapping
    /// whenever the carried bucket out-ranks the occupant.
    fn robinhood_insert(&mut self, mut bucket: Bucket, mut idx: usize, mut num_probes: usize) {
        let mask = self.buckets.len() - 1;
        loop {
            if !self.buckets[idx].occupied() {
                self.buckets[idx] = bucket;
                return;
            }

            let dib = self.distance_from_initial(idx);
            if num_probes > dib {
                std::mem::swap(&mut bucket, &mut self.buckets[idx]);
                num_probes = dib;
            }

            num_probes += 1;
            idx = (idx + 1) & mask;
        }
    }
}
