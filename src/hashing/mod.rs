//! Open-addressing hash containers used for chunk accumulation, dictionary
//! maps, and runtime bookkeeping.
//!
//! Four storage layouts are provided, each tuned for a different shape of
//! data:
//!
//! - [`probe_set::ProbeSet`]: insert-only linear-probing set whose keys live
//!   in one contiguous vector. The probe array stores indices into the key
//!   storage, and [`probe_set::ProbeSet::extract_keys`] hands the key vector
//!   back out. This is the in-RAM accumulator used while building chunks.
//! - [`probe_map::ProbeMap`]: linear-probing map with keys inline in the
//!   probe array and values in a side vector.
//! - [`inline_set::InlineKeySet`]: a probing set storing keys directly in
//!   the slot array, with a designated sentinel value marking empty slots.
//!   Suited to small `Copy` keys that have a spare bit pattern.
//! - [`robinhood::RobinHoodMap`]: the general-purpose map. Buckets hold a
//!   cached hash code and an index into separate contiguous entry storage;
//!   insertion equalizes probe-sequence lengths by swapping with richer
//!   occupants, and deletion backward-shifts the following cluster.
//!
//! None of these containers are thread-safe; each is owned by a single
//! thread and the merge phase is single-writer.

use std::hash::{BuildHasher, Hash};

pub mod inline_set;
pub mod probe_map;
pub mod probe_set;
pub mod robinhood;

#[cfg(test)]
mod tests;

/// Default cap on `size / capacity` for the linear-probing containers.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.85;

/// Default growth multiplier applied to the capacity when rehashing.
pub const DEFAULT_RESIZE_RATIO: f64 = 1.5;

/// Computes the hash of `key` under `builder`.
#[inline]
pub(crate) fn hash_of<K: Hash + ?Sized, S: BuildHasher>(builder: &S, key: &K) -> u64 {
    builder.hash_one(key)
}

/// Returns a prime capacity strictly greater than `num`, clamped to the
/// largest entry of the table.
pub(crate) fn next_prime(num: usize) -> usize {
    // Resizing primes borrowed from boost::unordered.
    const PRIMES: &[usize] = &[
        17,
        29,
        37,
        53,
        67,
        79,
        97,
        131,
        193,
        257,
        389,
        521,
        769,
        1031,
        1543,
        2053,
        3079,
        6151,
        12289,
        24593,
        49157,
        98317,
        196613,
        393241,
        786433,
        1572869,
        3145739,
        6291469,
        12582917,
        25165843,
        50331653,
        100663319,
        201326611,
        402653189,
        805306457,
        1610612741,
        3221225473,
        4294967291,
    ];

    match PRIMES.iter().find(|&&p| p > num) {
        Some(&p) => p,
        None => *PRIMES.last().unwrap(),
    }
}

/// Validates a `max_load_factor` configuration value.
pub(crate) fn check_load_factor(mlf: f64) -> crate::error::Result<f64> {
    if !(mlf > 0.0 && mlf < 1.0) {
        return Err(crate::error::Error::BadArgument(format!(
            "max load factor must be in (0, 1), got {mlf}"
        )));
    }
    Ok(mlf)
}

/// Validates a `resize_ratio` configuration value.
pub(crate) fn check_resize_ratio(ratio: f64) -> crate::error::Result<f64> {
    if ratio <= 1.0 {
        return Err(crate::error::Error::BadArgument(format!(
            "resize ratio must be greater than 1, got {ratio}"
        )));
    }
    Ok(ratio)
}
