//! In-memory postings records and their packed on-disk form.
//!
//! A postings record associates one primary key with a list of
//! `(secondary_key, count)` pairs: for the inverted index the primary key is
//! a term and the secondaries are the documents containing it; the forward
//! index is the transpose. Counts are strictly positive and the pairs are
//! kept sorted by secondary key.
//!
//! On disk a record is `primary_key`, the pair count as a varint, then each
//! pair as a delta-encoded secondary key followed by its count. Secondary
//! keys are monotone within a record, so the gaps stay small and varint
//! encoding keeps the postings file compact.

use std::io::{Read, Write};

use crate::error::Result;
use crate::ids::{DocId, TermId};
use crate::io::packed;
use crate::io::packed::{PackedRead, PackedWrite};

/// A key type with a raw `u64` form, used for delta encoding.
pub trait RawKey: Copy + Ord {
    /// The raw integer value.
    fn to_raw(self) -> u64;

    /// Reconstructs the key from its raw value.
    fn from_raw(raw: u64) -> Self;
}

impl RawKey for u64 {
    fn to_raw(self) -> u64 {
        self
    }

    fn from_raw(raw: u64) -> Self {
        raw
    }
}

impl RawKey for DocId {
    fn to_raw(self) -> u64 {
        self.get()
    }

    fn from_raw(raw: u64) -> Self {
        DocId::new(raw)
    }
}

impl RawKey for TermId {
    fn to_raw(self) -> u64 {
        self.get()
    }

    fn from_raw(raw: u64) -> Self {
        TermId::new(raw)
    }
}

/// One postings record; see the module docs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingsData<K, S> {
    primary_key: K,
    counts: Vec<(S, u64)>,
}

impl<K, S> PostingsData<K, S> {
    /// Creates an empty record for `primary_key`.
    pub fn new(primary_key: K) -> Self {
        Self {
            primary_key,
            counts: Vec::new(),
        }
    }

    /// Creates a record from raw pairs. Call [`PostingsData::normalize`]
    /// afterwards if the pairs are not already sorted and deduplicated.
    pub fn with_counts(primary_key: K, counts: Vec<(S, u64)>) -> Self {
        Self {
            primary_key,
            counts,
        }
    }

    /// The record's primary key.
    pub fn primary_key(&self) -> &K {
        &self.primary_key
    }

    /// The `(secondary_key, count)` pairs.
    pub fn counts(&self) -> &[(S, u64)] {
        &self.counts
    }

    /// Moves the pairs out of the record.
    pub fn take_counts(&mut self) -> Vec<(S, u64)> {
        std::mem::take(&mut self.counts)
    }

    /// Appends a pair without ordering checks.
    pub fn push(&mut self, secondary: S, count: u64) {
        self.counts.push((secondary, count));
    }

    /// The number of secondary keys in the record.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether the record has no pairs.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The sum of all counts in the record.
    pub fn total_counts(&self) -> u64 {
        self.counts.iter().map(|&(_, c)| c).sum()
    }
}

impl<K, S: RawKey> PostingsData<K, S> {
    /// Sorts the pairs by secondary key and sums adjacent duplicates.
    ///
    /// # Returns
    ///
    /// The number of duplicate secondary keys that were folded together.
    /// Duplicates never arise from a correct chunk flush, but the merge
    /// folds them anyway rather than emitting an unsorted record.
    pub fn normalize(&mut self) -> usize {
        self.counts.sort_unstable_by_key(|&(s, _)| s.to_raw());

        let mut duplicates = 0;
        let mut write = 0usize;
        for read in 0..self.counts.len() {
            if write > 0 && self.counts[write - 1].0 == self.counts[read].0 {
                self.counts[write - 1].1 += self.counts[read].1;
                duplicates += 1;
            } else {
                self.counts.swap(write, read);
                write += 1;
            }
        }
        self.counts.truncate(write);
        duplicates
    }
}

impl<K: PackedWrite, S: RawKey> PostingsData<K, S> {
    /// Writes the record in packed form.
    ///
    /// The pairs must already be sorted by secondary key.
    ///
    /// # Returns
    ///
    /// The number of bytes written.
    pub fn write_packed<W: Write + ?Sized>(&self, out: &mut W) -> Result<u64> {
        debug_assert!(
            self.counts
                .windows(2)
                .all(|w| w[0].0.to_raw() < w[1].0.to_raw()),
            "postings pairs must be sorted and unique before writing"
        );

        let mut bytes = packed::write(out, &self.primary_key)?;
        bytes += packed::write(out, &(self.counts.len() as u64))?;

        let mut previous = 0u64;
        for &(secondary, count) in &self.counts {
            let raw = secondary.to_raw();
            bytes += packed::write(out, &(raw - previous))?;
            bytes += packed::write(out, &count)?;
            previous = raw;
        }
        Ok(bytes)
    }
}

impl<K: PackedRead, S: RawKey> PostingsData<K, S> {
    /// Reads one packed record.
    ///
    /// # Returns
    ///
    /// The record and the number of bytes consumed.
    pub fn read_packed<R: Read + ?Sized>(input: &mut R) -> Result<(Self, u64)> {
        let (primary_key, mut bytes) = packed::read_counted::<K, _>(input)?;
        let (len, len_bytes) = packed::read_counted::<u64, _>(input)?;
        bytes += len_bytes;

        let mut counts = Vec::with_capacity(len as usize);
        let mut previous = 0u64;
        for _ in 0..len {
            let (gap, gap_bytes) = packed::read_counted::<u64, _>(input)?;
            let (count, count_bytes) = packed::read_counted::<u64, _>(input)?;
            bytes += gap_bytes + count_bytes;
            previous += gap;
            counts.push((S::from_raw(previous), count));
        }

        Ok((
            Self {
                primary_key,
                counts,
            },
            bytes,
        ))
    }
}
