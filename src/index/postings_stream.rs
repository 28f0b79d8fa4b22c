//! Streaming decode of one postings record out of a mapped postings file.
//!
//! Rankers walk many postings lists in lock step and only ever need the
//! current head of each, so records are decoded pair by pair instead of
//! being materialized. The stream borrows the index's memory map; its
//! lifetime is tied to the open index.

use crate::error::{Error, Result};
use crate::io::packed;
use crate::io::packed::PackedRead;

use super::postings_data::RawKey;

/// A lazily decoded postings record; see the module docs.
///
/// The record is validated once when the stream is opened, so iteration
/// itself cannot fail.
#[derive(Debug)]
pub struct PostingsStream<'map, S> {
    /// The packed pair region of the record.
    pairs: &'map [u8],
    /// Number of `(secondary, count)` pairs.
    size: u64,
    /// Sum of all counts in the record.
    total_counts: u64,
    _marker: std::marker::PhantomData<S>,
}

impl<'map, S: RawKey> PostingsStream<'map, S> {
    /// Opens the record starting at the beginning of `bytes`, returning its
    /// primary key and the stream over its pairs.
    ///
    /// The whole record is decoded once here to validate it and gather the
    /// size and count totals.
    ///
    /// # Errors
    ///
    /// [`Error::Corrupt`] if the record is truncated or malformed.
    pub fn open<K: PackedRead>(bytes: &'map [u8]) -> Result<(K, Self)> {
        let mut cursor = bytes;
        let (primary_key, key_bytes) = packed::read_counted::<K, _>(&mut cursor)?;
        let (size, len_bytes) = packed::read_counted::<u64, _>(&mut cursor)?;

        let pairs_start = (key_bytes + len_bytes) as usize;
        let mut total_counts = 0u64;
        let mut pair_bytes = 0u64;
        for _ in 0..size {
            let (_, gap_bytes) = packed::read_counted::<u64, _>(&mut cursor)?;
            let (count, count_bytes) = packed::read_counted::<u64, _>(&mut cursor)?;
            pair_bytes += gap_bytes + count_bytes;
            total_counts += count;
        }

        let pairs = &bytes[pairs_start..pairs_start + pair_bytes as usize];
        Ok((
            primary_key,
            Self {
                pairs,
                size,
                total_counts,
                _marker: std::marker::PhantomData,
            },
        ))
    }

    /// The number of secondary keys in the record (for an inverted stream,
    /// the term's document frequency).
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The sum of the record's counts (for an inverted stream, the term's
    /// total occurrences in the corpus).
    pub fn total_counts(&self) -> u64 {
        self.total_counts
    }

    /// Iterates over `(secondary_key, count)` pairs in ascending key order.
    pub fn iter(&self) -> PostingsStreamIter<'map, S> {
        PostingsStreamIter {
            remaining: self.size,
            cursor: self.pairs,
            previous: 0,
            _marker: std::marker::PhantomData,
        }
    }
}

/// Iterator over the pairs of a [`PostingsStream`].
pub struct PostingsStreamIter<'map, S> {
    remaining: u64,
    cursor: &'map [u8],
    previous: u64,
    _marker: std::marker::PhantomData<S>,
}

impl<S: RawKey> Iterator for PostingsStreamIter<'_, S> {
    type Item = (S, u64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        // The record was fully validated at open; decoding cannot fail.
        let gap = packed::read::<u64, _>(&mut self.cursor).ok()?;
        let count = packed::read::<u64, _>(&mut self.cursor).ok()?;
        self.previous += gap;
        Some((S::from_raw(self.previous), count))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining as usize, Some(self.remaining as usize))
    }
}

impl<'a, 'map, S: RawKey> IntoIterator for &'a PostingsStream<'map, S> {
    type Item = (S, u64);
    type IntoIter = PostingsStreamIter<'map, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{DocId, TermId};
    use crate::index::postings_data::PostingsData;

    fn packed_record() -> Vec<u8> {
        let mut pd = PostingsData::new(TermId::new(9));
        pd.push(DocId::new(1), 4);
        pd.push(DocId::new(2), 1);
        pd.push(DocId::new(300), 2);
        let mut buf = Vec::new();
        pd.write_packed(&mut buf).unwrap();
        buf
    }

    #[test]
    fn streams_pairs_in_ascending_order() {
        let buf = packed_record();
        let (term, stream) = PostingsStream::<DocId>::open::<TermId>(&buf).unwrap();

        assert_eq!(term, TermId::new(9));
        assert_eq!(stream.size(), 3);
        assert_eq!(stream.total_counts(), 7);

        let pairs: Vec<(DocId, u64)> = stream.iter().collect();
        assert_eq!(
            pairs,
            vec![
                (DocId::new(1), 4),
                (DocId::new(2), 1),
                (DocId::new(300), 2),
            ]
        );

        // The stream can be walked again from the start.
        assert_eq!(stream.iter().count(), 3);
    }

    #[test]
    fn truncated_record_fails_at_open() {
        let mut buf = packed_record();
        buf.truncate(buf.len() - 1);
        let err = PostingsStream::<DocId>::open::<TermId>(&buf).unwrap_err();
        assert!(matches!(err, Error::Corrupt(_)));
    }
}
