//! Chunk files and the k-way merge that combines them.
//!
//! During indexing the in-RAM accumulator is flushed to disk whenever it
//! outgrows its budget, producing chunk files of packed postings records
//! sorted by primary key. A [`ChunkReader`] owns exactly one such file and
//! buffers its current record; when the reader is dropped the chunk file is
//! deleted, so a completed merge leaves no intermediates behind.
//!
//! [`multiway_merge`] combines any number of chunk readers into a single
//! sorted record stream, concatenating the counts of records that share a
//! primary key.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use log::warn;

use crate::error::Result;
use crate::io::packed::{PackedRead, PackedWrite};

use super::postings_data::{PostingsData, RawKey};

/// Reads packed postings records out of one on-disk chunk.
///
/// The reader deletes its chunk file when dropped.
pub struct ChunkReader<K, S> {
    path: PathBuf,
    file: BufReader<File>,
    postings: Option<PostingsData<K, S>>,
    total_bytes: u64,
    bytes_read: u64,
}

impl<K: PackedRead, S: RawKey> ChunkReader<K, S> {
    /// Opens the chunk at `path` and buffers its first record.
    pub fn open(path: PathBuf) -> Result<Self> {
        let file = File::open(&path)?;
        let total_bytes = file.metadata()?.len();
        let mut reader = Self {
            path,
            file: BufReader::new(file),
            postings: None,
            total_bytes,
            bytes_read: 0,
        };
        reader.advance()?;
        Ok(reader)
    }

    /// The currently buffered record, or `None` once the chunk is
    /// exhausted.
    pub fn postings(&self) -> Option<&PostingsData<K, S>> {
        self.postings.as_ref()
    }

    /// Takes the buffered record out, leaving the reader positioned for
    /// [`ChunkReader::advance`].
    pub fn take_postings(&mut self) -> Option<PostingsData<K, S>> {
        self.postings.take()
    }

    /// Reads the next record from the chunk, if any bytes remain.
    pub fn advance(&mut self) -> Result<()> {
        if self.bytes_read >= self.total_bytes {
            self.postings = None;
            return Ok(());
        }
        let (postings, bytes) = PostingsData::read_packed(&mut self.file)?;
        self.bytes_read += bytes;
        self.postings = Some(postings);
        Ok(())
    }

    /// Whether the chunk has been fully consumed.
    pub fn is_exhausted(&self) -> bool {
        self.postings.is_none()
    }

    /// Bytes consumed so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Total bytes in the chunk file.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }
}

impl<K, S> Drop for ChunkReader<K, S> {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("failed to remove chunk file {}: {e}", self.path.display());
        }
    }
}

/// Merges sorted chunk readers into one sorted record stream.
///
/// Repeatedly takes the smallest current primary key across all readers,
/// concatenates the counts of every reader positioned at that key,
/// normalizes the combined counts (sorting by secondary key and summing any
/// duplicate secondaries), and hands the merged record to `sink`. Exhausted
/// readers are dropped as the merge proceeds, which deletes their files.
///
/// Progress is reported in bytes read across all chunks.
///
/// # Returns
///
/// The number of unique primary keys emitted.
pub fn multiway_merge<K, S>(
    mut to_merge: Vec<ChunkReader<K, S>>,
    label: &str,
    mut sink: impl FnMut(PostingsData<K, S>) -> Result<()>,
) -> Result<u64>
where
    K: PackedRead + PackedWrite + Ord + Clone,
    S: RawKey,
{
    to_merge.retain(|reader| !reader.is_exhausted());

    let total: u64 = to_merge.iter().map(ChunkReader::total_bytes).sum();
    let progress = ProgressBar::new(total).with_style(
        ProgressStyle::with_template("{msg} [{bar:40}] {bytes}/{total_bytes}")
            .expect("static template")
            .progress_chars("=> "),
    );
    progress.set_message(label.to_string());

    let mut unique_primary_keys = 0u64;
    while !to_merge.is_empty() {
        progress.set_position(to_merge.iter().map(ChunkReader::bytes_read).sum());
        unique_primary_keys += 1;

        to_merge.sort_by(|a, b| {
            a.postings()
                .map(PostingsData::primary_key)
                .cmp(&b.postings().map(PostingsData::primary_key))
        });

        let min_key = to_merge[0]
            .postings()
            .map(|pd| pd.primary_key().clone())
            .expect("exhausted readers are removed before sorting");

        // Gather counts from the run of readers positioned at the minimum
        // key, advancing each as it is consumed.
        let mut counts = Vec::new();
        for reader in &mut to_merge {
            match reader.postings() {
                Some(pd) if pd.primary_key() == &min_key => {}
                _ => break,
            }
            let mut pd = reader.take_postings().expect("checked above");
            counts.append(&mut pd.take_counts());
            reader.advance()?;
        }

        let mut merged = PostingsData::with_counts(min_key, counts);
        let duplicates = merged.normalize();
        if duplicates > 0 {
            warn!("merged {duplicates} duplicate secondary keys into one record");
        }
        sink(merged)?;

        to_merge.retain(|reader| !reader.is_exhausted());
    }

    progress.finish_and_clear();
    Ok(unique_primary_keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{DocId, TermId};

    fn write_chunk(dir: &std::path::Path, name: &str, records: &[(u64, &[(u64, u64)])]) -> PathBuf {
        let path = dir.join(name);
        let mut buf = Vec::new();
        for &(term, pairs) in records {
            let counts = pairs
                .iter()
                .map(|&(d, c)| (DocId::new(d), c))
                .collect::<Vec<_>>();
            let pd = PostingsData::with_counts(TermId::new(term), counts);
            pd.write_packed(&mut buf).unwrap();
        }
        std::fs::write(&path, buf).unwrap();
        path
    }

    #[test]
    fn reader_walks_records_and_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_chunk(dir.path(), "chunk-0.bin", &[(0, &[(1, 2)]), (3, &[(0, 1)])]);

        {
            let mut reader = ChunkReader::<TermId, DocId>::open(path.clone()).unwrap();
            assert_eq!(reader.postings().unwrap().primary_key(), &TermId::new(0));
            reader.advance().unwrap();
            assert_eq!(reader.postings().unwrap().primary_key(), &TermId::new(3));
            reader.advance().unwrap();
            assert!(reader.is_exhausted());
            assert_eq!(reader.bytes_read(), reader.total_bytes());
        }

        assert!(!path.exists(), "chunk file must be deleted on drop");
    }

    #[test]
    fn merge_combines_counts_across_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_chunk(
            dir.path(),
            "chunk-0.bin",
            &[(0, &[(0, 1), (2, 1)]), (2, &[(0, 3)])],
        );
        let b = write_chunk(
            dir.path(),
            "chunk-1.bin",
            &[(0, &[(1, 5)]), (1, &[(2, 2)]), (2, &[(1, 1)])],
        );

        let readers = vec![
            ChunkReader::<TermId, DocId>::open(a).unwrap(),
            ChunkReader::<TermId, DocId>::open(b).unwrap(),
        ];

        let mut merged = Vec::new();
        let unique = multiway_merge(readers, "merging", |pd| {
            merged.push(pd);
            Ok(())
        })
        .unwrap();

        assert_eq!(unique, 3);
        assert_eq!(merged.len(), 3);

        assert_eq!(merged[0].primary_key(), &TermId::new(0));
        assert_eq!(
            merged[0].counts(),
            &[(DocId::new(0), 1), (DocId::new(1), 5), (DocId::new(2), 1)]
        );

        assert_eq!(merged[1].primary_key(), &TermId::new(1));
        assert_eq!(merged[1].counts(), &[(DocId::new(2), 2)]);

        assert_eq!(merged[2].primary_key(), &TermId::new(2));
        assert_eq!(
            merged[2].counts(),
            &[(DocId::new(0), 3), (DocId::new(1), 1)]
        );
    }

    #[test]
    fn merge_sums_duplicate_doc_ids() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_chunk(dir.path(), "chunk-0.bin", &[(5, &[(7, 2)])]);
        let b = write_chunk(dir.path(), "chunk-1.bin", &[(5, &[(7, 3)])]);

        let readers = vec![
            ChunkReader::<TermId, DocId>::open(a).unwrap(),
            ChunkReader::<TermId, DocId>::open(b).unwrap(),
        ];

        let mut merged = Vec::new();
        multiway_merge(readers, "merging", |pd| {
            merged.push(pd);
            Ok(())
        })
        .unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].counts(), &[(DocId::new(7), 5)]);
    }

    #[test]
    fn merge_of_single_chunk_is_identity() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_chunk(dir.path(), "chunk-0.bin", &[(1, &[(0, 1)]), (4, &[(9, 9)])]);
        let readers = vec![ChunkReader::<TermId, DocId>::open(a).unwrap()];

        let mut keys = Vec::new();
        let unique = multiway_merge(readers, "merging", |pd| {
            keys.push(*pd.primary_key());
            Ok(())
        })
        .unwrap();

        assert_eq!(unique, 2);
        assert_eq!(keys, vec![TermId::new(1), TermId::new(4)]);
    }
}
