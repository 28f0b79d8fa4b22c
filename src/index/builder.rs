//! Index construction: parallel tokenization, in-RAM accumulation,
//! budget-triggered chunk flushes, and the final k-way merges.
//!
//! Worker threads pull documents off a shared iterator, run the analyzer,
//! intern term strings to dense ids through a concurrent map, and feed an
//! in-RAM accumulator (a probe set keyed by term id with postings lists
//! stored alongside). When a worker's share of the RAM budget is exceeded
//! the accumulator is sorted and flushed as a chunk file. A dedicated
//! writer thread reorders per-document records back into id order and
//! writes metadata and labels as it goes.
//!
//! Once the corpus is exhausted the chunk files are k-way merged into
//! `postings.db` (building the lexicon along the way), the forward chunks
//! are merged the same way, and the vocabulary files are serialized.
//!
//! Failure handling is deliberately blunt: chunk files are deleted on any
//! error and the caller rebuilds from scratch. There is no journaling.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc;

use dashmap::DashMap;
use indicatif::ProgressBar;
use log::debug;

use crate::analyzers::Analyzer;
use crate::config::IndexerConfig;
use crate::corpus::Document;
use crate::error::{Error, Result};
use crate::hashing::probe_set::ProbeSet;
use crate::ids::{DocId, LabelId, TermId};
use crate::io::disk_vector::write_disk_vector;
use crate::io::packed::{PackedRead, PackedWrite};

use super::chunk_reader::{ChunkReader, multiway_merge};
use super::index_files::{IndexFile, chunk_file_name, forward_chunk_file_name, is_chunk_file};
use super::labels::LabelInterner;
use super::metadata_file::{FieldInfo, FieldValue, MetadataWriter, Schema};
use super::postings_data::{PostingsData, RawKey};

use super::vocabulary::write_vocabulary;

/// Summary of a completed build.
#[derive(Debug, Clone, Copy)]
pub struct BuildStats {
    /// Number of documents indexed.
    pub num_docs: u64,
    /// Number of distinct terms in the vocabulary.
    pub unique_terms: u64,
    /// Number of inverted chunk files merged.
    pub inverted_chunks: usize,
}

/// Builds the on-disk index file set from a document stream.
pub struct IndexBuilder<A> {
    analyzer: A,
    config: IndexerConfig,
}

/// Per-document record routed to the metadata writer thread.
struct DocRecord {
    doc_id: u64,
    length: u64,
    unique_terms: u64,
    label: Option<String>,
    fields: Vec<(String, FieldValue)>,
}

/// Orders doc records by id for the writer's reorder heap.
struct Pending(DocRecord);

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.0.doc_id == other.0.doc_id
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.doc_id.cmp(&other.0.doc_id)
    }
}

/// One worker's in-RAM postings accumulator plus its forward buffer.
struct Accumulator {
    /// Term keys; postings lists live in `postings`, parallel by index.
    terms: ProbeSet<TermId>,
    postings: Vec<Vec<(DocId, u64)>>,
    forward: Vec<PostingsData<DocId, TermId>>,
    /// Running estimate of postings/forward heap bytes; the probe set
    /// reports its own usage separately.
    bytes: usize,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            terms: ProbeSet::new(),
            postings: Vec::new(),
            forward: Vec::new(),
            bytes: 0,
        }
    }

    fn add(&mut self, term: TermId, doc: DocId, count: u64) {
        match self.terms.find(&term) {
            Some(idx) => self.postings[idx].push((doc, count)),
            None => {
                let idx = self.terms.insert(term);
                debug_assert_eq!(idx, self.postings.len());
                self.postings.push(vec![(doc, count)]);
                self.bytes += std::mem::size_of::<Vec<(DocId, u64)>>();
            }
        }
        self.bytes += std::mem::size_of::<(DocId, u64)>();
    }

    fn bytes_used(&self) -> usize {
        self.bytes + self.terms.bytes_used()
    }

    fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.forward.is_empty()
    }
}

impl<A: Analyzer> IndexBuilder<A> {
    /// Creates a builder with default configuration.
    pub fn new(analyzer: A) -> Self {
        Self::with_config(analyzer, IndexerConfig::default())
    }

    /// Creates a builder with explicit configuration.
    pub fn with_config(analyzer: A, config: IndexerConfig) -> Self {
        Self { analyzer, config }
    }

    /// Builds the full index file set for `documents` into `index_dir`.
    ///
    /// Document ids are assigned densely in iteration order. On any error
    /// the intermediate chunk files are removed and the error is returned;
    /// a partially built index must be rebuilt.
    pub fn build<I>(&self, documents: I, index_dir: &Path) -> Result<BuildStats>
    where
        I: IntoIterator<Item = Document>,
        I::IntoIter: Send,
    {
        std::fs::create_dir_all(index_dir)?;

        let result = self.build_inner(documents.into_iter(), index_dir);
        if result.is_err() {
            sweep_chunk_files(index_dir);
        }
        result
    }

    fn build_inner(
        &self,
        documents: impl Iterator<Item = Document> + Send,
        index_dir: &Path,
    ) -> Result<BuildStats> {
        let term_ids: DashMap<String, TermId> = DashMap::new();
        let next_term_id = AtomicU64::new(0);
        let next_chunk = AtomicUsize::new(0);
        let next_forward_chunk = AtomicUsize::new(0);

        // (next doc id, document source); workers pull under the lock.
        let source = Mutex::new((0u64, documents));
        let (record_tx, record_rx) = mpsc::channel::<DocRecord>();

        let num_threads = self.config.num_threads.max(1);
        let per_worker_budget = (self.config.ram_budget_bytes / num_threads).max(1 << 16);

        let progress = ProgressBar::new_spinner().with_message("tokenizing documents");

        let (worker_results, writer_result) = std::thread::scope(|scope| {
            let source = &source;
            let term_ids = &term_ids;
            let next_term_id = &next_term_id;
            let next_chunk = &next_chunk;
            let next_forward_chunk = &next_forward_chunk;
            let progress = &progress;

            let mut workers = Vec::new();
            for _ in 0..num_threads {
                let record_tx = record_tx.clone();
                workers.push(scope.spawn(move || {
                    self.run_worker(
                        source,
                        term_ids,
                        next_term_id,
                        next_chunk,
                        next_forward_chunk,
                        record_tx,
                        per_worker_budget,
                        index_dir,
                        progress,
                    )
                }));
            }
            drop(record_tx);

            let writer = scope.spawn(move || run_metadata_writer(record_rx, index_dir));

            let worker_results: Vec<Result<()>> = workers
                .into_iter()
                .map(|worker| worker.join().expect("worker thread panicked"))
                .collect();
            let writer_result = writer.join().expect("metadata writer panicked");
            (worker_results, writer_result)
        });

        progress.finish_and_clear();

        // The writer's error is the root cause when it exits early; the
        // workers then only report that their channel closed.
        let (interner, assignments) = writer_result?;
        for result in worker_results {
            result?;
        }

        let num_docs = assignments.len() as u64;
        interner.write(index_dir, &assignments)?;

        // Merge the inverted chunks into postings.db, building the lexicon
        // from the record offsets as they are written.
        let inverted_chunks = next_chunk.load(Ordering::Acquire);
        let unique_terms = next_term_id.load(Ordering::Acquire);
        let num_merged = merge_postings::<TermId, DocId>(
            (0..inverted_chunks)
                .map(|c| chunk_file_name(index_dir, c))
                .collect(),
            IndexFile::PostingsDb.path_in(index_dir),
            IndexFile::PostingsIndex.path_in(index_dir),
            "merging postings",
        )?;
        if num_merged != unique_terms {
            return Err(Error::Invariant(format!(
                "merge produced {num_merged} terms, interning assigned {unique_terms}"
            )));
        }

        // Merge the forward chunks the same way; one record per document.
        let forward_chunks = next_forward_chunk.load(Ordering::Acquire);
        let num_forward = merge_postings::<DocId, TermId>(
            (0..forward_chunks)
                .map(|c| forward_chunk_file_name(index_dir, c))
                .collect(),
            IndexFile::ForwardDb.path_in(index_dir),
            IndexFile::ForwardIndex.path_in(index_dir),
            "merging forward postings",
        )?;
        if num_forward != num_docs {
            return Err(Error::Invariant(format!(
                "forward merge produced {num_forward} records for {num_docs} documents"
            )));
        }

        write_vocabulary(index_dir, term_ids.into_iter().collect())?;

        Ok(BuildStats {
            num_docs,
            unique_terms,
            inverted_chunks,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn run_worker(
        &self,
        source: &Mutex<(u64, impl Iterator<Item = Document>)>,
        term_ids: &DashMap<String, TermId>,
        next_term_id: &AtomicU64,
        next_chunk: &AtomicUsize,
        next_forward_chunk: &AtomicUsize,
        record_tx: mpsc::Sender<DocRecord>,
        budget: usize,
        index_dir: &Path,
        progress: &ProgressBar,
    ) -> Result<()> {
        let mut accumulator = Accumulator::new();

        loop {
            let (doc_id, document) = {
                let mut guard = source.lock().expect("lock poisoned");
                match guard.1.next() {
                    Some(document) => {
                        let id = guard.0;
                        guard.0 += 1;
                        (id, document)
                    }
                    None => break,
                }
            };
            let doc = DocId::new(doc_id);

            let counts = self.analyzer.analyze(&document.content);
            let length: u64 = counts.values().sum();
            let unique_terms = counts.len() as u64;

            let mut forward = PostingsData::new(doc);
            for (term, count) in counts {
                let term_id = *term_ids
                    .entry(term)
                    .or_insert_with(|| TermId::new(next_term_id.fetch_add(1, Ordering::Relaxed)));
                forward.push(term_id, count);
                accumulator.add(term_id, doc, count);
            }
            forward.normalize();
            accumulator.bytes += forward.len() * std::mem::size_of::<(TermId, u64)>()
                + std::mem::size_of::<PostingsData<DocId, TermId>>();
            accumulator.forward.push(forward);

            record_tx
                .send(DocRecord {
                    doc_id,
                    length,
                    unique_terms,
                    label: document.label,
                    fields: document.metadata,
                })
                .map_err(|_| {
                    Error::Invariant("metadata writer exited before the workers".to_string())
                })?;

            progress.inc(1);

            if accumulator.bytes_used() > budget {
                debug!(
                    "flushing accumulator at {} bytes (budget {budget})",
                    accumulator.bytes_used()
                );
                flush_accumulator(&mut accumulator, index_dir, next_chunk, next_forward_chunk)?;
            }
        }

        if !accumulator.is_empty() {
            flush_accumulator(&mut accumulator, index_dir, next_chunk, next_forward_chunk)?;
        }
        Ok(())
    }
}

/// Opens `chunk_paths` and merges them into a packed database file plus its
/// fixed-width offset vector. Returns the number of records written.
fn merge_postings<K, S>(
    chunk_paths: Vec<PathBuf>,
    db_path: PathBuf,
    index_path: PathBuf,
    label: &str,
) -> Result<u64>
where
    K: PackedRead + PackedWrite + Ord + Clone,
    S: RawKey,
{
    let mut readers = Vec::with_capacity(chunk_paths.len());
    for path in chunk_paths {
        readers.push(ChunkReader::<K, S>::open(path)?);
    }

    let mut out = BufWriter::new(File::create(&db_path)?);
    let mut offsets: Vec<u64> = Vec::new();
    let mut position = 0u64;

    let merged = multiway_merge(readers, label, |pd| {
        offsets.push(position);
        position += pd.write_packed(&mut out).map_err(disk_full_to_budget)?;
        Ok(())
    })?;

    out.flush()?;
    write_disk_vector(&index_path, &offsets)?;
    Ok(merged)
}

/// Sorts and writes one worker's accumulated postings as chunk files, then
/// resets the accumulator.
fn flush_accumulator(
    accumulator: &mut Accumulator,
    index_dir: &Path,
    next_chunk: &AtomicUsize,
    next_forward_chunk: &AtomicUsize,
) -> Result<()> {
    if !accumulator.terms.is_empty() {
        let terms = accumulator.terms.extract_keys();
        let postings = std::mem::take(&mut accumulator.postings);

        let mut entries: Vec<(TermId, Vec<(DocId, u64)>)> =
            terms.into_iter().zip(postings).collect();
        entries.sort_unstable_by_key(|&(term, _)| term);

        let chunk = next_chunk.fetch_add(1, Ordering::AcqRel);
        let path = chunk_file_name(index_dir, chunk);
        let mut out = BufWriter::new(File::create(&path).map_err(io_disk_full_to_budget)?);
        for (term, counts) in entries {
            let mut pd = PostingsData::with_counts(term, counts);
            pd.normalize();
            pd.write_packed(&mut out).map_err(disk_full_to_budget)?;
        }
        out.flush().map_err(io_disk_full_to_budget)?;
    }

    if !accumulator.forward.is_empty() {
        let mut records = std::mem::take(&mut accumulator.forward);
        records.sort_unstable_by_key(|pd| *pd.primary_key());

        let chunk = next_forward_chunk.fetch_add(1, Ordering::AcqRel);
        let path = forward_chunk_file_name(index_dir, chunk);
        let mut out = BufWriter::new(File::create(&path).map_err(io_disk_full_to_budget)?);
        for pd in records {
            pd.write_packed(&mut out).map_err(disk_full_to_budget)?;
        }
        out.flush().map_err(io_disk_full_to_budget)?;
    }

    accumulator.bytes = 0;
    Ok(())
}

/// Receives per-document records, restores id order, and writes metadata
/// and label assignments.
fn run_metadata_writer(
    record_rx: mpsc::Receiver<DocRecord>,
    index_dir: &Path,
) -> Result<(LabelInterner, Vec<LabelId>)> {
    let mut writer: Option<MetadataWriter> = None;
    let mut interner = LabelInterner::new();
    let mut assignments: Vec<LabelId> = Vec::new();

    let mut pending: BinaryHeap<Reverse<Pending>> = BinaryHeap::new();
    let mut next_doc = 0u64;

    while let Ok(record) = record_rx.recv() {
        if record.doc_id != next_doc {
            pending.push(Reverse(Pending(record)));
            continue;
        }

        write_doc_record(record, &mut writer, &mut interner, &mut assignments, index_dir)?;
        next_doc += 1;

        while pending
            .peek()
            .is_some_and(|Reverse(Pending(r))| r.doc_id == next_doc)
        {
            let Reverse(Pending(record)) = pending.pop().expect("peeked above");
            write_doc_record(record, &mut writer, &mut interner, &mut assignments, index_dir)?;
            next_doc += 1;
        }
    }

    if !pending.is_empty() {
        return Err(Error::Invariant(format!(
            "metadata writer finished with {} records out of order",
            pending.len()
        )));
    }

    let writer = match writer {
        Some(w) => w,
        None => MetadataWriter::create(index_dir, Vec::new())?,
    };
    writer.finish(index_dir)?;

    Ok((interner, assignments))
}

/// Writes one document's metadata record and label assignment, creating the
/// metadata writer from the first record's field schema.
fn write_doc_record(
    record: DocRecord,
    writer: &mut Option<MetadataWriter>,
    interner: &mut LabelInterner,
    assignments: &mut Vec<LabelId>,
    index_dir: &Path,
) -> Result<()> {
    if writer.is_none() {
        let schema: Schema = record
            .fields
            .iter()
            .map(|(name, value)| FieldInfo::new(name.clone(), value.field_type()))
            .collect();
        *writer = Some(MetadataWriter::create(index_dir, schema)?);
    }
    let writer = writer.as_mut().expect("created above");

    let values: Vec<FieldValue> = record.fields.into_iter().map(|(_, v)| v).collect();
    writer.write_record(record.length, record.unique_terms, &values)?;

    let label_id = match record.label {
        Some(label) => interner.intern(&label)?,
        None => LabelInterner::unlabeled(),
    };
    assignments.push(label_id);
    Ok(())
}

/// Removes leftover chunk files after a failed build.
fn sweep_chunk_files(index_dir: &Path) {
    let Ok(entries) = std::fs::read_dir(index_dir) else {
        return;
    };
    for entry in entries.flatten() {
        if let Some(name) = entry.file_name().to_str()
            && is_chunk_file(name)
        {
            let _ = std::fs::remove_file(entry.path());
        }
    }
}

/// A flush that fails because the disk filled up is a budget error, not a
/// plain I/O error.
fn disk_full_to_budget(error: Error) -> Error {
    match error {
        Error::Io(e) if e.kind() == std::io::ErrorKind::StorageFull => {
            Error::OutOfBudget("disk full while flushing a chunk".to_string())
        }
        other => other,
    }
}

fn io_disk_full_to_budget(error: std::io::Error) -> Error {
    disk_full_to_budget(Error::Io(error))
}
