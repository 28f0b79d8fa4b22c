//! The disk-resident forward index: document → term-count vectors.
//!
//! Structurally the transpose of the inverted index, sharing its record
//! format (`forward.index` offsets into packed `forward.db` records with
//! `doc_id` primary keys and `term_id` secondaries). Feedback operators
//! walk whole document vectors repeatedly, so decoded records are kept in a
//! sharded double-LRU cache and handed out as `Arc`s.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::Mmap;

use crate::caching::dblru_cache::DblruCache;
use crate::caching::shard_cache::ShardCache;
use crate::error::{Error, Result};
use crate::ids::{DocId, TermId};
use crate::io::disk_vector::DiskVector;

use super::index_files::IndexFile;
use super::postings_data::PostingsData;
use super::postings_stream::PostingsStream;

type RecordCache = ShardCache<DocId, Arc<ForwardRecord>, DblruCache<DocId, Arc<ForwardRecord>>>;

/// A decoded forward postings record.
pub type ForwardRecord = PostingsData<DocId, TermId>;

/// A queryable forward index; see the module docs.
pub struct ForwardIndex {
    dir: PathBuf,
    lexicon: DiskVector<u64>,
    db: Option<Mmap>,
    cache: RecordCache,
}

impl ForwardIndex {
    /// Memory-maps the forward files in `index_dir` with default cache
    /// sizing.
    pub fn open(index_dir: &Path) -> Result<Self> {
        Self::open_with_cache(index_dir, 8192, 8)
    }

    /// Memory-maps the forward files with explicit record-cache sizing:
    /// `cache_max_size` entries per shard across `cache_shards` shards.
    pub fn open_with_cache(
        index_dir: &Path,
        cache_max_size: u64,
        cache_shards: usize,
    ) -> Result<Self> {
        let lexicon = DiskVector::<u64>::open(&IndexFile::ForwardIndex.path_in(index_dir))?;

        let file = File::open(IndexFile::ForwardDb.path_in(index_dir))?;
        let db = if file.metadata()?.len() == 0 {
            None
        } else {
            Some(unsafe { Mmap::map(&file)? })
        };

        Ok(Self {
            dir: index_dir.to_path_buf(),
            lexicon,
            db,
            cache: ShardCache::with_shards(cache_shards, || DblruCache::new(cache_max_size)),
        })
    }

    /// The directory this index was opened from.
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// The number of documents in the corpus.
    pub fn num_docs(&self) -> u64 {
        self.lexicon.len() as u64
    }

    /// Iterates over every document id in the corpus.
    pub fn docs(&self) -> impl Iterator<Item = DocId> + '_ {
        (0..self.num_docs()).map(DocId::new)
    }

    /// The term-count record of `doc`, served from the record cache when
    /// possible.
    pub fn search_primary(&self, doc: DocId) -> Result<Arc<ForwardRecord>> {
        if let Some(record) = self.cache.find(&doc) {
            return Ok(record);
        }

        let mut record = ForwardRecord::new(doc);
        for (term, count) in self.stream_for(doc)?.iter() {
            record.push(term, count);
        }
        let record = Arc::new(record);
        self.cache.insert(doc, Arc::clone(&record));
        Ok(record)
    }

    /// Opens a streaming view of the term counts of `doc`.
    pub fn stream_for(&self, doc: DocId) -> Result<PostingsStream<'_, TermId>> {
        let offset = self
            .lexicon
            .get(doc.get() as usize)
            .ok_or_else(|| Error::BadArgument(format!("doc {doc} is not in this index")))?;

        let db = self
            .db
            .as_ref()
            .ok_or_else(|| Error::Corrupt("forward database is empty".to_string()))?;
        if offset as usize >= db.len() {
            return Err(Error::Corrupt(format!(
                "forward offset {offset} for doc {doc} is outside the database"
            )));
        }

        let (stored, stream) = PostingsStream::<TermId>::open::<DocId>(&db[offset as usize..])?;
        if stored != doc {
            return Err(Error::Corrupt(format!(
                "forward record at offset {offset} belongs to doc {stored}, expected {doc}"
            )));
        }
        Ok(stream)
    }
}
