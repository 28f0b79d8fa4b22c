//! The disk-resident inverted index.
//!
//! An open index owns the term dictionary, the lexicon (`postings.index`),
//! a memory map of the postings file, the document metadata file, and the
//! label store. Postings are never loaded wholesale: term lookups hand out
//! [`PostingsStream`]s that decode lazily out of the map, and the streams
//! borrow the index for their lifetime. Everything is unmapped when the
//! index is dropped.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use once_cell::sync::OnceCell;

use crate::analyzers::Analyzer;
use crate::error::{Error, Result};
use crate::ids::{DocId, TermId};
use crate::io::disk_vector::DiskVector;

use super::index_files::IndexFile;
use super::labels::LabelStore;
use super::metadata_file::{Metadata, MetadataFile};
use super::postings_data::PostingsData;
use super::postings_stream::PostingsStream;
use super::vocabulary::Vocabulary;

/// A queryable inverted index; see the module docs.
pub struct InvertedIndex {
    dir: PathBuf,
    vocabulary: Vocabulary,
    lexicon: DiskVector<u64>,
    postings: Option<Mmap>,
    metadata: MetadataFile,
    labels: LabelStore,
    total_corpus_terms: OnceCell<u64>,
}

impl InvertedIndex {
    /// Memory-maps the index stored in `index_dir` and loads its
    /// dictionary, lexicon, metadata schema, and labels.
    pub fn open(index_dir: &Path) -> Result<Self> {
        let vocabulary = Vocabulary::open(index_dir)?;
        let lexicon = DiskVector::<u64>::open(&IndexFile::PostingsIndex.path_in(index_dir))?;

        let file = File::open(IndexFile::PostingsDb.path_in(index_dir))?;
        let postings = if file.metadata()?.len() == 0 {
            None
        } else {
            Some(unsafe { Mmap::map(&file)? })
        };

        let metadata = MetadataFile::open(index_dir)?;
        let labels = LabelStore::open(index_dir)?;

        if vocabulary.len() != lexicon.len() {
            return Err(Error::Corrupt(format!(
                "vocabulary has {} terms but the lexicon has {} offsets",
                vocabulary.len(),
                lexicon.len()
            )));
        }

        Ok(Self {
            dir: index_dir.to_path_buf(),
            vocabulary,
            lexicon,
            postings,
            metadata,
            labels,
            total_corpus_terms: OnceCell::new(),
        })
    }

    /// The directory this index was opened from.
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// The number of documents in the corpus.
    pub fn num_docs(&self) -> u64 {
        self.metadata.size()
    }

    /// The number of distinct terms in the vocabulary.
    pub fn unique_terms(&self) -> u64 {
        self.vocabulary.len() as u64
    }

    /// Looks up the id of `term`, if it occurs in the corpus.
    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.vocabulary.term_id(term)
    }

    /// Reads back the text of `term_id`.
    pub fn term_text(&self, term_id: TermId) -> Result<String> {
        self.vocabulary.term_text(term_id)
    }

    /// Opens a streaming view of the postings list for `term`.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the term id is outside the vocabulary (the caller
    /// drops the term); otherwise the stream, which yields documents in
    /// ascending id order.
    pub fn stream_for(&self, term: TermId) -> Result<Option<PostingsStream<'_, DocId>>> {
        let Some(offset) = self.lexicon.get(term.get() as usize) else {
            return Ok(None);
        };

        let postings = self
            .postings
            .as_ref()
            .ok_or_else(|| Error::Corrupt("postings database is empty".to_string()))?;
        if offset as usize >= postings.len() {
            return Err(Error::Corrupt(format!(
                "lexicon offset {offset} for term {term} is outside the postings file"
            )));
        }

        let (stored, stream) = PostingsStream::<DocId>::open::<TermId>(&postings[offset as usize..])?;
        if stored != term {
            return Err(Error::Corrupt(format!(
                "postings record at offset {offset} belongs to term {stored}, expected {term}"
            )));
        }
        Ok(Some(stream))
    }

    /// Decodes the full postings record for `term`.
    pub fn search_primary(&self, term: TermId) -> Result<PostingsData<TermId, DocId>> {
        let stream = self.stream_for(term)?.ok_or_else(|| {
            Error::BadArgument(format!("term {term} is not in this index"))
        })?;
        let mut pd = PostingsData::new(term);
        for (doc, count) in stream.iter() {
            pd.push(doc, count);
        }
        Ok(pd)
    }

    /// The number of documents containing `term`.
    pub fn doc_freq(&self, term: TermId) -> Result<u64> {
        Ok(self.stream_for(term)?.map_or(0, |s| s.size()))
    }

    /// The number of times `term` occurs in document `doc`.
    pub fn term_freq(&self, term: TermId, doc: DocId) -> Result<u64> {
        let Some(stream) = self.stream_for(term)? else {
            return Ok(0);
        };
        for (d, count) in stream.iter() {
            if d == doc {
                return Ok(count);
            }
            if d > doc {
                break;
            }
        }
        Ok(0)
    }

    /// The number of times `term` occurs in the whole corpus.
    pub fn total_num_occurrences(&self, term: TermId) -> Result<u64> {
        Ok(self.stream_for(term)?.map_or(0, |s| s.total_counts()))
    }

    /// The total number of term occurrences across the corpus, computed
    /// from the stored document lengths on first use and cached.
    pub fn total_corpus_terms(&self) -> Result<u64> {
        self.total_corpus_terms
            .get_or_try_init(|| {
                let mut total = 0u64;
                for doc in 0..self.num_docs() {
                    total += self.doc_size(DocId::new(doc))?;
                }
                Ok(total)
            })
            .copied()
    }

    /// The average document length in tokens.
    pub fn avg_doc_length(&self) -> Result<f64> {
        let docs = self.num_docs();
        if docs == 0 {
            return Ok(0.0);
        }
        Ok(self.total_corpus_terms()? as f64 / docs as f64)
    }

    /// The length of `doc` in tokens.
    pub fn doc_size(&self, doc: DocId) -> Result<u64> {
        self.metadata.get(doc)?.length()
    }

    /// The number of distinct terms in `doc`.
    pub fn doc_unique_terms(&self, doc: DocId) -> Result<u64> {
        self.metadata.get(doc)?.unique_terms()
    }

    /// The metadata proxy for `doc`.
    pub fn metadata(&self, doc: DocId) -> Result<Metadata<'_>> {
        self.metadata.get(doc)
    }

    /// The label store of this index.
    pub fn labels(&self) -> &LabelStore {
        &self.labels
    }

    /// Tokenizes query text against this index's vocabulary.
    ///
    /// Terms missing from the vocabulary are dropped; the remaining terms
    /// carry their occurrence counts as weights.
    pub fn tokenize_query(&self, analyzer: &dyn Analyzer, text: &str) -> Vec<(TermId, f32)> {
        let mut query: Vec<(TermId, f32)> = analyzer
            .analyze(text)
            .into_iter()
            .filter_map(|(term, count)| {
                self.term_id(&term).map(|id| (id, count as f32))
            })
            .collect();
        query.sort_unstable_by_key(|&(id, _)| id);
        query
    }
}
