//! Retrieval - Inverted-Index Text Search
//!
//! A library for building disk-resident inverted indexes over tokenized
//! documents and ranking queries against them, with pluggable scoring
//! functions and pseudo-relevance feedback.
//!
//! # Overview
//!
//! This library provides:
//! - **Index construction**: parallel tokenization feeding an external-sort
//!   merge, with a configurable RAM budget for the in-memory accumulator
//! - **Streaming retrieval**: memory-mapped postings walked lazily, one
//!   document-at-a-time scoring pass per query
//! - **Pluggable ranking**: BM25, Dirichlet-prior language models (with
//!   corpus-fit smoothing), Jelinek-Mercer, and absolute discounting
//! - **Relevance feedback**: Rocchio, Ide, and Ide dec-hi query rewriting
//!   over a forward index
//! - **Hash-table substrate**: robin-hood and probe-set open addressing
//!   backing the accumulator, dictionaries, and runtime caches
//!
//! # Quick Start
//!
//! ```no_run
//! use retrieval::analyzers::WhitespaceAnalyzer;
//! use retrieval::corpus::Document;
//! use retrieval::ranking::{Bm25, Ranker};
//! use std::path::Path;
//!
//! fn main() -> retrieval::Result<()> {
//!     let docs = vec![
//!         Document::new("the quick brown fox"),
//!         Document::new("the lazy dog"),
//!     ];
//!
//!     // Build an index
//!     let analyzer = WhitespaceAnalyzer::new();
//!     retrieval::build_index(analyzer.clone(), docs, Path::new("idx"))?;
//!
//!     // Query it
//!     let index = retrieval::open_index(Path::new("idx"))?;
//!     let query = index.tokenize_query(&analyzer, "quick dog");
//!     let results = Bm25::default().score(&index, &query, 10)?;
//!     for result in results {
//!         println!("{}: {}", result.doc_id, result.score);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Resource Model
//!
//! An open index memory-maps its postings, metadata, and dictionary files
//! once; streams borrow the maps and everything is unmapped when the index
//! is dropped. Intermediate chunk files written during construction are
//! deleted as the merge consumes them.

pub mod analyzers;
pub mod caching;
pub mod config;
pub mod corpus;
pub mod error;
pub mod feedback;
pub mod hashing;
pub mod ids;
pub mod index;
pub mod io;
pub mod ranking;
pub mod stats;

#[cfg(test)]
pub mod unit_tests;

use std::path::Path;

use analyzers::Analyzer;
use corpus::Document;
use feedback::{Feedback, QueryVector};
use index::{BuildStats, ForwardIndex, IndexBuilder, InvertedIndex};
use ranking::{Ranker, SearchResult};

pub use error::{Error, Result};
pub use ids::{DocId, LabelId, TermId};

/// Builds the on-disk index file set for `documents` into `index_dir`
/// using default indexer configuration.
///
/// Use [`index::IndexBuilder`] directly to control the RAM budget and
/// thread count.
pub fn build_index<A, I>(analyzer: A, documents: I, index_dir: &Path) -> Result<BuildStats>
where
    A: Analyzer,
    I: IntoIterator<Item = Document>,
    I::IntoIter: Send,
{
    IndexBuilder::new(analyzer).build(documents, index_dir)
}

/// Memory-maps the inverted index stored in `index_dir`.
///
/// Closing is dropping: all maps are released when the returned index goes
/// out of scope.
pub fn open_index(index_dir: &Path) -> Result<InvertedIndex> {
    InvertedIndex::open(index_dir)
}

/// Memory-maps the forward index stored in `index_dir` with default cache
/// sizing.
pub fn open_forward_index(index_dir: &Path) -> Result<ForwardIndex> {
    ForwardIndex::open(index_dir)
}

/// Scores `query_text` against an index in one call: tokenize, rank,
/// return at most `num_results` documents ordered by descending score.
///
/// For repeated queries, tokenize and call [`Ranker::score`] (or
/// [`ranking::rank`] with a filter) directly instead.
pub fn search(
    index: &InvertedIndex,
    analyzer: &dyn Analyzer,
    ranker: &dyn Ranker,
    query_text: &str,
    num_results: usize,
) -> Result<Vec<SearchResult>> {
    let query = index.tokenize_query(analyzer, query_text);
    ranking::rank(ranker, index, &query, num_results, None)
}

/// Rewrites `q0` with pseudo-relevance feedback from `results` and returns
/// the new query vector.
pub fn apply_feedback(
    method: &dyn Feedback,
    q0: &QueryVector,
    results: &[SearchResult],
    fwd: &ForwardIndex,
) -> Result<QueryVector> {
    method.rewrite(q0, results, fwd)
}
