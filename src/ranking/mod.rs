//! Query scoring: the ranker seam, the document-at-a-time scoring loop,
//! and the top-k result heap.
//!
//! A ranker is a pair of functions over per-match statistics: `score_one`
//! computes the contribution of one matched query term to one document, and
//! `initial_score` the document-dependent constant added before any match
//! contributions. Everything else is shared by every ranker and lives in
//! [`rank`]: walking the postings streams in lock step, assembling
//! [`ScoreData`], and maintaining the result heap.
//!
//! # Scoring loop
//!
//! One postings stream is opened per query term (unknown terms are
//! silently dropped). A frontier `cur_doc` tracks the minimum head
//! document id across streams; each iteration scores `cur_doc` against all
//! streams whose head matches, advances those streams, and recomputes the
//! frontier, so every stream is consumed exactly once and documents are
//! visited in ascending id order. Results keep a bounded min-heap of size
//! `num_results`; final order is score descending with ascending document
//! id as the tie-break.

pub mod bm25;
pub mod dirichlet_opt;
pub mod lm;

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use smallvec::SmallVec;

use crate::error::Result;
use crate::ids::{DocId, TermId};
use crate::index::InvertedIndex;
use crate::index::postings_stream::PostingsStreamIter;

pub use bm25::Bm25;
pub use lm::{AbsoluteDiscount, DirichletPrior, JelinekMercer};

/// A scored document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    pub doc_id: DocId,
    pub score: f32,
}

/// Per-match statistics handed to a ranker.
///
/// All corpus-level values are precomputed once per query; the per-term and
/// per-document values are filled in as the scoring loop advances.
#[derive(Debug, Clone, Copy)]
pub struct ScoreData {
    /// The document being scored.
    pub doc_id: DocId,
    /// Weight of the matched term in the query.
    pub query_term_weight: f32,
    /// Number of documents containing the matched term.
    pub doc_count: u64,
    /// Total occurrences of the matched term in the corpus.
    pub corpus_term_count: u64,
    /// Occurrences of the matched term in this document.
    pub term_freq_in_doc: u64,
    /// Length of this document in tokens.
    pub doc_length: u64,
    /// Distinct terms in this document.
    pub doc_unique_terms: u64,
    /// Average document length in the corpus.
    pub avg_doc_length: f64,
    /// Number of documents in the corpus.
    pub num_docs: u64,
    /// Total term occurrences in the corpus.
    pub total_corpus_terms: u64,
    /// Sum of all query term weights.
    pub query_length: f32,
}

/// Filter predicate applied to candidate documents while streams advance.
pub type DocFilter<'a> = &'a dyn Fn(DocId) -> bool;

/// Scores one query against an index.
pub trait Ranker: Send + Sync {
    /// The contribution of one matched query term to a document's score.
    fn score_one(&self, sd: &ScoreData) -> f32;

    /// The document-dependent constant added once per scored document.
    fn initial_score(&self, _sd: &ScoreData) -> f32 {
        0.0
    }

    /// Ranks `query` against `idx`, returning at most `num_results`
    /// documents ordered by descending score.
    fn score(
        &self,
        idx: &InvertedIndex,
        query: &[(TermId, f32)],
        num_results: usize,
    ) -> Result<Vec<SearchResult>>
    where
        Self: Sized,
    {
        rank(self, idx, query, num_results, None)
    }
}

/// One query term's stream state inside the scoring loop.
struct PostingsContext<'idx> {
    head: Option<(DocId, u64)>,
    iter: PostingsStreamIter<'idx, DocId>,
    query_term_weight: f32,
    doc_count: u64,
    corpus_term_count: u64,
}

/// Heap entry ordered worst-result-first, so the heap top is the entry to
/// evict: lower score is worse, and on equal scores the higher document id
/// is worse.
struct HeapEntry {
    doc_id: DocId,
    score: f32,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.doc_id.cmp(&other.doc_id))
    }
}

/// Advances `iter` to the next document accepted by `filter`.
fn next_filtered(
    iter: &mut PostingsStreamIter<'_, DocId>,
    filter: Option<DocFilter<'_>>,
) -> Option<(DocId, u64)> {
    for (doc, count) in iter {
        if filter.is_none_or(|accept| accept(doc)) {
            return Some((doc, count));
        }
    }
    None
}

/// The shared scoring loop; see the module docs.
///
/// An empty query, a query of only unknown terms, or `num_results == 0`
/// yields an empty vector without touching any postings.
pub fn rank(
    ranker: &dyn Ranker,
    idx: &InvertedIndex,
    query: &[(TermId, f32)],
    num_results: usize,
    filter: Option<DocFilter<'_>>,
) -> Result<Vec<SearchResult>> {
    if query.is_empty() || num_results == 0 {
        return Ok(Vec::new());
    }

    let num_docs = idx.num_docs();
    let avg_doc_length = idx.avg_doc_length()?;
    let total_corpus_terms = idx.total_corpus_terms()?;

    // Open one stream per known query term and position each head on its
    // first accepted document.
    let mut query_length = 0.0f32;
    let mut postings: SmallVec<[PostingsContext<'_>; 8]> = SmallVec::new();
    for &(term, weight) in query {
        query_length += weight;
        let Some(stream) = idx.stream_for(term)? else {
            continue;
        };

        let doc_count = stream.size();
        let corpus_term_count = stream.total_counts();
        let mut iter = stream.iter();
        let head = next_filtered(&mut iter, filter);
        if head.is_none() {
            continue;
        }

        postings.push(PostingsContext {
            head,
            iter,
            query_term_weight: weight,
            doc_count,
            corpus_term_count,
        });
    }

    let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::with_capacity(num_results + 1);
    let mut cur_doc = postings
        .iter()
        .filter_map(|pc| pc.head.map(|(doc, _)| doc))
        .min();

    while let Some(doc) = cur_doc {
        let mut sd = ScoreData {
            doc_id: doc,
            query_term_weight: 0.0,
            doc_count: 0,
            corpus_term_count: 0,
            term_freq_in_doc: 0,
            doc_length: idx.doc_size(doc)?,
            doc_unique_terms: idx.doc_unique_terms(doc)?,
            avg_doc_length,
            num_docs,
            total_corpus_terms,
            query_length,
        };

        let mut score = ranker.initial_score(&sd);
        for pc in postings.iter_mut() {
            let Some((head_doc, term_freq)) = pc.head else {
                continue;
            };
            if head_doc != doc {
                continue;
            }

            sd.query_term_weight = pc.query_term_weight;
            sd.doc_count = pc.doc_count;
            sd.corpus_term_count = pc.corpus_term_count;
            sd.term_freq_in_doc = term_freq;
            score += ranker.score_one(&sd);

            pc.head = next_filtered(&mut pc.iter, filter);
        }

        heap.push(HeapEntry { doc_id: doc, score });
        if heap.len() > num_results {
            heap.pop();
        }

        cur_doc = postings
            .iter()
            .filter_map(|pc| pc.head.map(|(d, _)| d))
            .min();
    }

    // Ascending under the worst-first ordering is best-first.
    Ok(heap
        .into_sorted_vec()
        .into_iter()
        .map(|entry| SearchResult {
            doc_id: entry.doc_id,
            score: entry.score,
        })
        .collect())
}
