//! Pseudo-relevance feedback: query rewriting from top-ranked documents.
//!
//! A feedback operator takes the initial query vector, the top-k results of
//! a first retrieval pass (treated as the relevant set), and the forward
//! index, and produces a rewritten query vector to re-run. The operators
//! differ only in how they weight the relevant and non-relevant document
//! vectors; all parameters are nonnegative by construction, but the
//! rewritten weights themselves may go negative and downstream rankers
//! tolerate that.

pub mod ide;
pub mod ide_dec_hi;
pub mod rocchio;

#[cfg(test)]
mod tests;

use hashbrown::HashMap;

use crate::error::{Error, Result};
use crate::ids::TermId;
use crate::index::ForwardIndex;
use crate::ranking::SearchResult;

pub use ide::Ide;
pub use ide_dec_hi::IdeDecHi;
pub use rocchio::Rocchio;

/// A sparse bag-of-words query: `term_id` → weight. Zero weights are
/// omitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryVector {
    weights: HashMap<TermId, f32>,
}

impl QueryVector {
    /// Creates an empty query vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// The weight of `term` (0 when absent).
    pub fn weight(&self, term: TermId) -> f32 {
        self.weights.get(&term).copied().unwrap_or(0.0)
    }

    /// Adds `delta` to the weight of `term`.
    pub fn add_weight(&mut self, term: TermId, delta: f32) {
        *self.weights.entry(term).or_insert(0.0) += delta;
    }

    /// Iterates over the nonzero `(term, weight)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (TermId, f32)> + '_ {
        self.weights.iter().map(|(&term, &weight)| (term, weight))
    }

    /// The number of stored terms.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether the vector has no terms.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Converts to the sorted pair form the rankers consume, dropping
    /// non-positive weights.
    pub fn to_query(&self) -> Vec<(TermId, f32)> {
        let mut query: Vec<(TermId, f32)> = self
            .weights
            .iter()
            .filter(|&(_, &weight)| weight > 0.0)
            .map(|(&term, &weight)| (term, weight))
            .collect();
        query.sort_unstable_by_key(|&(term, _)| term);
        query
    }

    /// The dot product against another sparse vector given as pairs.
    pub fn dot(&self, other: &[(TermId, u64)]) -> f64 {
        other
            .iter()
            .map(|&(term, count)| f64::from(self.weight(term)) * count as f64)
            .sum()
    }
}

impl FromIterator<(TermId, f32)> for QueryVector {
    fn from_iter<I: IntoIterator<Item = (TermId, f32)>>(iter: I) -> Self {
        let mut vector = Self::new();
        for (term, weight) in iter {
            vector.add_weight(term, weight);
        }
        vector
    }
}

/// Rewrites a query vector from assumed-relevant results.
pub trait Feedback: Send + Sync {
    /// Produces the rewritten query from `q0`, the `results` of the first
    /// pass, and the forward index.
    fn rewrite(
        &self,
        q0: &QueryVector,
        results: &[SearchResult],
        fwd: &ForwardIndex,
    ) -> Result<QueryVector>;
}

/// Validates the shared `(a, b, c)` parameter triple.
pub(crate) fn check_parameters(name: &str, a: f32, b: f32, c: f32) -> Result<()> {
    for (param, value) in [("a", a), ("b", b), ("c", c)] {
        if value < 0.0 {
            return Err(Error::BadArgument(format!(
                "{name} '{param}' parameter must be nonnegative, got {value}"
            )));
        }
    }
    Ok(())
}
