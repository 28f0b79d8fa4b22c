//! Rocchio query rewriting.

use crate::error::Result;
use crate::hashing::inline_set::InlineKeySet;
use crate::index::ForwardIndex;
use crate::ranking::SearchResult;

use super::{Feedback, QueryVector, check_parameters};

/// The Rocchio rewrite:
///
/// ```text
/// qm = a * q0 + (b / |R|) * sum_{d in R} d - (c / |N|) * sum_{d in N} d
/// ```
///
/// where `R` is the assumed-relevant set (the top-k results) and `N` the
/// assumed-non-relevant set (every other document in the corpus).
#[derive(Debug, Clone, Copy)]
pub struct Rocchio {
    a: f32,
    b: f32,
    c: f32,
}

impl Rocchio {
    pub const DEFAULT_A: f32 = 1.0;
    pub const DEFAULT_B: f32 = 0.8;
    pub const DEFAULT_C: f32 = 0.0;

    /// Creates a Rocchio operator.
    ///
    /// # Errors
    ///
    /// [`Error::BadArgument`] if any parameter is negative.
    ///
    /// [`Error::BadArgument`]: crate::error::Error::BadArgument
    pub fn new(a: f32, b: f32, c: f32) -> Result<Self> {
        check_parameters("rocchio", a, b, c)?;
        Ok(Self { a, b, c })
    }
}

impl Default for Rocchio {
    fn default() -> Self {
        Self {
            a: Self::DEFAULT_A,
            b: Self::DEFAULT_B,
            c: Self::DEFAULT_C,
        }
    }
}

impl Feedback for Rocchio {
    fn rewrite(
        &self,
        q0: &QueryVector,
        results: &[SearchResult],
        fwd: &ForwardIndex,
    ) -> Result<QueryVector> {
        let mut qm = QueryVector::new();

        if self.a > 0.0 {
            for (term, weight) in q0.iter() {
                qm.add_weight(term, weight * self.a);
            }
        }

        let mut relevant = InlineKeySet::new();
        for result in results {
            relevant.insert(result.doc_id);
        }

        if self.b > 0.0 && !results.is_empty() {
            let norm = self.b / results.len() as f32;
            for result in results {
                let record = fwd.search_primary(result.doc_id)?;
                for &(term, count) in record.counts() {
                    qm.add_weight(term, count as f32 * norm);
                }
            }
        }

        if self.c > 0.0 {
            let num_nonrelevant = fwd.num_docs() as usize - relevant.len();
            if num_nonrelevant > 0 {
                let norm = self.c / num_nonrelevant as f32;
                for doc in fwd.docs() {
                    if relevant.contains(&doc) {
                        continue;
                    }
                    let record = fwd.search_primary(doc)?;
                    for &(term, count) in record.counts() {
                        qm.add_weight(term, -(count as f32) * norm);
                    }
                }
            }
        }

        Ok(qm)
    }
}
